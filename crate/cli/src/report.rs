//! The human readable report written on stdout.

use std::io::Write;

use hsm_roundtrip_interfaces::{MechanismInfo, TokenInfo};

/// Mechanism information lines are indented under the mechanism name
const INFO_INDENT: &str = "                      ";

/// Write the label of `token` followed by each of its mechanisms and their information.
pub fn write_token_mechanisms<W: Write>(
    out: &mut W,
    token: &TokenInfo,
    mechanisms: &[MechanismInfo],
) -> std::io::Result<()> {
    writeln!(out, "token-label: {}", token.label)?;
    for mechanism in mechanisms {
        writeln!(out, "mechanism: {}", mechanism.name)?;
        for line in mechanism.to_string().lines() {
            writeln!(out, "{INFO_INDENT}{line}")?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use hsm_roundtrip_interfaces::{MechanismFlags, MechanismInfo, TokenInfo};

    use super::{INFO_INDENT, write_token_mechanisms};

    #[test]
    fn test_mechanism_report() -> std::io::Result<()> {
        assert_eq!(INFO_INDENT.len(), 22);
        let token = TokenInfo {
            slot_id: 0,
            label: "MyToken".to_owned(),
            manufacturer_id: "CardContact".to_owned(),
            model: "SmartCard-HSM".to_owned(),
            serial_number: "DECM0102330".to_owned(),
            initialized: true,
        };
        let mechanisms = [
            MechanismInfo {
                mechanism_type: 0x1,
                name: "RSA_PKCS".to_owned(),
                min_key_size: 1024,
                max_key_size: 4096,
                flags: MechanismFlags::HW
                    | MechanismFlags::DECRYPT
                    | MechanismFlags::SIGN
                    | MechanismFlags::VERIFY,
            },
            MechanismInfo {
                mechanism_type: 0x220,
                name: "SHA_1".to_owned(),
                min_key_size: 0,
                max_key_size: 0,
                flags: MechanismFlags::DIGEST,
            },
        ];
        let mut out = Vec::new();
        write_token_mechanisms(&mut out, &token, &mechanisms)?;
        let expected = format!(
            "token-label: MyToken\n\
             mechanism: RSA_PKCS\n\
             {i}Supported key lengths: [1024, 4096]\n\
             {i}Flags: HW | DECRYPT | SIGN | VERIFY\n\
             mechanism: SHA_1\n\
             {i}Supported key lengths: [0, 0]\n\
             {i}Flags: DIGEST\n",
            i = " ".repeat(22)
        );
        assert_eq!(String::from_utf8_lossy(&out), expected);
        Ok(())
    }
}
