use hsm_roundtrip_interfaces::{MechanismFlags, MechanismInfo};
use pkcs11_sys::{
    CK_MECHANISM_INFO, CK_MECHANISM_TYPE, CKM_AES_CBC, CKM_AES_CBC_PAD, CKM_AES_CTR, CKM_AES_ECB,
    CKM_AES_GCM, CKM_AES_KEY_GEN, CKM_AES_MAC, CKM_DES3_CBC, CKM_DES3_ECB, CKM_DES3_KEY_GEN,
    CKM_DH_PKCS_DERIVE, CKM_DH_PKCS_KEY_PAIR_GEN, CKM_DSA, CKM_DSA_KEY_PAIR_GEN, CKM_DSA_SHA1,
    CKM_EC_KEY_PAIR_GEN, CKM_ECDH1_COFACTOR_DERIVE, CKM_ECDH1_DERIVE, CKM_ECDSA, CKM_ECDSA_SHA1,
    CKM_GENERIC_SECRET_KEY_GEN, CKM_MD5, CKM_MD5_RSA_PKCS, CKM_RSA_9796, CKM_RSA_PKCS,
    CKM_RSA_PKCS_KEY_PAIR_GEN, CKM_RSA_PKCS_OAEP, CKM_RSA_PKCS_PSS, CKM_RSA_X_509, CKM_SHA_1,
    CKM_SHA_1_HMAC, CKM_SHA1_RSA_PKCS, CKM_SHA1_RSA_PKCS_PSS, CKM_SHA224, CKM_SHA224_RSA_PKCS,
    CKM_SHA224_RSA_PKCS_PSS, CKM_SHA256, CKM_SHA256_HMAC, CKM_SHA256_RSA_PKCS,
    CKM_SHA256_RSA_PKCS_PSS, CKM_SHA384, CKM_SHA384_HMAC, CKM_SHA384_RSA_PKCS,
    CKM_SHA384_RSA_PKCS_PSS, CKM_SHA512, CKM_SHA512_HMAC, CKM_SHA512_RSA_PKCS,
    CKM_SHA512_RSA_PKCS_PSS, CKM_VENDOR_DEFINED,
};

/// Symbolic name of a mechanism, without the `CKM_` prefix.
///
/// Vendor-defined mechanisms are rendered as `VENDOR_DEFINED+0x...`,
/// other unknown values as their hexadecimal value.
#[must_use]
pub fn mechanism_name(mechanism: CK_MECHANISM_TYPE) -> String {
    let name = match mechanism {
        CKM_RSA_PKCS_KEY_PAIR_GEN => "RSA_PKCS_KEY_PAIR_GEN",
        CKM_RSA_PKCS => "RSA_PKCS",
        CKM_RSA_9796 => "RSA_9796",
        CKM_RSA_X_509 => "RSA_X_509",
        CKM_MD5_RSA_PKCS => "MD5_RSA_PKCS",
        CKM_SHA1_RSA_PKCS => "SHA1_RSA_PKCS",
        CKM_RSA_PKCS_OAEP => "RSA_PKCS_OAEP",
        CKM_RSA_PKCS_PSS => "RSA_PKCS_PSS",
        CKM_SHA1_RSA_PKCS_PSS => "SHA1_RSA_PKCS_PSS",
        CKM_SHA224_RSA_PKCS => "SHA224_RSA_PKCS",
        CKM_SHA256_RSA_PKCS => "SHA256_RSA_PKCS",
        CKM_SHA384_RSA_PKCS => "SHA384_RSA_PKCS",
        CKM_SHA512_RSA_PKCS => "SHA512_RSA_PKCS",
        CKM_SHA224_RSA_PKCS_PSS => "SHA224_RSA_PKCS_PSS",
        CKM_SHA256_RSA_PKCS_PSS => "SHA256_RSA_PKCS_PSS",
        CKM_SHA384_RSA_PKCS_PSS => "SHA384_RSA_PKCS_PSS",
        CKM_SHA512_RSA_PKCS_PSS => "SHA512_RSA_PKCS_PSS",
        CKM_DSA_KEY_PAIR_GEN => "DSA_KEY_PAIR_GEN",
        CKM_DSA => "DSA",
        CKM_DSA_SHA1 => "DSA_SHA1",
        CKM_DH_PKCS_KEY_PAIR_GEN => "DH_PKCS_KEY_PAIR_GEN",
        CKM_DH_PKCS_DERIVE => "DH_PKCS_DERIVE",
        CKM_DES3_KEY_GEN => "DES3_KEY_GEN",
        CKM_DES3_ECB => "DES3_ECB",
        CKM_DES3_CBC => "DES3_CBC",
        CKM_MD5 => "MD5",
        CKM_SHA_1 => "SHA_1",
        CKM_SHA_1_HMAC => "SHA_1_HMAC",
        CKM_SHA224 => "SHA224",
        CKM_SHA256 => "SHA256",
        CKM_SHA256_HMAC => "SHA256_HMAC",
        CKM_SHA384 => "SHA384",
        CKM_SHA384_HMAC => "SHA384_HMAC",
        CKM_SHA512 => "SHA512",
        CKM_SHA512_HMAC => "SHA512_HMAC",
        CKM_GENERIC_SECRET_KEY_GEN => "GENERIC_SECRET_KEY_GEN",
        CKM_EC_KEY_PAIR_GEN => "EC_KEY_PAIR_GEN",
        CKM_ECDSA => "ECDSA",
        CKM_ECDSA_SHA1 => "ECDSA_SHA1",
        CKM_ECDH1_DERIVE => "ECDH1_DERIVE",
        CKM_ECDH1_COFACTOR_DERIVE => "ECDH1_COFACTOR_DERIVE",
        CKM_AES_KEY_GEN => "AES_KEY_GEN",
        CKM_AES_ECB => "AES_ECB",
        CKM_AES_CBC => "AES_CBC",
        CKM_AES_MAC => "AES_MAC",
        CKM_AES_CBC_PAD => "AES_CBC_PAD",
        CKM_AES_CTR => "AES_CTR",
        CKM_AES_GCM => "AES_GCM",
        m if m >= CKM_VENDOR_DEFINED => {
            return format!("VENDOR_DEFINED+{:#x}", m - CKM_VENDOR_DEFINED);
        }
        m => return format!("{m:#010x}"),
    };
    name.to_owned()
}

/// Build the token independent description of a mechanism
pub(crate) fn mechanism_info(
    mechanism: CK_MECHANISM_TYPE,
    info: &CK_MECHANISM_INFO,
) -> MechanismInfo {
    MechanismInfo {
        mechanism_type: u64::from(mechanism),
        name: mechanism_name(mechanism),
        min_key_size: u64::from(info.ulMinKeySize),
        max_key_size: u64::from(info.ulMaxKeySize),
        flags: MechanismFlags::from_bits_retain(u64::from(info.flags)),
    }
}

#[cfg(test)]
mod tests {
    use hsm_roundtrip_interfaces::MechanismFlags;
    use pkcs11_sys::{
        CK_MECHANISM_INFO, CKF_DECRYPT, CKF_DERIVE, CKF_DIGEST, CKF_EC_COMPRESS,
        CKF_EC_UNCOMPRESS, CKF_ENCRYPT, CKF_EXTENSION, CKF_GENERATE, CKF_GENERATE_KEY_PAIR,
        CKF_HW, CKF_SIGN, CKF_SIGN_RECOVER, CKF_UNWRAP, CKF_VERIFY, CKF_VERIFY_RECOVER,
        CKF_WRAP, CKM_AES_GCM, CKM_RSA_PKCS, CKM_RSA_PKCS_OAEP, CKM_RSA_X_509,
        CKM_VENDOR_DEFINED,
    };

    use super::{mechanism_info, mechanism_name};

    #[test]
    fn test_mechanism_names() {
        assert_eq!(mechanism_name(CKM_RSA_PKCS), "RSA_PKCS");
        assert_eq!(mechanism_name(CKM_RSA_X_509), "RSA_X_509");
        assert_eq!(mechanism_name(CKM_RSA_PKCS_OAEP), "RSA_PKCS_OAEP");
        assert_eq!(mechanism_name(CKM_AES_GCM), "AES_GCM");
        assert_eq!(mechanism_name(CKM_VENDOR_DEFINED + 0x11), "VENDOR_DEFINED+0x11");
        assert_eq!(mechanism_name(0x0000_7777), "0x00007777");
    }

    #[test]
    fn test_mechanism_flags_mirror_pkcs11() {
        let pairs = [
            (MechanismFlags::HW, CKF_HW),
            (MechanismFlags::ENCRYPT, CKF_ENCRYPT),
            (MechanismFlags::DECRYPT, CKF_DECRYPT),
            (MechanismFlags::DIGEST, CKF_DIGEST),
            (MechanismFlags::SIGN, CKF_SIGN),
            (MechanismFlags::SIGN_RECOVER, CKF_SIGN_RECOVER),
            (MechanismFlags::VERIFY, CKF_VERIFY),
            (MechanismFlags::VERIFY_RECOVER, CKF_VERIFY_RECOVER),
            (MechanismFlags::GENERATE, CKF_GENERATE),
            (MechanismFlags::GENERATE_KEY_PAIR, CKF_GENERATE_KEY_PAIR),
            (MechanismFlags::WRAP, CKF_WRAP),
            (MechanismFlags::UNWRAP, CKF_UNWRAP),
            (MechanismFlags::DERIVE, CKF_DERIVE),
            (MechanismFlags::EC_UNCOMPRESS, CKF_EC_UNCOMPRESS),
            (MechanismFlags::EC_COMPRESS, CKF_EC_COMPRESS),
            (MechanismFlags::EXTENSION, CKF_EXTENSION),
        ];
        for (flag, ckf) in pairs {
            assert_eq!(flag.bits(), u64::from(ckf), "{flag:?}");
        }
    }

    #[test]
    fn test_mechanism_info_conversion() {
        let info = CK_MECHANISM_INFO {
            ulMinKeySize: 1024,
            ulMaxKeySize: 4096,
            flags: CKF_HW | CKF_DECRYPT | CKF_SIGN | CKF_VERIFY,
        };
        let info = mechanism_info(CKM_RSA_PKCS, &info);
        assert_eq!(info.name, "RSA_PKCS");
        assert_eq!(info.mechanism_type, u64::from(CKM_RSA_PKCS));
        assert!(info.supports(MechanismFlags::DECRYPT));
        assert!(!info.supports(MechanismFlags::ENCRYPT));
        assert_eq!(
            info.to_string(),
            "Supported key lengths: [1024, 4096]\nFlags: HW | DECRYPT | SIGN | VERIFY"
        );
    }
}
