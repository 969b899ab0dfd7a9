//! The round trip: list the mechanisms of every initialized token, select the configured
//! token, encrypt a fixed plaintext locally with the public key of the configured key pair
//! and decrypt it on the token with the private key.
//!
//! PKCS#1 v1.5 (`CKM_RSA_PKCS`) is used on both sides. It is not recommended for new designs
//! but the targeted tokens do not offer `CKM_RSA_PKCS_OAEP`.

use std::io::Write;

use hsm_roundtrip_crypto::{
    openssl::backend_version,
    rsa::{ckm_rsa_pkcs::ckm_rsa_pkcs_encrypt, public_key_from_der, rsa_public_key_to_der},
};
use hsm_roundtrip_interfaces::{
    CryptoAlgorithm, KeyType, ObjectClass, Pkcs11Token, TokenSession,
};
use hsm_roundtrip_logger::{debug, info};
use zeroize::Zeroizing;

use crate::{
    cli_ensure,
    config::RoundTripConfig,
    error::{CliError, result::CliResult},
    report::write_token_mechanisms,
};

/// The message sent through the round trip
pub const PLAINTEXT: &[u8] = b"abracadabra";

/// What a successful round trip produced
#[derive(Debug)]
pub struct RoundTripOutcome {
    pub ciphertext: Vec<u8>,
    pub recovered: Zeroizing<Vec<u8>>,
}

/// Run the round trip against `token`, writing the report to `out`.
///
/// The session opened on the selected token is closed explicitly on every path;
/// a failure of the round trip takes precedence over a failure to close.
pub fn run<T, W>(token: &T, config: &RoundTripConfig, out: &mut W) -> CliResult<RoundTripOutcome>
where
    T: Pkcs11Token,
    W: Write,
{
    list_mechanisms(token, out)?;

    let token_info = token.find_token(&config.token_label)?;
    info!(
        "Using token `{}` in slot {} ({} {}, serial number {})",
        token_info.label,
        token_info.slot_id,
        token_info.manufacturer_id,
        token_info.model,
        token_info.serial_number
    );

    let mut session = token.open_session(token_info.slot_id, config.user_pin())?;
    let outcome = round_trip(&session, &config.key_label, out);
    let closed = session.close();
    let outcome = outcome?;
    closed?;
    Ok(outcome)
}

/// Print every initialized token with its mechanisms
fn list_mechanisms<T: Pkcs11Token, W: Write>(token: &T, out: &mut W) -> CliResult<()> {
    for token_info in token.initialized_tokens()? {
        let mechanisms = token.get_mechanisms(token_info.slot_id)?;
        write_token_mechanisms(out, &token_info, &mechanisms)?;
    }
    Ok(())
}

fn round_trip<S: TokenSession, W: Write>(
    session: &S,
    key_label: &str,
    out: &mut W,
) -> CliResult<RoundTripOutcome> {
    let public_key = session.get_key(key_label, KeyType::Rsa, ObjectClass::PublicKey)?;
    let private_key = session.get_key(key_label, KeyType::Rsa, ObjectClass::PrivateKey)?;

    let material = session.export_rsa_public_key(public_key)?;
    debug!(
        "RSA public key `{key_label}`: {} bits",
        material.modulus_len() * 8
    );
    let der = rsa_public_key_to_der(&material.modulus, &material.public_exponent)?;
    let public_key = public_key_from_der(&der)?;

    writeln!(out, "cryptography_backend: {}", backend_version())?;
    writeln!(out, "plaintext: {}", String::from_utf8_lossy(PLAINTEXT))?;
    let ciphertext = ckm_rsa_pkcs_encrypt(&public_key, PLAINTEXT)?;
    writeln!(out, "ciphertext: {}", hex::encode(&ciphertext))?;

    let recovered = session.decrypt(private_key, CryptoAlgorithm::RsaPkcsV15, &ciphertext)?;
    writeln!(out, "plaintext: {}", String::from_utf8_lossy(&recovered))?;
    cli_ensure!(
        recovered.as_slice() == PLAINTEXT,
        CliError::Cryptographic(format!(
            "the token decrypted {} bytes that differ from the {} bytes encrypted",
            recovered.len(),
            PLAINTEXT.len()
        ))
    );

    Ok(RoundTripOutcome {
        ciphertext,
        recovered,
    })
}
