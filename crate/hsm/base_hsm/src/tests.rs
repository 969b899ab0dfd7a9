//! These tests require a SoftHSM2 token holding an RSA key pair and are gated behind the
//! `softhsm2` feature. Provision the token with something like
//! ```sh
//! softhsm2-util --init-token --free --label roundtrip --pin 12345678 --so-pin 12345678
//! pkcs11-tool --module /usr/lib/softhsm/libsofthsm2.so --token-label roundtrip --login \
//!     --pin 12345678 --keypairgen --key-type rsa:2048 --label roundtrip-rsa
//! ```
//! then run
//! ```sh
//! HSM_USER_PASSWORD=12345678 cargo test --features softhsm2 -- --ignored tests::test_hsm_softhsm2_all
//! ```

use hsm_roundtrip_crypto::rsa::{
    ckm_rsa_pkcs::ckm_rsa_pkcs_encrypt, public_key_from_der, rsa_public_key_to_der,
};
use hsm_roundtrip_interfaces::{
    CryptoAlgorithm, InterfaceError, KeyType, MechanismFlags, ObjectClass, Pkcs11Token,
    TokenSession,
};
use hsm_roundtrip_logger::log_init;
use pkcs11_sys::CKR_PIN_INCORRECT;

use crate::{
    BaseHsm, HError, HResult,
    test_helpers::{get_hsm_key_label, get_hsm_lib_path, get_hsm_password, get_hsm_token_label},
};

fn instantiate() -> HResult<BaseHsm> {
    log_init(None);
    BaseHsm::instantiate(get_hsm_lib_path())
}

fn token_slot(hsm: &BaseHsm) -> HResult<usize> {
    let token = hsm
        .find_token(&get_hsm_token_label())
        .map_err(|e| HError::Default(e.to_string()))?;
    Ok(token.slot_id)
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_all() -> HResult<()> {
    test_hsm_softhsm2_get_info()?;
    test_hsm_softhsm2_get_mechanisms()?;
    test_hsm_softhsm2_unknown_token()?;
    test_hsm_softhsm2_unknown_key()?;
    test_hsm_softhsm2_wrong_pin()?;
    test_hsm_softhsm2_rsa_pkcs_round_trip()?;
    Ok(())
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_get_info() -> HResult<()> {
    let hsm = instantiate()?;
    let info = hsm.get_info()?;
    assert!(info.cryptokiVersion.0 >= 2);
    assert!(!info.manufacturerID.is_empty());
    Ok(())
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_get_mechanisms() -> HResult<()> {
    let hsm = instantiate()?;
    let slot_id = token_slot(&hsm)?;
    let mechanisms = hsm
        .get_mechanisms(slot_id)
        .map_err(|e| HError::Default(e.to_string()))?;
    let rsa_pkcs = mechanisms
        .iter()
        .find(|m| m.name == "RSA_PKCS")
        .ok_or_else(|| HError::Default("RSA_PKCS is not listed".to_owned()))?;
    assert!(rsa_pkcs.supports(MechanismFlags::DECRYPT));
    assert!(rsa_pkcs.min_key_size <= 2048 && 2048 <= rsa_pkcs.max_key_size);
    Ok(())
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_unknown_token() -> HResult<()> {
    let hsm = instantiate()?;
    let result = hsm.find_token("no-such-token-label");
    assert!(matches!(
        result,
        Err(InterfaceError::TokenNotFound(label)) if label == "no-such-token-label"
    ));
    Ok(())
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_unknown_key() -> HResult<()> {
    let hsm = instantiate()?;
    let session = hsm
        .get_slot(token_slot(&hsm)?)
        .open_session(&get_hsm_password()?)?;
    let result = session.get_key("no-such-key-label", KeyType::Rsa, ObjectClass::PrivateKey);
    assert!(matches!(result, Err(InterfaceError::KeyNotFound(_))));
    Ok(())
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_wrong_pin() -> HResult<()> {
    let hsm = instantiate()?;
    let slot = hsm.get_slot(token_slot(&hsm)?);
    let result = slot.open_session("not-the-user-pin");
    assert!(matches!(
        result,
        Err(HError::Pkcs11 {
            rv: CKR_PIN_INCORRECT,
            ..
        })
    ));
    // the session opened before the failed login was closed, a new one logs in
    let mut session = slot.open_session(&get_hsm_password()?)?;
    session.close()?;
    Ok(())
}

#[test]
#[ignore = "Requires Linux, SoftHSM2 library, and HSM environment"]
fn test_hsm_softhsm2_rsa_pkcs_round_trip() -> HResult<()> {
    let hsm = instantiate()?;
    let mut session = hsm
        .get_slot(token_slot(&hsm)?)
        .open_session(&get_hsm_password()?)?;
    let key_label = get_hsm_key_label();
    let to_hsm_error = |e: InterfaceError| HError::Default(e.to_string());

    let public_key = session
        .get_key(&key_label, KeyType::Rsa, ObjectClass::PublicKey)
        .map_err(to_hsm_error)?;
    let private_key = session
        .get_key(&key_label, KeyType::Rsa, ObjectClass::PrivateKey)
        .map_err(to_hsm_error)?;
    let material = session
        .export_rsa_public_key(public_key)
        .map_err(to_hsm_error)?;
    let der = rsa_public_key_to_der(&material.modulus, &material.public_exponent)
        .map_err(|e| HError::Default(e.to_string()))?;
    let public_key = public_key_from_der(&der).map_err(|e| HError::Default(e.to_string()))?;

    for _ in 0..3 {
        let ciphertext = ckm_rsa_pkcs_encrypt(&public_key, b"abracadabra")
            .map_err(|e| HError::Default(e.to_string()))?;
        assert_eq!(ciphertext.len(), material.modulus_len());
        let plaintext = session
            .decrypt(private_key, CryptoAlgorithm::RsaPkcsV15, &ciphertext)
            .map_err(to_hsm_error)?;
        assert_eq!(plaintext.as_slice(), b"abracadabra");
    }

    // a truncated ciphertext is rejected by the token
    let ciphertext = ckm_rsa_pkcs_encrypt(&public_key, b"abracadabra")
        .map_err(|e| HError::Default(e.to_string()))?;
    let result = session.decrypt(
        private_key,
        CryptoAlgorithm::RsaPkcsV15,
        &ciphertext[..ciphertext.len() - 1],
    );
    assert!(matches!(result, Err(InterfaceError::Cryptographic(_))));

    session.close()?;
    Ok(())
}
