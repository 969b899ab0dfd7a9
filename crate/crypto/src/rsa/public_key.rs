use openssl::{
    bn::BigNum,
    pkey::{Id, PKey, Public},
    rsa::Rsa,
};
use tracing::trace;

use crate::{CryptoError, CryptoResult, crypto_ensure};

/// Encode an RSA public key, given as big-endian modulus and public exponent,
/// into a PKCS#1 `RSAPublicKey` DER structure.
///
/// This is the form tokens expose public keys in (`CKA_MODULUS`, `CKA_PUBLIC_EXPONENT`).
pub fn rsa_public_key_to_der(modulus: &[u8], public_exponent: &[u8]) -> CryptoResult<Vec<u8>> {
    let n = BigNum::from_slice(modulus)?;
    let e = BigNum::from_slice(public_exponent)?;
    crypto_ensure!(
        n.num_bits() > 0,
        CryptoError::InvalidSize("the RSA modulus is empty".to_owned())
    );
    crypto_ensure!(
        e.num_bits() > 0,
        CryptoError::InvalidSize("the RSA public exponent is empty".to_owned())
    );
    let rsa = Rsa::from_public_components(n, e)?;
    Ok(rsa.public_key_to_der_pkcs1()?)
}

/// Load an RSA public key from DER.
///
/// Both a `SubjectPublicKeyInfo` and a PKCS#1 `RSAPublicKey` encoding are accepted.
pub fn public_key_from_der(der: &[u8]) -> CryptoResult<PKey<Public>> {
    if let Ok(pub_key) = PKey::public_key_from_der(der) {
        trace!("loaded a SubjectPublicKeyInfo public key");
        crypto_ensure!(
            pub_key.id() == Id::RSA,
            CryptoError::NotSupported(format!("expected an RSA public key, got {:?}", pub_key.id()))
        );
        return Ok(pub_key);
    }
    let rsa = Rsa::public_key_from_der_pkcs1(der).map_err(|e| {
        CryptoError::OpenSSL(format!("malformed RSA public key DER encoding: {e}"))
    })?;
    trace!("loaded a PKCS#1 RSA public key of {} bits", rsa.size() * 8);
    Ok(PKey::from_rsa(rsa)?)
}

#[allow(clippy::panic_in_result_fn)]
#[cfg(test)]
mod tests {
    use openssl::{ec::EcGroup, ec::EcKey, nid::Nid, pkey::PKey, rsa::Rsa};

    use super::{public_key_from_der, rsa_public_key_to_der};
    use crate::{CryptoError, CryptoResult};

    #[test]
    fn test_export_then_import_rsa_public_key() -> CryptoResult<()> {
        let rsa = Rsa::generate(2048)?;
        let der = rsa_public_key_to_der(&rsa.n().to_vec(), &rsa.e().to_vec())?;
        assert_eq!(der, rsa.public_key_to_der_pkcs1()?);

        let pub_key = public_key_from_der(&der)?;
        let imported = pub_key.rsa()?;
        assert_eq!(imported.n().to_vec(), rsa.n().to_vec());
        assert_eq!(imported.e().to_vec(), rsa.e().to_vec());
        assert_eq!(imported.size(), 256);
        Ok(())
    }

    #[test]
    fn test_leading_zero_in_modulus_is_ignored() -> CryptoResult<()> {
        let rsa = Rsa::generate(1024)?;
        let padded_modulus = [vec![0_u8], rsa.n().to_vec()].concat();
        let der = rsa_public_key_to_der(&padded_modulus, &rsa.e().to_vec())?;
        assert_eq!(public_key_from_der(&der)?.rsa()?.size(), 128);
        Ok(())
    }

    #[test]
    fn test_import_subject_public_key_info() -> CryptoResult<()> {
        let private_key = PKey::from_rsa(Rsa::generate(2048)?)?;
        let spki = private_key.public_key_to_der()?;
        let pub_key = public_key_from_der(&spki)?;
        assert!(pub_key.public_eq(&private_key));
        Ok(())
    }

    #[test]
    fn test_malformed_der_is_rejected() {
        let err = public_key_from_der(b"definitely not DER").unwrap_err();
        assert!(matches!(err, CryptoError::OpenSSL(_)));
    }

    #[test]
    fn test_empty_modulus_is_rejected() {
        let err = rsa_public_key_to_der(&[], &[0x01, 0x00, 0x01]).unwrap_err();
        assert!(matches!(err, CryptoError::InvalidSize(_)));
    }

    #[test]
    fn test_ec_public_key_is_rejected() -> CryptoResult<()> {
        let group = EcGroup::from_curve_name(Nid::X9_62_PRIME256V1)?;
        let ec_key = PKey::from_ec_key(EcKey::generate(&group)?)?;
        let err = public_key_from_der(&ec_key.public_key_to_der()?).unwrap_err();
        assert!(matches!(err, CryptoError::NotSupported(_)));
        Ok(())
    }
}
