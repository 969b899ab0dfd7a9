//! Implements the RSA Key Encryption Mechanism `CKM_RSA_PKCS`
//! a.k.a PKCS #1 RSA V1.5 as specified in PKCS#11 v2.40 available at
//! <https://docs.oasis-open.org/pkcs11/pkcs11-curr/v2.40/cos01/pkcs11-curr-v2.40-cos01.html>#_Toc408226893
//!
//! PKCS #1 v1.5 is not recommended anymore; it is used here because the targeted tokens
//! do not support `CKM_RSA_PKCS_OAEP` and OpenSSL offers no raw OAEP primitive
//! that could be paired with `CKM_RSA_X_509` on the token.
use openssl::{
    pkey::{PKey, Private, Public},
    pkey_ctx::PkeyCtx,
};
use zeroize::Zeroizing;

use crate::{CryptoError, CryptoResult, crypto_ensure, rsa::PKCS1_V15_PADDING_OVERHEAD};

/// Encryption using `CKM_RSA_PKCS`
/// a.k.a PKCS #1 RSA V1.5 as specified in PKCS#11 v2.40 available at
/// <https://docs.oasis-open.org/pkcs11/pkcs11-curr/v2.40/cos01/pkcs11-curr-v2.40-cos01.html>#_Toc408226893
///
/// The maximum plaintext length is  k-11 where k is the length in octets of the RSA modulus
/// The output length is the same as the modulus length.
///
/// Arguments:
/// - `pub_key`: the public key to encrypt with
/// - `plaintext`: the plaintext to encrypt
pub fn ckm_rsa_pkcs_encrypt(pub_key: &PKey<Public>, plaintext: &[u8]) -> CryptoResult<Vec<u8>> {
    let (mut ctx, mut ciphertext, modulus_len) = init_ckm_rsa_pkcs_encryption_context(pub_key)?;
    let max_plaintext_len = modulus_len.saturating_sub(PKCS1_V15_PADDING_OVERHEAD);
    crypto_ensure!(
        plaintext.len() <= max_plaintext_len,
        CryptoError::InvalidSize(format!(
            "plaintext of {} bytes exceeds the {max_plaintext_len} bytes a {}-bit RSA key can \
             encrypt with PKCS#1 v1.5",
            plaintext.len(),
            modulus_len * 8
        ))
    );
    ctx.encrypt_to_vec(plaintext, &mut ciphertext)?;
    Ok(ciphertext)
}

fn init_ckm_rsa_pkcs_encryption_context(
    pub_key: &PKey<Public>,
) -> CryptoResult<(PkeyCtx<Public>, Vec<u8>, usize)> {
    let rsa_pub_key = pub_key.rsa()?;

    // The ciphertext has the same length as the modulus.
    let encapsulation_bytes_len = usize::try_from(rsa_pub_key.size())?;
    let ciphertext = Vec::with_capacity(encapsulation_bytes_len);

    let mut ctx = PkeyCtx::new(pub_key)?;
    ctx.encrypt_init()?;
    ctx.set_rsa_padding(openssl::rsa::Padding::PKCS1)?;
    Ok((ctx, ciphertext, encapsulation_bytes_len))
}

/// Decrypt using `CKM_RSA_PKCS`
/// a.k.a PKCS #1 RSA V1.5 as specified in PKCS#11 v2.40 available at
/// <https://docs.oasis-open.org/pkcs11/pkcs11-curr/v2.40/cos01/pkcs11-curr-v2.40-cos01.html>#_Toc408226893
///
/// This is the software counterpart of the token operation.
/// The ciphertext must be of size k where k is the length in octets of the RSA modulus.
///
/// Arguments:
/// - `priv_key`: the private key to decrypt with
/// - `ciphertext`: the ciphertext to decrypt
pub fn ckm_rsa_pkcs_decrypt(
    priv_key: &PKey<Private>,
    ciphertext: &[u8],
) -> CryptoResult<Zeroizing<Vec<u8>>> {
    let (mut ctx, mut plaintext, modulus_len) = init_ckm_rsa_pkcs_decryption_context(priv_key)?;
    crypto_ensure!(
        ciphertext.len() == modulus_len,
        CryptoError::InvalidSize(format!(
            "ciphertext of {} bytes does not match the {modulus_len} bytes modulus",
            ciphertext.len()
        ))
    );
    ctx.decrypt_to_vec(ciphertext, &mut plaintext)?;
    Ok(plaintext)
}

fn init_ckm_rsa_pkcs_decryption_context(
    priv_key: &PKey<Private>,
) -> CryptoResult<(PkeyCtx<Private>, Zeroizing<Vec<u8>>, usize)> {
    let rsa_priv_key = priv_key.rsa()?;

    // The plaintext has length equal to the modulus length - 11 bytes at most.
    let modulus_len = usize::try_from(rsa_priv_key.size())?;
    let plaintext = Zeroizing::from(Vec::with_capacity(
        modulus_len.saturating_sub(PKCS1_V15_PADDING_OVERHEAD),
    ));

    let mut ctx = PkeyCtx::new(priv_key)?;
    ctx.decrypt_init()?;
    ctx.set_rsa_padding(openssl::rsa::Padding::PKCS1)?;
    Ok((ctx, plaintext, modulus_len))
}
