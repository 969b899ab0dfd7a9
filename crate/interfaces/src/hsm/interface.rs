//! PKCS#11 token interface.
//! This module defines what the round trip needs from a token: slot and mechanism discovery,
//! authenticated sessions, key lookup by label, public key export and private key decryption.

use tracing::debug;
use zeroize::Zeroizing;

use crate::{
    InterfaceError, InterfaceResult, KeyType, ObjectClass, hsm::mechanism::MechanismInfo,
    hsm::token::TokenInfo,
};

/// Decryption algorithms a token is asked to perform.
///
/// Only PKCS#1 v1.5 is offered: the targeted devices (SmartCard-HSM, Nitrokey HSM)
/// do not advertise `CKM_RSA_PKCS_OAEP`. PKCS#1 v1.5 is not recommended for new designs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CryptoAlgorithm {
    RsaPkcsV15,
}

/// Opaque reference to an object living on the token
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ObjectHandle(pub usize);

/// RSA public key value representation
/// All values are in big-endian format
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RsaPublicKeyMaterial {
    pub modulus: Vec<u8>,
    pub public_exponent: Vec<u8>,
}

impl RsaPublicKeyMaterial {
    /// Size of the modulus in bytes, ignoring leading zero bytes
    #[must_use]
    pub fn modulus_len(&self) -> usize {
        self.modulus.iter().skip_while(|b| **b == 0).count()
    }
}

/// An authenticated session on a token.
///
/// Implementations must release the session when dropped, so that every exit path
/// (including errors) closes it. `close` is the explicit variant that reports failures.
pub trait TokenSession {
    /// Find a key by label, key type and object class.
    ///
    /// # Errors
    /// * `InterfaceError::KeyNotFound` if no object matches
    fn get_key(
        &self,
        label: &str,
        key_type: KeyType,
        object_class: ObjectClass,
    ) -> InterfaceResult<ObjectHandle>;

    /// Read the modulus and public exponent of an RSA public key.
    fn export_rsa_public_key(&self, key: ObjectHandle) -> InterfaceResult<RsaPublicKeyMaterial>;

    /// Decrypt `ciphertext` on the token with the private key `key`.
    ///
    /// # Errors
    /// * `InterfaceError::MechanismUnsupported` if the token rejects the mechanism
    /// * `InterfaceError::Cryptographic` if the ciphertext length or padding is invalid
    fn decrypt(
        &self,
        key: ObjectHandle,
        algorithm: CryptoAlgorithm,
        ciphertext: &[u8],
    ) -> InterfaceResult<Zeroizing<Vec<u8>>>;

    /// Log out and close the session.
    fn close(&mut self) -> InterfaceResult<()>;
}

/// A PKCS#11 token provider (typically a loaded PKCS#11 library).
pub trait Pkcs11Token {
    type Session: TokenSession;

    /// Get the identifiers of the slots that currently hold a token.
    fn get_available_slot_list(&self) -> InterfaceResult<Vec<usize>>;

    /// Get the information of the token present in `slot_id`.
    fn get_token_info(&self, slot_id: usize) -> InterfaceResult<TokenInfo>;

    /// List the mechanisms supported by `slot_id` together with their capabilities.
    fn get_mechanisms(&self, slot_id: usize) -> InterfaceResult<Vec<MechanismInfo>>;

    /// Open a session on `slot_id` and log in as user with `user_pin`.
    fn open_session(&self, slot_id: usize, user_pin: &str) -> InterfaceResult<Self::Session>;

    /// The initialized tokens, in slot order.
    fn initialized_tokens(&self) -> InterfaceResult<Vec<TokenInfo>> {
        let mut tokens = Vec::new();
        for slot_id in self.get_available_slot_list()? {
            let token = self.get_token_info(slot_id)?;
            if !token.initialized {
                debug!("skipping uninitialized token in slot {slot_id}");
                continue;
            }
            tokens.push(token);
        }
        Ok(tokens)
    }

    /// Find the first initialized token whose normalized label is `token_label`.
    ///
    /// # Errors
    /// * `InterfaceError::TokenNotFound` if no initialized token carries that label
    fn find_token(&self, token_label: &str) -> InterfaceResult<TokenInfo> {
        self.initialized_tokens()?
            .into_iter()
            .find(|token| token.label == token_label)
            .ok_or_else(|| InterfaceError::TokenNotFound(token_label.to_owned()))
    }
}
