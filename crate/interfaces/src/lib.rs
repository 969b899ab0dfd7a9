mod error;
mod hsm;

pub use error::{InterfaceError, InterfaceResult};
pub use hsm::{
    CryptoAlgorithm, MechanismFlags, MechanismInfo, ObjectHandle, Pkcs11Token,
    RsaPublicKeyMaterial, TokenInfo, TokenSession, normalize_token_label,
};

/// Supported cryptographic key types
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum KeyType {
    Rsa,
}

/// Object classes a key can be looked up with
#[derive(Debug, Clone, Copy, Eq, PartialEq)]
pub enum ObjectClass {
    PublicKey,
    PrivateKey,
}

impl std::fmt::Display for ObjectClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::PublicKey => write!(f, "public key"),
            Self::PrivateKey => write!(f, "private key"),
        }
    }
}
