mod interface;
mod mechanism;
mod token;

pub use interface::{
    CryptoAlgorithm, ObjectHandle, Pkcs11Token, RsaPublicKeyMaterial, TokenSession,
};
pub use mechanism::{MechanismFlags, MechanismInfo};
pub use token::{TokenInfo, normalize_token_label};
