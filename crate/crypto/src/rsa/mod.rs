pub mod ckm_rsa_pkcs;
mod public_key;

pub use public_key::{public_key_from_der, rsa_public_key_to_der};

/// Length overhead of the PKCS#1 v1.5 encryption padding, in bytes
pub const PKCS1_V15_PADDING_OVERHEAD: usize = 11;
