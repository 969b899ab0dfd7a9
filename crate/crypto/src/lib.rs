pub use error::{CryptoError, CryptoResult};

mod error;
pub mod openssl;
pub mod rsa;

pub mod reexport {
    pub use ::openssl;
}
