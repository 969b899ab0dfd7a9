use hsm_roundtrip_base_hsm::HError;
use hsm_roundtrip_crypto::CryptoError;
use hsm_roundtrip_interfaces::InterfaceError;
use thiserror::Error;

pub mod result;

#[derive(Error, Debug)]
pub enum CliError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Cryptographic error: {0}")]
    Cryptographic(String),

    #[error(transparent)]
    Crypto(#[from] CryptoError),

    #[error("{0}")]
    Default(String),

    #[error(transparent)]
    Hsm(#[from] HError),

    #[error(transparent)]
    Interface(#[from] InterfaceError),

    #[error(transparent)]
    IoError(#[from] std::io::Error),
}

/// Return early with an error if a condition is not satisfied.
///
/// This macro is equivalent to `if !$cond { return Err(From::from($err)); }`.
#[macro_export]
macro_rules! cli_ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::cli_error!($msg));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return ::core::result::Result::Err($crate::cli_error!($fmt, $($arg)*));
        }
    };
}

/// Construct a CLI error from a string.
#[macro_export]
macro_rules! cli_error {
    ($msg:literal) => {
        $crate::error::CliError::Default(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::error::CliError::Default($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::error::CliError::Default(::core::format_args!($fmt, $($arg)*).to_string())
    };
}
