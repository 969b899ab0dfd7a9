use std::num::TryFromIntError;

use thiserror::Error;

pub(crate) mod result;

pub use result::CryptoResult;

#[derive(Error, Debug)]
pub enum CryptoError {
    #[error("Conversion Error: {0}")]
    ConversionError(String),

    #[error("{0}")]
    Default(String),

    #[error("Invalid size: {0}")]
    InvalidSize(String),

    #[error("Not Supported: {0}")]
    NotSupported(String),

    #[error("OpenSSL Error: {0}")]
    OpenSSL(String),
}

impl From<openssl::error::ErrorStack> for CryptoError {
    fn from(e: openssl::error::ErrorStack) -> Self {
        Self::OpenSSL(format!("Error: {e}. Details: {e:?}"))
    }
}

impl From<TryFromIntError> for CryptoError {
    fn from(e: TryFromIntError) -> Self {
        Self::ConversionError(e.to_string())
    }
}

/// Return early with an error if a condition is not satisfied.
///
/// This macro is equivalent to `if !$cond { return Err(From::from($err)); }`.
#[macro_export]
macro_rules! crypto_ensure {
    ($cond:expr, $msg:literal $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($crate::crypto_error!($msg));
        }
    };
    ($cond:expr, $err:expr $(,)?) => {
        if !$cond {
            return ::core::result::Result::Err($err);
        }
    };
    ($cond:expr, $fmt:expr, $($arg:tt)*) => {
        if !$cond {
            return ::core::result::Result::Err($crate::crypto_error!($fmt, $($arg)*));
        }
    };
}

/// Construct a crypto error from a string.
#[macro_export]
macro_rules! crypto_error {
    ($msg:literal) => {
        $crate::CryptoError::Default(::core::format_args!($msg).to_string())
    };
    ($err:expr $(,)?) => ({
        $crate::CryptoError::Default($err.to_string())
    });
    ($fmt:expr, $($arg:tt)*) => {
        $crate::CryptoError::Default(::core::format_args!($fmt, $($arg)*).to_string())
    };
}

/// Return early with an error.
#[macro_export]
macro_rules! crypto_bail {
    ($msg:literal) => {
        return ::core::result::Result::Err($crate::crypto_error!($msg))
    };
    ($err:expr $(,)?) => {
        return ::core::result::Result::Err($err)
    };
    ($fmt:expr, $($arg:tt)*) => {
        return ::core::result::Result::Err($crate::crypto_error!($fmt, $($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::CryptoError;

    #[test]
    fn test_crypto_error_interpolation() {
        let var = 42;
        let err = crypto_error!("interpolate {var}");
        assert_eq!("interpolate 42", err.to_string());

        let err = bail();
        assert!(matches!(err, Err(CryptoError::Default(ref s)) if s == "interpolate 43"));

        let err = ensure();
        assert!(matches!(err, Err(CryptoError::InvalidSize(ref s)) if s == "too long"));
    }

    fn bail() -> Result<(), CryptoError> {
        let var = 43;
        crypto_bail!("interpolate {var}")
    }

    fn ensure() -> Result<(), CryptoError> {
        crypto_ensure!(false, CryptoError::InvalidSize("too long".to_owned()));
        Ok(())
    }
}
