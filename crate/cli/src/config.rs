use std::{fmt, path::PathBuf};

use zeroize::Zeroizing;

use crate::error::{CliError, result::CliResult};

pub const LIBRARY_PATH_ENV: &str = "TEST_PKCS11_LIBRARY_PATH";
pub const TOKEN_LABEL_ENV: &str = "TEST_PKCS11_TOKEN_LABEL";
pub const KEY_LABEL_ENV: &str = "TEST_PKCS11_KEY_LABEL";
pub const USER_PIN_ENV: &str = "TEST_PKCS11_USER_PIN";

/// The settings of a round trip, all required, read from the environment:
///
/// | Variable                   | Meaning                     |
/// |----------------------------|-----------------------------|
/// | `TEST_PKCS11_LIBRARY_PATH` | path to the PKCS#11 driver  |
/// | `TEST_PKCS11_TOKEN_LABEL`  | token label to select       |
/// | `TEST_PKCS11_KEY_LABEL`    | label of the RSA key pair   |
/// | `TEST_PKCS11_USER_PIN`     | user PIN                    |
pub struct RoundTripConfig {
    pub library_path: PathBuf,
    pub token_label: String,
    pub key_label: String,
    user_pin: Zeroizing<String>,
}

impl RoundTripConfig {
    pub fn new(
        library_path: impl Into<PathBuf>,
        token_label: impl Into<String>,
        key_label: impl Into<String>,
        user_pin: impl Into<String>,
    ) -> Self {
        Self {
            library_path: library_path.into(),
            token_label: token_label.into(),
            key_label: key_label.into(),
            user_pin: Zeroizing::new(user_pin.into()),
        }
    }

    /// Read the configuration from the process environment.
    pub fn from_env() -> CliResult<Self> {
        Self::from_lookup(|name| std::env::var(name).ok())
    }

    /// Read the configuration through `lookup`, which maps a variable name to its value.
    ///
    /// # Errors
    /// `CliError::Configuration` naming the first variable that is missing or empty
    pub fn from_lookup<F>(lookup: F) -> CliResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |name: &str| {
            lookup(name)
                .filter(|value| !value.is_empty())
                .ok_or_else(|| {
                    CliError::Configuration(format!(
                        "the environment variable {name} is not set"
                    ))
                })
        };
        let library_path = required(LIBRARY_PATH_ENV)?;
        let token_label = required(TOKEN_LABEL_ENV)?;
        let key_label = required(KEY_LABEL_ENV)?;
        let user_pin = Zeroizing::new(required(USER_PIN_ENV)?);
        Ok(Self {
            library_path: PathBuf::from(library_path),
            token_label,
            key_label,
            user_pin,
        })
    }

    #[must_use]
    pub fn user_pin(&self) -> &str {
        &self.user_pin
    }
}

impl fmt::Debug for RoundTripConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("RoundTripConfig")
            .field("library_path", &self.library_path)
            .field("token_label", &self.token_label)
            .field("key_label", &self.key_label)
            .field("user_pin", &"***")
            .finish()
    }
}
