//! Environment driven settings for the tests that need a real token.

use crate::{HError, HResult};

/// Default location of the SoftHSM2 PKCS#11 library on Debian and Ubuntu
pub const SOFTHSM2_PKCS11_LIB: &str = "/usr/lib/softhsm/libsofthsm2.so";

fn env_or(name: &str, default: &str) -> String {
    std::env::var(name)
        .ok()
        .filter(|v| !v.is_empty())
        .unwrap_or_else(|| default.to_owned())
}

pub fn get_hsm_password() -> HResult<String> {
    std::env::var("HSM_USER_PASSWORD")
        .ok()
        .filter(|v| !v.is_empty())
        .ok_or_else(|| {
            HError::Default(
                "The user password for the HSM is not set. Please set the HSM_USER_PASSWORD \
                 environment variable"
                    .to_owned(),
            )
        })
}

/// The PKCS#11 library to load: `SOFTHSM2_PKCS11_LIB`, or the SoftHSM2 default location
#[must_use]
pub fn get_hsm_lib_path() -> String {
    env_or("SOFTHSM2_PKCS11_LIB", SOFTHSM2_PKCS11_LIB)
}

/// The label of the token holding the test key pair (`HSM_TOKEN_LABEL`)
#[must_use]
pub fn get_hsm_token_label() -> String {
    env_or("HSM_TOKEN_LABEL", "roundtrip")
}

/// The label shared by the public and private keys of the test key pair (`HSM_KEY_LABEL`)
#[must_use]
pub fn get_hsm_key_label() -> String {
    env_or("HSM_KEY_LABEL", "roundtrip-rsa")
}
