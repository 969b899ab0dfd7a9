use std::num::TryFromIntError;

use hsm_roundtrip_interfaces::InterfaceError;
use pkcs11_sys::{
    CK_RV, CKR_ARGUMENTS_BAD, CKR_ATTRIBUTE_SENSITIVE, CKR_ATTRIBUTE_TYPE_INVALID,
    CKR_BUFFER_TOO_SMALL, CKR_CRYPTOKI_ALREADY_INITIALIZED, CKR_CRYPTOKI_NOT_INITIALIZED,
    CKR_DEVICE_ERROR, CKR_DEVICE_REMOVED, CKR_ENCRYPTED_DATA_INVALID,
    CKR_ENCRYPTED_DATA_LEN_RANGE, CKR_FUNCTION_FAILED, CKR_FUNCTION_NOT_SUPPORTED,
    CKR_GENERAL_ERROR, CKR_KEY_FUNCTION_NOT_PERMITTED, CKR_KEY_HANDLE_INVALID,
    CKR_KEY_TYPE_INCONSISTENT, CKR_MECHANISM_INVALID, CKR_MECHANISM_PARAM_INVALID,
    CKR_OBJECT_HANDLE_INVALID, CKR_OPERATION_ACTIVE, CKR_OPERATION_NOT_INITIALIZED,
    CKR_PIN_EXPIRED, CKR_PIN_INCORRECT, CKR_PIN_LOCKED, CKR_SESSION_HANDLE_INVALID,
    CKR_SLOT_ID_INVALID, CKR_TOKEN_NOT_PRESENT, CKR_TOKEN_NOT_RECOGNIZED,
    CKR_USER_ALREADY_LOGGED_IN, CKR_USER_NOT_LOGGED_IN, CKR_USER_PIN_NOT_INITIALIZED,
};
use thiserror::Error;

pub type HResult<T> = Result<T, HError>;

#[derive(Error, Debug)]
pub enum HError {
    #[error("{0}")]
    Default(String),

    #[error("Error loading the library: {0}")]
    LibLoading(#[from] libloading::Error),

    #[error("{message}: {function} returned {} ({rv:#x})", return_value_name(.rv))]
    Pkcs11 {
        message: String,
        function: &'static str,
        rv: CK_RV,
    },

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error(transparent)]
    TryFromIntError(#[from] TryFromIntError),
}

impl HError {
    /// The PKCS#11 return value carried by this error, if any
    #[must_use]
    pub const fn return_value(&self) -> Option<CK_RV> {
        match self {
            Self::Pkcs11 { rv, .. } => Some(*rv),
            _ => None,
        }
    }
}

impl From<HError> for InterfaceError {
    fn from(e: HError) -> Self {
        if let HError::KeyNotFound(msg) = e {
            return Self::KeyNotFound(msg);
        }
        match e.return_value() {
            Some(
                CKR_MECHANISM_INVALID
                | CKR_MECHANISM_PARAM_INVALID
                | CKR_KEY_FUNCTION_NOT_PERMITTED
                | CKR_KEY_TYPE_INCONSISTENT
                | CKR_FUNCTION_NOT_SUPPORTED,
            ) => Self::MechanismUnsupported(e.to_string()),
            Some(CKR_ENCRYPTED_DATA_INVALID | CKR_ENCRYPTED_DATA_LEN_RANGE) => {
                Self::Cryptographic(e.to_string())
            }
            _ => Self::Hsm(e.to_string()),
        }
    }
}

/// Symbolic name of the most common PKCS#11 return values
fn return_value_name(rv: &CK_RV) -> &'static str {
    match *rv {
        CKR_ARGUMENTS_BAD => "CKR_ARGUMENTS_BAD",
        CKR_ATTRIBUTE_SENSITIVE => "CKR_ATTRIBUTE_SENSITIVE",
        CKR_ATTRIBUTE_TYPE_INVALID => "CKR_ATTRIBUTE_TYPE_INVALID",
        CKR_BUFFER_TOO_SMALL => "CKR_BUFFER_TOO_SMALL",
        CKR_CRYPTOKI_ALREADY_INITIALIZED => "CKR_CRYPTOKI_ALREADY_INITIALIZED",
        CKR_CRYPTOKI_NOT_INITIALIZED => "CKR_CRYPTOKI_NOT_INITIALIZED",
        CKR_DEVICE_ERROR => "CKR_DEVICE_ERROR",
        CKR_DEVICE_REMOVED => "CKR_DEVICE_REMOVED",
        CKR_ENCRYPTED_DATA_INVALID => "CKR_ENCRYPTED_DATA_INVALID",
        CKR_ENCRYPTED_DATA_LEN_RANGE => "CKR_ENCRYPTED_DATA_LEN_RANGE",
        CKR_FUNCTION_FAILED => "CKR_FUNCTION_FAILED",
        CKR_FUNCTION_NOT_SUPPORTED => "CKR_FUNCTION_NOT_SUPPORTED",
        CKR_GENERAL_ERROR => "CKR_GENERAL_ERROR",
        CKR_KEY_FUNCTION_NOT_PERMITTED => "CKR_KEY_FUNCTION_NOT_PERMITTED",
        CKR_KEY_HANDLE_INVALID => "CKR_KEY_HANDLE_INVALID",
        CKR_KEY_TYPE_INCONSISTENT => "CKR_KEY_TYPE_INCONSISTENT",
        CKR_MECHANISM_INVALID => "CKR_MECHANISM_INVALID",
        CKR_MECHANISM_PARAM_INVALID => "CKR_MECHANISM_PARAM_INVALID",
        CKR_OBJECT_HANDLE_INVALID => "CKR_OBJECT_HANDLE_INVALID",
        CKR_OPERATION_ACTIVE => "CKR_OPERATION_ACTIVE",
        CKR_OPERATION_NOT_INITIALIZED => "CKR_OPERATION_NOT_INITIALIZED",
        CKR_PIN_EXPIRED => "CKR_PIN_EXPIRED",
        CKR_PIN_INCORRECT => "CKR_PIN_INCORRECT",
        CKR_PIN_LOCKED => "CKR_PIN_LOCKED",
        CKR_SESSION_HANDLE_INVALID => "CKR_SESSION_HANDLE_INVALID",
        CKR_SLOT_ID_INVALID => "CKR_SLOT_ID_INVALID",
        CKR_TOKEN_NOT_PRESENT => "CKR_TOKEN_NOT_PRESENT",
        CKR_TOKEN_NOT_RECOGNIZED => "CKR_TOKEN_NOT_RECOGNIZED",
        CKR_USER_ALREADY_LOGGED_IN => "CKR_USER_ALREADY_LOGGED_IN",
        CKR_USER_NOT_LOGGED_IN => "CKR_USER_NOT_LOGGED_IN",
        CKR_USER_PIN_NOT_INITIALIZED => "CKR_USER_PIN_NOT_INITIALIZED",
        _ => "an error",
    }
}

#[cfg(test)]
mod error_tests {
    use hsm_roundtrip_interfaces::InterfaceError;
    use pkcs11_sys::{
        CKR_DEVICE_ERROR, CKR_ENCRYPTED_DATA_LEN_RANGE, CKR_KEY_FUNCTION_NOT_PERMITTED,
        CKR_MECHANISM_INVALID,
    };

    use super::HError;

    fn pkcs11_error(rv: pkcs11_sys::CK_RV) -> HError {
        HError::Pkcs11 {
            message: "Failed to initialize decryption".to_owned(),
            function: "C_DecryptInit",
            rv,
        }
    }

    #[test]
    fn test_pkcs11_error_display() {
        assert_eq!(
            pkcs11_error(CKR_MECHANISM_INVALID).to_string(),
            "Failed to initialize decryption: C_DecryptInit returned CKR_MECHANISM_INVALID (0x70)"
        );
        assert_eq!(pkcs11_error(CKR_MECHANISM_INVALID).return_value(), Some(CKR_MECHANISM_INVALID));
    }

    #[test]
    fn test_pkcs11_error_classification() {
        assert!(matches!(
            InterfaceError::from(pkcs11_error(CKR_MECHANISM_INVALID)),
            InterfaceError::MechanismUnsupported(_)
        ));
        assert!(matches!(
            InterfaceError::from(pkcs11_error(CKR_KEY_FUNCTION_NOT_PERMITTED)),
            InterfaceError::MechanismUnsupported(_)
        ));
        assert!(matches!(
            InterfaceError::from(pkcs11_error(CKR_ENCRYPTED_DATA_LEN_RANGE)),
            InterfaceError::Cryptographic(_)
        ));
        assert!(matches!(
            InterfaceError::from(pkcs11_error(CKR_DEVICE_ERROR)),
            InterfaceError::Hsm(_)
        ));
        assert!(matches!(
            InterfaceError::from(HError::KeyNotFound("my-key".to_owned())),
            InterfaceError::KeyNotFound(_)
        ));
        let not_pkcs11 = HError::Default("no return value".to_owned());
        assert_eq!(not_pkcs11.return_value(), None);
        assert!(matches!(InterfaceError::from(not_pkcs11), InterfaceError::Hsm(_)));
    }
}
