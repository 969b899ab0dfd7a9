#![allow(non_snake_case)]

pub use base_hsm::{BaseHsm, Info};
pub use error::{HError, HResult};
pub use mechanisms::mechanism_name;
pub use session::Session;
pub use slots::SlotManager;

/// The PKCS#11 bindings used by this crate
pub use pkcs11_sys;

mod base_hsm;
mod error;
mod hsm_lib;
mod mechanisms;
mod session;
mod slots;

pub mod test_helpers;
#[cfg(test)]
#[cfg(feature = "softhsm2")]
mod tests;

/// Call a PKCS#11 function of the loaded library and return early with an
/// `HError::Pkcs11` if it does not return `CKR_OK`.
///
/// `hsm_call!(hsm_lib, "error message", C_Function, arg1, arg2, ...)`
#[macro_export]
macro_rules! hsm_call {
    ($hsm:expr, $msg:expr, $func:ident $(, $arg:expr)* $(,)?) => {{
        let function = $hsm.$func.ok_or_else(|| {
            $crate::HError::Default(format!(
                "{} not available on library",
                stringify!($func)
            ))
        })?;
        #[allow(unsafe_code)]
        let rv = unsafe { function($($arg),*) };
        if rv != $crate::pkcs11_sys::CKR_OK {
            return Err($crate::HError::Pkcs11 {
                message: ($msg).to_string(),
                function: stringify!($func),
                rv,
            });
        }
    }};
}
