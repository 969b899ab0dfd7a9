use std::ptr;

use hsm_roundtrip_logger::{debug, warn};
use libloading::Library;
use pkcs11_sys::{
    CK_C_CloseSession, CK_C_Decrypt, CK_C_DecryptInit, CK_C_Finalize, CK_C_FindObjects,
    CK_C_FindObjectsFinal, CK_C_FindObjectsInit, CK_C_GetAttributeValue, CK_C_GetInfo,
    CK_C_GetMechanismInfo, CK_C_GetMechanismList, CK_C_GetSlotList, CK_C_GetTokenInfo,
    CK_C_INITIALIZE_ARGS, CK_C_Initialize, CK_C_Login, CK_C_Logout, CK_C_OpenSession,
    CKF_OS_LOCKING_OK, CKR_CRYPTOKI_ALREADY_INITIALIZED, CKR_OK,
};

use crate::{HError, HResult};

/// A PKCS#11 library loaded at runtime.
///
/// Holds the entry points the round trip needs. The library is initialized with OS locking
/// when loaded and finalized when this struct is dropped; sessions keep an `Arc` to it so it
/// outlives all of them.
///
/// # Safety
///
/// The fields are raw PKCS#11 function pointers. They are only called through `hsm_call!`
/// or in `unsafe` blocks that uphold the PKCS#11 buffer and handle contracts.
pub struct HsmLib {
    _library: Library,
    pub(crate) C_Initialize: CK_C_Initialize,
    pub(crate) C_Finalize: CK_C_Finalize,
    pub(crate) C_GetInfo: CK_C_GetInfo,

    pub(crate) C_GetSlotList: CK_C_GetSlotList,
    pub(crate) C_GetTokenInfo: CK_C_GetTokenInfo,
    pub(crate) C_GetMechanismList: CK_C_GetMechanismList,
    pub(crate) C_GetMechanismInfo: CK_C_GetMechanismInfo,

    pub(crate) C_OpenSession: CK_C_OpenSession,
    pub(crate) C_CloseSession: CK_C_CloseSession,
    pub(crate) C_Login: CK_C_Login,
    pub(crate) C_Logout: CK_C_Logout,

    pub(crate) C_FindObjectsInit: CK_C_FindObjectsInit,
    pub(crate) C_FindObjects: CK_C_FindObjects,
    pub(crate) C_FindObjectsFinal: CK_C_FindObjectsFinal,
    pub(crate) C_GetAttributeValue: CK_C_GetAttributeValue,

    pub(crate) C_DecryptInit: CK_C_DecryptInit,
    pub(crate) C_Decrypt: CK_C_Decrypt,
}

impl HsmLib {
    pub(crate) fn instantiate<P>(path: P) -> HResult<Self>
    where
        P: AsRef<std::ffi::OsStr>,
    {
        debug!("Loading the PKCS#11 library {:?}", path.as_ref());
        #[allow(unsafe_code)]
        let hsm_lib = unsafe {
            let library = Library::new(path)?;
            HsmLib {
                C_Initialize: Some(*library.get(b"C_Initialize")?),
                C_Finalize: Some(*library.get(b"C_Finalize")?),
                C_GetInfo: Some(*library.get(b"C_GetInfo")?),
                C_GetSlotList: Some(*library.get(b"C_GetSlotList")?),
                C_GetTokenInfo: Some(*library.get(b"C_GetTokenInfo")?),
                C_GetMechanismList: Some(*library.get(b"C_GetMechanismList")?),
                C_GetMechanismInfo: Some(*library.get(b"C_GetMechanismInfo")?),
                C_OpenSession: Some(*library.get(b"C_OpenSession")?),
                C_CloseSession: Some(*library.get(b"C_CloseSession")?),
                C_Login: Some(*library.get(b"C_Login")?),
                C_Logout: Some(*library.get(b"C_Logout")?),
                C_FindObjectsInit: Some(*library.get(b"C_FindObjectsInit")?),
                C_FindObjects: Some(*library.get(b"C_FindObjects")?),
                C_FindObjectsFinal: Some(*library.get(b"C_FindObjectsFinal")?),
                C_GetAttributeValue: Some(*library.get(b"C_GetAttributeValue")?),
                C_DecryptInit: Some(*library.get(b"C_DecryptInit")?),
                C_Decrypt: Some(*library.get(b"C_Decrypt")?),
                // we need to keep the library alive
                _library: library,
            }
        };
        hsm_lib.initialize()?;
        Ok(hsm_lib)
    }

    fn initialize(&self) -> HResult<()> {
        let mut p_init_args = CK_C_INITIALIZE_ARGS {
            CreateMutex: None,
            DestroyMutex: None,
            LockMutex: None,
            UnlockMutex: None,
            flags: CKF_OS_LOCKING_OK,
            pReserved: ptr::null_mut(),
        };
        let initialize = self.C_Initialize.ok_or_else(|| {
            HError::Default("C_Initialize not available on library".to_owned())
        })?;
        #[allow(unsafe_code)]
        let rv = unsafe { initialize((&raw mut p_init_args).cast::<std::ffi::c_void>()) };
        match rv {
            CKR_OK => Ok(()),
            CKR_CRYPTOKI_ALREADY_INITIALIZED => {
                warn!("the PKCS#11 library was already initialized in this process");
                Ok(())
            }
            rv => Err(HError::Pkcs11 {
                message: "Failed initializing the HSM".to_owned(),
                function: "C_Initialize",
                rv,
            }),
        }
    }

    fn finalize(&self) -> HResult<()> {
        crate::hsm_call!(self, "Failed to finalize the HSM", C_Finalize, ptr::null_mut());
        Ok(())
    }
}

impl Drop for HsmLib {
    fn drop(&mut self) {
        if let Err(e) = self.finalize() {
            warn!("{e}");
        }
    }
}
