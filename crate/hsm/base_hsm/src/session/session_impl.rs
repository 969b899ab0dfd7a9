//! An authenticated PKCS#11 session.
//!
//! The session keeps the library alive through an `Arc` and is logged out and closed
//! when dropped. Calling [`Session::close`] explicitly reports the failures that the
//! `Drop` implementation can only log.

use std::sync::Arc;

use hsm_roundtrip_interfaces::{
    CryptoAlgorithm, InterfaceResult, KeyType, ObjectClass, ObjectHandle, RsaPublicKeyMaterial,
    TokenSession,
};
use hsm_roundtrip_logger::{debug, trace, warn};
use pkcs11_sys::{
    CK_ATTRIBUTE, CK_MECHANISM, CK_OBJECT_HANDLE, CK_SESSION_HANDLE, CK_ULONG, CKR_OK,
    CKR_USER_ALREADY_LOGGED_IN, CKU_USER,
};
use zeroize::Zeroizing;

use crate::{HError, HResult, hsm_call, hsm_lib::HsmLib};

/// Maximum number of handles fetched by a single `C_FindObjects` call
const FIND_MAX_OBJECT_COUNT: usize = 16;

pub struct Session {
    hsm: Arc<HsmLib>,
    handle: CK_SESSION_HANDLE,
    logged_in: bool,
    closed: bool,
}

impl Session {
    pub(crate) fn new(hsm: Arc<HsmLib>, session_handle: CK_SESSION_HANDLE) -> Self {
        debug!("Opened session: {session_handle}");
        Self {
            hsm,
            handle: session_handle,
            logged_in: false,
            closed: false,
        }
    }

    /// Log in as `CKU_USER`.
    ///
    /// A token that reports the user as already logged in is accepted; the session
    /// then does not log out on close.
    pub(crate) fn login(&mut self, user_pin: &str) -> HResult<()> {
        let mut pin = Zeroizing::new(user_pin.as_bytes().to_vec());
        let login = self
            .hsm
            .C_Login
            .ok_or_else(|| HError::Default("C_Login not available on library".to_owned()))?;
        #[allow(unsafe_code)]
        let rv = unsafe {
            login(
                self.handle,
                CKU_USER,
                pin.as_mut_ptr(),
                CK_ULONG::try_from(pin.len())?,
            )
        };
        match rv {
            CKR_OK => {
                self.logged_in = true;
                Ok(())
            }
            CKR_USER_ALREADY_LOGGED_IN => {
                warn!("user already logged in, ignoring login");
                Ok(())
            }
            rv => Err(HError::Pkcs11 {
                message: "Failed logging in".to_owned(),
                function: "C_Login",
                rv,
            }),
        }
    }

    fn logout(&self) -> HResult<()> {
        hsm_call!(self.hsm, "Failed logging out", C_Logout, self.handle);
        Ok(())
    }

    fn close_session(&self) -> HResult<()> {
        hsm_call!(
            self.hsm,
            "Failed closing a session",
            C_CloseSession,
            self.handle
        );
        Ok(())
    }

    /// Log out (if logged in) and close the session.
    ///
    /// Both steps are always attempted; the first failure is returned.
    /// Closing an already closed session is a no-op.
    pub fn close(&mut self) -> HResult<()> {
        if self.closed {
            return Ok(());
        }
        self.closed = true;
        let logout = if self.logged_in {
            self.logged_in = false;
            self.logout()
        } else {
            Ok(())
        };
        let close = self.close_session();
        debug!("Closed session: {}", self.handle);
        logout.and(close)
    }

    /// Retrieve the handles of the objects matching `template`.
    ///
    /// The search is always finalized, even when fetching the handles failed.
    pub(crate) fn find_object_handles(
        &self,
        template: &mut [CK_ATTRIBUTE],
    ) -> HResult<Vec<CK_OBJECT_HANDLE>> {
        hsm_call!(
            self.hsm,
            "Failed to initialize object search",
            C_FindObjectsInit,
            self.handle,
            template.as_mut_ptr(),
            CK_ULONG::try_from(template.len())?
        );
        let found = self.fetch_found_handles();
        let finalized = self.find_objects_final();
        let object_handles = found?;
        finalized?;
        Ok(object_handles)
    }

    fn fetch_found_handles(&self) -> HResult<Vec<CK_OBJECT_HANDLE>> {
        let mut object_handles: Vec<CK_OBJECT_HANDLE> = Vec::new();
        let mut handles_buf = vec![CK_OBJECT_HANDLE::default(); FIND_MAX_OBJECT_COUNT];
        let mut object_count: CK_ULONG = 0;
        loop {
            hsm_call!(
                self.hsm,
                "Failed to find objects",
                C_FindObjects,
                self.handle,
                handles_buf.as_mut_ptr(),
                CK_ULONG::try_from(FIND_MAX_OBJECT_COUNT)?,
                &raw mut object_count
            );
            if object_count == 0 {
                break;
            }
            trace!("Found {object_count} objects");
            object_handles.extend_from_slice(
                handles_buf
                    .get(..usize::try_from(object_count)?)
                    .ok_or_else(|| {
                        HError::Default("More objects returned than requested".to_owned())
                    })?,
            );
        }
        Ok(object_handles)
    }

    fn find_objects_final(&self) -> HResult<()> {
        hsm_call!(
            self.hsm,
            "Failed to finalize object search",
            C_FindObjectsFinal,
            self.handle
        );
        Ok(())
    }

    /// Read the attributes listed in `template` for `object_handle`.
    ///
    /// With null value pointers, the token fills in the value lengths only.
    pub(crate) fn call_get_attributes(
        &self,
        object_handle: CK_OBJECT_HANDLE,
        template: &mut [CK_ATTRIBUTE],
    ) -> HResult<()> {
        trace!("Retrieving attributes of object handle: {object_handle}");
        hsm_call!(
            self.hsm,
            format!("Failed to get the attributes of object handle {object_handle}"),
            C_GetAttributeValue,
            self.handle,
            object_handle,
            template.as_mut_ptr(),
            CK_ULONG::try_from(template.len())?
        );
        Ok(())
    }

    /// Decrypt `encrypted_data` with the key `key_handle` under `mechanism`.
    ///
    /// `C_Decrypt` is called twice: once for the output length, once for the output.
    pub(crate) fn decrypt_with_mechanism(
        &self,
        key_handle: CK_OBJECT_HANDLE,
        mechanism: &mut CK_MECHANISM,
        encrypted_data: &[u8],
    ) -> HResult<Zeroizing<Vec<u8>>> {
        let mut encrypted_data = encrypted_data.to_vec();
        hsm_call!(
            self.hsm,
            "Failed to initialize decryption",
            C_DecryptInit,
            self.handle,
            mechanism,
            key_handle
        );

        let mut decrypted_data_len: CK_ULONG = 0;
        hsm_call!(
            self.hsm,
            "Failed to get decrypted data length",
            C_Decrypt,
            self.handle,
            encrypted_data.as_mut_ptr(),
            CK_ULONG::try_from(encrypted_data.len())?,
            std::ptr::null_mut(),
            &raw mut decrypted_data_len
        );

        let mut decrypted_data = Zeroizing::new(vec![0_u8; usize::try_from(decrypted_data_len)?]);
        hsm_call!(
            self.hsm,
            "Failed to decrypt data",
            C_Decrypt,
            self.handle,
            encrypted_data.as_mut_ptr(),
            CK_ULONG::try_from(encrypted_data.len())?,
            decrypted_data.as_mut_ptr(),
            &raw mut decrypted_data_len
        );

        decrypted_data.truncate(usize::try_from(decrypted_data_len)?);
        Ok(decrypted_data)
    }
}

impl TokenSession for Session {
    fn get_key(
        &self,
        label: &str,
        key_type: KeyType,
        object_class: ObjectClass,
    ) -> InterfaceResult<ObjectHandle> {
        let handle = match key_type {
            KeyType::Rsa => self.find_rsa_key(label, object_class)?,
        };
        Ok(ObjectHandle(usize::try_from(handle).map_err(HError::from)?))
    }

    fn export_rsa_public_key(&self, key: ObjectHandle) -> InterfaceResult<RsaPublicKeyMaterial> {
        let handle = CK_OBJECT_HANDLE::try_from(key.0).map_err(HError::from)?;
        Ok(self.get_rsa_public_key(handle)?)
    }

    fn decrypt(
        &self,
        key: ObjectHandle,
        algorithm: CryptoAlgorithm,
        ciphertext: &[u8],
    ) -> InterfaceResult<Zeroizing<Vec<u8>>> {
        let handle = CK_OBJECT_HANDLE::try_from(key.0).map_err(HError::from)?;
        Ok(self.decrypt_rsa(handle, algorithm, ciphertext)?)
    }

    fn close(&mut self) -> InterfaceResult<()> {
        Ok(Self::close(self)?)
    }
}

impl Drop for Session {
    fn drop(&mut self) {
        if let Err(e) = self.close() {
            warn!("{e}");
        }
    }
}
