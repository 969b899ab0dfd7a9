use std::{ptr, sync::Arc};

use hsm_roundtrip_interfaces::{MechanismInfo, TokenInfo, normalize_token_label};
use hsm_roundtrip_logger::debug;
use pkcs11_sys::{
    CK_MECHANISM_INFO, CK_MECHANISM_TYPE, CK_SESSION_HANDLE, CK_SLOT_ID, CK_TOKEN_INFO, CK_ULONG,
    CKF_SERIAL_SESSION, CKF_TOKEN_INITIALIZED,
};

use crate::{HResult, Session, hsm_call, hsm_lib::HsmLib, mechanisms::mechanism_info};

/// Decode a fixed size, blank padded PKCS#11 text field
pub(crate) fn padded_string(field: &[u8]) -> String {
    normalize_token_label(&String::from_utf8_lossy(field)).to_owned()
}

/// A manager for a specific PKCS#11 slot.
///
/// Gives access to the token sitting in the slot, to its mechanisms,
/// and opens user sessions on it.
pub struct SlotManager {
    hsm_lib: Arc<HsmLib>,
    slot_id: usize,
}

impl SlotManager {
    pub(crate) const fn new(hsm_lib: Arc<HsmLib>, slot_id: usize) -> Self {
        Self { hsm_lib, slot_id }
    }

    fn ck_slot_id(&self) -> HResult<CK_SLOT_ID> {
        Ok(CK_SLOT_ID::try_from(self.slot_id)?)
    }

    /// Read the token information (`C_GetTokenInfo`).
    ///
    /// Text fields are decoded lossily and normalized: trailing NULs then trailing blanks
    /// are removed.
    pub fn get_token_info(&self) -> HResult<TokenInfo> {
        let mut info = CK_TOKEN_INFO::default();
        hsm_call!(
            self.hsm_lib,
            format!("Failed getting the token info of slot {}", self.slot_id),
            C_GetTokenInfo,
            self.ck_slot_id()?,
            &raw mut info
        );
        Ok(TokenInfo {
            slot_id: self.slot_id,
            label: padded_string(&info.label),
            manufacturer_id: padded_string(&info.manufacturerID),
            model: padded_string(&info.model),
            serial_number: padded_string(&info.serialNumber),
            initialized: info.flags & CKF_TOKEN_INITIALIZED != 0,
        })
    }

    /// List the mechanism types supported by the token, in the order reported.
    pub fn get_supported_mechanisms(&self) -> HResult<Vec<CK_MECHANISM_TYPE>> {
        let slot_id = self.ck_slot_id()?;
        let mut count: CK_ULONG = 0;
        hsm_call!(
            self.hsm_lib,
            "Failed counting the supported mechanisms",
            C_GetMechanismList,
            slot_id,
            ptr::null_mut(),
            &raw mut count
        );
        let mut mechanisms = vec![CK_MECHANISM_TYPE::default(); usize::try_from(count)?];
        hsm_call!(
            self.hsm_lib,
            "Failed listing the supported mechanisms",
            C_GetMechanismList,
            slot_id,
            mechanisms.as_mut_ptr(),
            &raw mut count
        );
        mechanisms.truncate(usize::try_from(count)?);
        debug!("slot {}: {} mechanisms", self.slot_id, mechanisms.len());
        Ok(mechanisms)
    }

    /// Get the key size range and capability flags of `mechanism`
    pub fn get_mechanism_info(&self, mechanism: CK_MECHANISM_TYPE) -> HResult<MechanismInfo> {
        let mut info = CK_MECHANISM_INFO::default();
        hsm_call!(
            self.hsm_lib,
            format!("Failed getting the info of mechanism {mechanism:#x}"),
            C_GetMechanismInfo,
            self.ck_slot_id()?,
            mechanism,
            &raw mut info
        );
        Ok(mechanism_info(mechanism, &info))
    }

    /// Open a read-only serial session and log in as user with `user_pin`.
    ///
    /// If the login fails, the session is closed before the error is returned.
    pub fn open_session(&self, user_pin: &str) -> HResult<Session> {
        let mut session_handle: CK_SESSION_HANDLE = 0;
        hsm_call!(
            self.hsm_lib,
            format!("Failed opening a session on slot {}", self.slot_id),
            C_OpenSession,
            self.ck_slot_id()?,
            CKF_SERIAL_SESSION,
            ptr::null_mut(),
            None,
            &raw mut session_handle
        );
        let mut session = Session::new(self.hsm_lib.clone(), session_handle);
        session.login(user_pin)?;
        Ok(session)
    }
}
