use std::{
    fmt::{self, Display, Formatter},
    ptr,
    sync::Arc,
};

use hsm_roundtrip_interfaces::{InterfaceResult, MechanismInfo, Pkcs11Token, TokenInfo};
use hsm_roundtrip_logger::{debug, info};
use pkcs11_sys::{CK_INFO, CK_SLOT_ID, CK_TRUE, CK_ULONG};

use crate::{
    HError, HResult, Session, SlotManager, hsm_call, hsm_lib::HsmLib, slots::padded_string,
};

/// A PKCS#11 library loaded from disk, exposing its slots and tokens.
pub struct BaseHsm {
    hsm_lib: Arc<HsmLib>,
}

impl BaseHsm {
    /// Load and initialize the PKCS#11 library at `path`.
    ///
    /// The library is finalized once this value and every session opened from it are dropped.
    pub fn instantiate<P: AsRef<std::ffi::OsStr>>(path: P) -> HResult<Self> {
        let hsm_lib = Arc::new(HsmLib::instantiate(path)?);
        let hsm = Self { hsm_lib };
        let info = hsm.get_info()?;
        info!("Connected to the HSM: {info}");
        Ok(hsm)
    }

    /// General information about the library (`C_GetInfo`)
    pub fn get_info(&self) -> HResult<Info> {
        let mut info = CK_INFO::default();
        hsm_call!(self.hsm_lib, "Failed getting HSM info", C_GetInfo, &raw mut info);
        Ok(info.into())
    }

    /// The identifiers of the slots with a token present
    pub fn get_available_slot_list(&self) -> HResult<Vec<usize>> {
        let mut count: CK_ULONG = 0;
        hsm_call!(
            self.hsm_lib,
            "Failed counting the slots",
            C_GetSlotList,
            CK_TRUE,
            ptr::null_mut(),
            &raw mut count
        );
        let mut slot_ids = vec![CK_SLOT_ID::default(); usize::try_from(count)?];
        hsm_call!(
            self.hsm_lib,
            "Failed listing the slots",
            C_GetSlotList,
            CK_TRUE,
            slot_ids.as_mut_ptr(),
            &raw mut count
        );
        slot_ids.truncate(usize::try_from(count)?);
        debug!("{} slots with a token present", slot_ids.len());
        slot_ids
            .into_iter()
            .map(|id| usize::try_from(id).map_err(HError::from))
            .collect()
    }

    /// Get a manager for `slot_id`
    #[must_use]
    pub fn get_slot(&self, slot_id: usize) -> SlotManager {
        SlotManager::new(self.hsm_lib.clone(), slot_id)
    }
}

impl Pkcs11Token for BaseHsm {
    type Session = Session;

    fn get_available_slot_list(&self) -> InterfaceResult<Vec<usize>> {
        Ok(Self::get_available_slot_list(self)?)
    }

    fn get_token_info(&self, slot_id: usize) -> InterfaceResult<TokenInfo> {
        Ok(self.get_slot(slot_id).get_token_info()?)
    }

    fn get_mechanisms(&self, slot_id: usize) -> InterfaceResult<Vec<MechanismInfo>> {
        let slot = self.get_slot(slot_id);
        let mut mechanisms = Vec::new();
        for mechanism in slot.get_supported_mechanisms()? {
            mechanisms.push(slot.get_mechanism_info(mechanism)?);
        }
        Ok(mechanisms)
    }

    fn open_session(&self, slot_id: usize, user_pin: &str) -> InterfaceResult<Session> {
        Ok(self.get_slot(slot_id).open_session(user_pin)?)
    }
}

pub struct Info {
    pub cryptokiVersion: (u8, u8),
    pub manufacturerID: String,
    pub flags: u64,
    pub libraryDescription: String,
    pub libraryVersion: (u8, u8),
}

impl From<CK_INFO> for Info {
    fn from(info: CK_INFO) -> Self {
        Self {
            cryptokiVersion: (info.cryptokiVersion.major, info.cryptokiVersion.minor),
            manufacturerID: padded_string(&info.manufacturerID),
            flags: u64::from(info.flags),
            libraryDescription: padded_string(&info.libraryDescription),
            libraryVersion: (info.libraryVersion.major, info.libraryVersion.minor),
        }
    }
}

impl Display for Info {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Cryptoki Version: {}.{}, Manufacturer ID: {}, Flags: {}, Library Description: {}, \
             Library Version: {}.{}",
            self.cryptokiVersion.0,
            self.cryptokiVersion.1,
            self.manufacturerID,
            self.flags,
            self.libraryDescription,
            self.libraryVersion.0,
            self.libraryVersion.1
        )
    }
}
