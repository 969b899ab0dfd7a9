use std::fmt::{self, Display, Formatter};

/// Mechanism capability flags.
/// The bit values are the `CKF_*` values of `CK_MECHANISM_INFO.flags`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(transparent)]
pub struct MechanismFlags(u64);

bitflags::bitflags! {
    impl MechanismFlags: u64 {
        const HW = 0x0000_0001;
        const ENCRYPT = 0x0000_0100;
        const DECRYPT = 0x0000_0200;
        const DIGEST = 0x0000_0400;
        const SIGN = 0x0000_0800;
        const SIGN_RECOVER = 0x0000_1000;
        const VERIFY = 0x0000_2000;
        const VERIFY_RECOVER = 0x0000_4000;
        const GENERATE = 0x0000_8000;
        const GENERATE_KEY_PAIR = 0x0001_0000;
        const WRAP = 0x0002_0000;
        const UNWRAP = 0x0004_0000;
        const DERIVE = 0x0008_0000;
        const EC_F_P = 0x0010_0000;
        const EC_F_2M = 0x0020_0000;
        const EC_ECPARAMETERS = 0x0040_0000;
        const EC_OID = 0x0080_0000;
        const EC_UNCOMPRESS = 0x0100_0000;
        const EC_COMPRESS = 0x0200_0000;
        // Extensions 8XXXXXXX
        const EXTENSION = 0x8000_0000;
    }
}

impl Display for MechanismFlags {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.is_empty() {
            return write!(f, "(none)");
        }
        bitflags::parser::to_writer(self, f)
    }
}

/// A mechanism supported by a slot and its capabilities
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MechanismInfo {
    /// the raw `CKM_*` value
    pub mechanism_type: u64,
    /// the symbolic name, without the `CKM_` prefix
    pub name: String,
    pub min_key_size: u64,
    pub max_key_size: u64,
    pub flags: MechanismFlags,
}

impl MechanismInfo {
    #[must_use]
    pub const fn supports(&self, flags: MechanismFlags) -> bool {
        self.flags.contains(flags)
    }
}

impl Display for MechanismInfo {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Supported key lengths: [{}, {}]\nFlags: {}",
            self.min_key_size, self.max_key_size, self.flags
        )
    }
}
