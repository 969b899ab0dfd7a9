/// Information about a token sitting in a slot
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenInfo {
    pub slot_id: usize,
    /// the label, already normalized (see [`normalize_token_label`])
    pub label: String,
    pub manufacturer_id: String,
    pub model: String,
    pub serial_number: String,
    /// `CKF_TOKEN_INITIALIZED`
    pub initialized: bool,
}

/// Normalize a label reported by a token: trailing NUL characters are removed first,
/// then trailing whitespace.
///
/// PKCS#11 labels are fixed size fields padded with blanks, and some drivers pad
/// with NUL bytes instead.
#[must_use]
pub fn normalize_token_label(raw_label: &str) -> &str {
    raw_label.trim_end_matches('\0').trim_end()
}
