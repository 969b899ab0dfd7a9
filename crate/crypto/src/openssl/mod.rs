/// Identifier of the OpenSSL library the process is linked against,
/// e.g. `OpenSSL 3.0.13 30 Jan 2024`.
#[must_use]
pub fn backend_version() -> &'static str {
    openssl::version::version()
}
