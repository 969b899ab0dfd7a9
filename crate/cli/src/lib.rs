pub mod config;
pub mod error;
pub mod report;
pub mod roundtrip;

#[cfg(test)]
#[allow(
    clippy::unwrap_used,
    clippy::panic_in_result_fn,
    clippy::indexing_slicing,
    clippy::panic
)]
