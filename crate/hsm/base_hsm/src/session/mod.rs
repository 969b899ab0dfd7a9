mod rsa;
mod session_impl;

pub use session_impl::Session;
