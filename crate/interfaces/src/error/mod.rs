use thiserror::Error;

pub type InterfaceResult<T> = Result<T, InterfaceError>;

#[derive(Error, Debug)]
pub enum InterfaceError {
    #[error("{0}")]
    Default(String),

    #[error("could not find token `{0}`")]
    TokenNotFound(String),

    #[error("Key not found: {0}")]
    KeyNotFound(String),

    #[error("Mechanism not supported: {0}")]
    MechanismUnsupported(String),

    #[error("Cryptographic error: {0}")]
    Cryptographic(String),

    #[error("HSM Error: {0}")]
    Hsm(String),
}
