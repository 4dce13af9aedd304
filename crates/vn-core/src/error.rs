use thiserror::Error;

pub type VnResult<T> = Result<T, VnError>;

#[derive(Error, Debug)]
pub enum VnError {
    #[error("Non-finite numeric value for {what}: {value}")]
    NonFinite { what: &'static str, value: f64 },

    #[error("Invalid argument: {what}")]
    InvalidArg { what: &'static str },

    #[error("Invalid configuration: {what}")]
    Config { what: String },
}
