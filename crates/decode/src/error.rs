use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq, Clone, Copy)]
pub enum DecodeError {
    #[error("no catalog entry matches {0:#010x}")]
    UnknownEncoding(u32),
}
