#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Error {
    #[error("Shorty signature is empty (missing return type)")]
    EmptyShorty,

    #[error("Invalid shorty character '{ch}' at position {position}")]
    InvalidShortyChar { ch: char, position: usize },

    #[error("Void is only valid as a return type (argument at position {position})")]
    VoidArgument { position: usize },

    #[error("Outgoing args for {fp} fp + {non_fp} non-fp arguments overflow usize")]
    OutArgsOverflow { fp: usize, non_fp: usize },

    #[error("Invalid calling convention: {0}")]
    InvalidConvention(String),
}

pub type Result<T> = std::result::Result<T, Error>;
