// Copyright (c) 2024-present, fjall-rs
// This source code is licensed under both the Apache 2.0 and MIT License
// (found in the LICENSE-* files in the repository)

use crate::digest::Digest;

/// Represents errors that can occur in the LSET engine
#[derive(Debug)]
pub enum Error {
    /// I/O error inside a host callback
    Io(std::io::Error),

    /// The bin name is empty
    BinNameNull,

    /// The bin name exceeds the host's bin name limit (14 characters)
    BinNameTooLong(usize),

    /// The top record does not exist
    TopRecordNotFound,

    /// The named bin does not hold a set
    BinNotFound(String),

    /// The named bin (or a reserved bucket bin) is already taken
    BinExists(String),

    /// The bin holds something that is not a live set descriptor
    /// (shape, magic or type check failed)
    BinDamaged(&'static str),

    /// The stored descriptor was written by a newer engine (stored, engine)
    VersionMismatch(u16, u16),

    /// The inserted value is already a member of the set
    UniqueKeyViolation,

    /// The searched key is not a member of the set
    NotFound,

    /// Malformed input parameter
    InputParam(String),

    /// The named user module is not registered
    UserModuleNotFound(String),

    /// The named user module exists but is unusable
    /// (missing function, bad settings)
    UserModuleBad(String),

    /// The host failed to open a sub-record
    SubRecOpen(Digest),

    /// The host failed to remove a sub-record
    SubRecDelete(Digest),

    /// The host failed to commit the top record
    TopRecordUpdate,

    /// Invariant violation (should be unreachable)
    Internal(&'static str),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "LsetError: {self:?}")
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Set result
pub type Result<T> = std::result::Result<T, Error>;
