#![allow(clippy::uninlined_format_args)]

//! Error related data structures to be shared and used.
//!
//! This module contains the [`Error`] enum, which is used to represent
//! errors that can occur within dmgboy domain.

use std::fmt::{self, Display, Formatter};

/// Top level enum for error handling within dmgboy.
///
/// Most of the time, you will want to use the `CustomError` variant
/// to provide a more detailed error message.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Error {
    InvalidData,
    RomSize,
    IncompatibleBootRom,
    InvalidParameter(String),

    /// A ROM file could not be opened or read from disk.
    RomIoError(String),

    /// The cartridge header names an MBC or RAM-size byte outside the
    /// accepted set (see [`crate`] docs for the core's cartridge support).
    UnsupportedCartridge(String),

    /// A bank-swap request named an index beyond the loaded bank sequence.
    InvalidBank(String),

    /// The CPU attempted to execute an opcode with no defined behavior.
    IllegalOpcode(u8),

    /// A host API call was made that the run loop's current state forbids,
    /// e.g. single-stepping while the loop is already running.
    InvalidState(String),

    CustomError(String),
}

impl Error {
    pub fn description(&self) -> String {
        match self {
            Error::InvalidData => String::from("Invalid data format"),
            Error::RomSize => String::from("Invalid ROM size"),
            Error::IncompatibleBootRom => String::from("Incompatible Boot ROM"),
            Error::InvalidParameter(message) => format!("Invalid parameter: {}", message),
            Error::RomIoError(message) => format!("ROM I/O error: {}", message),
            Error::UnsupportedCartridge(message) => format!("Unsupported cartridge: {}", message),
            Error::InvalidBank(message) => format!("Invalid bank: {}", message),
            Error::IllegalOpcode(opcode) => format!("Illegal opcode: 0x{:02x}", opcode),
            Error::InvalidState(message) => format!("Invalid state: {}", message),
            Error::CustomError(message) => String::from(message),
        }
    }
}

impl Display for Error {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.description())
    }
}
