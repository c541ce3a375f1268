pub mod account;
mod json_file;
mod memory;

use std::fmt;
use std::io;

use account::{Account, AccountUpdateFields, NewAccountFields};

pub use json_file::JsonFileAccountStore;
pub use memory::{FailOn, MemoryAccountStore};

/// Errors raised by the storage collaborator
#[derive(Debug)]
pub enum StorageError {
    Connection(String),
    Conflict(String),
    NotFound(String),
    Serialization(String),
    Io(io::Error),
}

impl From<io::Error> for StorageError {
    fn from(error: io::Error) -> Self {
        StorageError::Io(error)
    }
}

impl From<serde_json::Error> for StorageError {
    fn from(error: serde_json::Error) -> Self {
        StorageError::Serialization(error.to_string())
    }
}

impl fmt::Display for StorageError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageError::Connection(msg) => write!(f, "connection failed: {}", msg),
            StorageError::Conflict(msg) => write!(f, "constraint violation: {}", msg),
            StorageError::NotFound(msg) => write!(f, "not found: {}", msg),
            StorageError::Serialization(msg) => write!(f, "invalid store data: {}", msg),
            StorageError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for StorageError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            StorageError::Io(e) => Some(e),
            _ => None,
        }
    }
}

/// A source of account connections.
///
/// Each call to [`AccountStore::connect`] hands out one connection; the
/// connection releases whatever it holds when dropped.
pub trait AccountStore {
    fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StorageError>;
}

/// Keyed access to account records. `email` is the unique key.
pub trait StoreConnection {
    fn find_by_email(&mut self, email: &str) -> Result<Option<Account>, StorageError>;

    /// Fails with [`StorageError::Conflict`] if an account already uses the email
    fn create(&mut self, fields: NewAccountFields) -> Result<Account, StorageError>;

    /// Fails with [`StorageError::NotFound`] if no account uses the email
    fn update(&mut self, email: &str, fields: AccountUpdateFields) -> Result<Account, StorageError>;
}
