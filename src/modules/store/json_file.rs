use std::ffi::OsString;
use std::fs::{self, File, OpenOptions};
use std::io::{self, Read, Write};
use std::path::{Path, PathBuf};

use chrono::Utc;
use log::{debug, warn};
use serde::{Deserialize, Serialize};

use super::account::{Account, AccountUpdateFields, NewAccountFields};
use super::{AccountStore, StorageError, StoreConnection};

/// On-disk layout of the account file
#[derive(Serialize, Deserialize, Default, Clone)]
struct AccountFile {
    next_id: u64,
    accounts: Vec<Account>,
}

/// Account store backed by a single JSON document.
///
/// A connection holds `<path>.lock` for its whole lifetime, so two
/// provisioners on the same host never interleave their read-modify-write.
pub struct JsonFileAccountStore {
    path: PathBuf,
}

impl JsonFileAccountStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn lock_path(&self) -> PathBuf {
        sibling(&self.path, ".lock")
    }

    fn load(&self) -> Result<AccountFile, StorageError> {
        let mut file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(AccountFile::default()),
            Err(e) => return Err(StorageError::Io(e)),
        };

        let mut contents = String::new();
        file.read_to_string(&mut contents)?;
        if contents.trim().is_empty() {
            return Ok(AccountFile::default());
        }
        Ok(serde_json::from_str(&contents)?)
    }

    fn save(&self, data: &AccountFile) -> Result<(), StorageError> {
        let json = serde_json::to_string_pretty(data)?;

        // Write next to the target and rename so readers never see a torn file
        let tmp_path = sibling(&self.path, ".tmp");
        let mut tmp = File::create(&tmp_path)?;
        tmp.write_all(json.as_bytes())?;
        tmp.sync_all()?;
        fs::rename(&tmp_path, &self.path)?;
        Ok(())
    }
}

impl AccountStore for JsonFileAccountStore {
    fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StorageError> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }

        let lock_path = self.lock_path();
        let mut lock = match OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&lock_path)
        {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {
                return Err(StorageError::Connection(format!(
                    "account store is locked by another process ({})",
                    lock_path.display()
                )));
            }
            Err(e) => return Err(StorageError::Io(e)),
        };
        // Best effort: the pid only helps an operator clean up a stale lock
        let _ = writeln!(lock, "{}", std::process::id());

        // The guard owns the lock from here on, so a failed load still releases it
        let mut connection = JsonFileConnection {
            store: self,
            lock_path,
            data: AccountFile::default(),
        };
        connection.data = self.load()?;
        debug!("Opened account store {}", self.path.display());
        Ok(Box::new(connection))
    }
}

struct JsonFileConnection<'a> {
    store: &'a JsonFileAccountStore,
    lock_path: PathBuf,
    data: AccountFile,
}

impl JsonFileConnection<'_> {
    fn commit(&mut self, data: AccountFile) -> Result<(), StorageError> {
        self.store.save(&data)?;
        self.data = data;
        Ok(())
    }
}

impl StoreConnection for JsonFileConnection<'_> {
    fn find_by_email(&mut self, email: &str) -> Result<Option<Account>, StorageError> {
        Ok(self
            .data
            .accounts
            .iter()
            .find(|a| a.email == email)
            .cloned())
    }

    fn create(&mut self, fields: NewAccountFields) -> Result<Account, StorageError> {
        if self.data.accounts.iter().any(|a| a.email == fields.email) {
            return Err(StorageError::Conflict(format!(
                "email already registered: {}",
                fields.email
            )));
        }

        let mut next = self.data.clone();
        next.next_id += 1;
        let account = Account::from_new(next.next_id, fields, Utc::now());
        next.accounts.push(account.clone());
        self.commit(next)?;
        Ok(account)
    }

    fn update(&mut self, email: &str, fields: AccountUpdateFields) -> Result<Account, StorageError> {
        let mut next = self.data.clone();
        let account = next
            .accounts
            .iter_mut()
            .find(|a| a.email == email)
            .ok_or_else(|| StorageError::NotFound(format!("no account for {}", email)))?;
        account.apply(fields);
        let account = account.clone();
        self.commit(next)?;
        Ok(account)
    }
}

impl Drop for JsonFileConnection<'_> {
    fn drop(&mut self) {
        if let Err(e) = fs::remove_file(&self.lock_path) {
            warn!(
                "Failed to release account store lock {}: {}",
                self.lock_path.display(),
                e
            );
        }
    }
}

fn sibling(path: &Path, suffix: &str) -> PathBuf {
    let mut name: OsString = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(suffix);
    path.with_file_name(name)
}
