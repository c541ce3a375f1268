use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Mutex, MutexGuard};

use chrono::Utc;

use super::account::{Account, AccountUpdateFields, NewAccountFields};
use super::{AccountStore, StorageError, StoreConnection};

/// Store operation that a [`MemoryAccountStore`] can be told to fail
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailOn {
    Connect,
    Find,
    Create,
    Update,
}

#[derive(Default)]
struct MemoryState {
    accounts: HashMap<String, Account>,
    next_id: u64,
}

/// In-process account store.
///
/// Keeps counters for opened/released connections and issued operations so
/// callers can check resource discipline, and can be armed to fail one kind
/// of operation.
#[derive(Default)]
pub struct MemoryAccountStore {
    state: Mutex<MemoryState>,
    fail_on: Mutex<Option<FailOn>>,
    opened: AtomicUsize,
    released: AtomicUsize,
    operations: AtomicUsize,
}

impl MemoryAccountStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Make every subsequent `op` fail with a storage error
    pub fn fail_on(&self, op: FailOn) {
        if let Ok(mut slot) = self.fail_on.lock() {
            *slot = Some(op);
        }
    }

    pub fn connections_opened(&self) -> usize {
        self.opened.load(Ordering::SeqCst)
    }

    pub fn connections_released(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    /// Number of find/create/update calls issued through any connection
    pub fn operations(&self) -> usize {
        self.operations.load(Ordering::SeqCst)
    }

    pub fn len(&self) -> usize {
        self.state.lock().map(|s| s.accounts.len()).unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Snapshot of a record, bypassing connection bookkeeping
    pub fn get(&self, email: &str) -> Option<Account> {
        self.state
            .lock()
            .ok()
            .and_then(|s| s.accounts.get(email).cloned())
    }

    fn should_fail(&self, op: FailOn) -> bool {
        self.fail_on
            .lock()
            .map(|slot| *slot == Some(op))
            .unwrap_or(false)
    }
}

impl AccountStore for MemoryAccountStore {
    fn connect(&self) -> Result<Box<dyn StoreConnection + '_>, StorageError> {
        if self.should_fail(FailOn::Connect) {
            return Err(StorageError::Connection(
                "memory store refused connection".to_string(),
            ));
        }
        self.opened.fetch_add(1, Ordering::SeqCst);
        Ok(Box::new(MemoryConnection { store: self }))
    }
}

struct MemoryConnection<'a> {
    store: &'a MemoryAccountStore,
}

impl MemoryConnection<'_> {
    fn begin(&self, op: FailOn) -> Result<MutexGuard<'_, MemoryState>, StorageError> {
        self.store.operations.fetch_add(1, Ordering::SeqCst);
        if self.store.should_fail(op) {
            return Err(StorageError::Connection(format!(
                "injected failure on {:?}",
                op
            )));
        }
        self.store
            .state
            .lock()
            .map_err(|_| StorageError::Connection("memory store lock poisoned".to_string()))
    }
}

impl StoreConnection for MemoryConnection<'_> {
    fn find_by_email(&mut self, email: &str) -> Result<Option<Account>, StorageError> {
        let state = self.begin(FailOn::Find)?;
        Ok(state.accounts.get(email).cloned())
    }

    fn create(&mut self, fields: NewAccountFields) -> Result<Account, StorageError> {
        let mut state = self.begin(FailOn::Create)?;
        if state.accounts.contains_key(&fields.email) {
            return Err(StorageError::Conflict(format!(
                "email already registered: {}",
                fields.email
            )));
        }

        state.next_id += 1;
        let account = Account::from_new(state.next_id, fields, Utc::now());
        state
            .accounts
            .insert(account.email.clone(), account.clone());
        Ok(account)
    }

    fn update(&mut self, email: &str, fields: AccountUpdateFields) -> Result<Account, StorageError> {
        let mut state = self.begin(FailOn::Update)?;
        let account = state
            .accounts
            .get_mut(email)
            .ok_or_else(|| StorageError::NotFound(format!("no account for {}", email)))?;
        account.apply(fields);
        Ok(account.clone())
    }
}

impl Drop for MemoryConnection<'_> {
    fn drop(&mut self) {
        self.store.released.fetch_add(1, Ordering::SeqCst);
    }
}
