use std::fmt;

use chrono::Utc;
use log::debug;

use crate::modules::auth::hasher::{HashError, PasswordHasher};
use crate::modules::auth::password::{validate_password, PasswordError};
use crate::modules::store::account::{
    Account, AccountUpdateFields, Language, NewAccountFields, Plan, Role,
};
use crate::modules::store::{AccountStore, StorageError};

pub const DEFAULT_FIRST_NAME: &str = "Admin";
pub const DEFAULT_LAST_NAME: &str = "FormEase";

/// Field values applied only when provisioning creates the account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountDefaults {
    pub first_name: String,
    pub last_name: String,
    pub language: Language,
    pub plan: Plan,
}

impl Default for AccountDefaults {
    fn default() -> Self {
        Self {
            first_name: DEFAULT_FIRST_NAME.to_string(),
            last_name: DEFAULT_LAST_NAME.to_string(),
            language: Language::default(),
            plan: Plan::default(),
        }
    }
}

/// Inputs to a single provisioning run
#[derive(Debug, Clone)]
pub struct ProvisionRequest {
    pub email: String,
    pub password: String,
    pub role: Role,
    pub defaults: AccountDefaults,
}

impl ProvisionRequest {
    /// Request for the highest-privilege role with default creation fields
    pub fn new(email: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            email: email.into(),
            password: password.into(),
            role: Role::highest(),
            defaults: AccountDefaults::default(),
        }
    }
}

/// Which branch provisioning took, with the resulting record
#[derive(Debug, Clone, PartialEq)]
pub enum ProvisionOutcome {
    Created(Account),
    Updated(Account),
}

impl ProvisionOutcome {
    pub fn account(&self) -> &Account {
        match self {
            ProvisionOutcome::Created(account) | ProvisionOutcome::Updated(account) => account,
        }
    }

    pub fn is_created(&self) -> bool {
        matches!(self, ProvisionOutcome::Created(_))
    }

    /// Operator-facing status line
    pub fn status_message(&self) -> &'static str {
        match self {
            ProvisionOutcome::Created(_) => "Admin créé avec succès.",
            ProvisionOutcome::Updated(_) => "Admin mis à jour avec succès.",
        }
    }
}

/// Provisioning failures. None of them leave a partial write behind.
#[derive(Debug)]
pub enum ProvisionError {
    Validation(PasswordError),
    Hashing(HashError),
    Storage(StorageError),
}

impl From<PasswordError> for ProvisionError {
    fn from(error: PasswordError) -> Self {
        ProvisionError::Validation(error)
    }
}

impl From<HashError> for ProvisionError {
    fn from(error: HashError) -> Self {
        ProvisionError::Hashing(error)
    }
}

impl From<StorageError> for ProvisionError {
    fn from(error: StorageError) -> Self {
        ProvisionError::Storage(error)
    }
}

impl fmt::Display for ProvisionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ProvisionError::Validation(e) => write!(f, "validation error: {}", e),
            ProvisionError::Hashing(e) => write!(f, "hashing error: {}", e),
            ProvisionError::Storage(e) => write!(f, "storage error: {}", e),
        }
    }
}

impl std::error::Error for ProvisionError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ProvisionError::Validation(e) => Some(e),
            ProvisionError::Hashing(e) => Some(e),
            ProvisionError::Storage(e) => Some(e),
        }
    }
}

/// Ensure exactly one account exists for `request.email` with the requested
/// role and a fresh hash of `request.password`.
///
/// Validation and hashing both run before the store is touched, so a rejected
/// password never opens a connection. The connection is then held for the
/// lookup and write and released when it goes out of scope, on success and on
/// every error path. Concurrent runs for the same email are not serialized
/// here; the store's uniqueness check decides.
pub fn provision_admin(
    store: &dyn AccountStore,
    hasher: &dyn PasswordHasher,
    request: &ProvisionRequest,
) -> Result<ProvisionOutcome, ProvisionError> {
    validate_password(&request.password)?;
    let password_hash = hasher.hash(&request.password)?;
    debug!("Hashed admin credential with {}", hasher.scheme());

    let mut conn = store.connect()?;

    match conn.find_by_email(&request.email)? {
        Some(existing) => {
            debug!("Account {} exists, updating role and credential", existing.id);
            let account = conn.update(
                &request.email,
                AccountUpdateFields {
                    role: request.role,
                    password_hash,
                    updated_at: Utc::now(),
                },
            )?;
            Ok(ProvisionOutcome::Updated(account))
        }
        None => {
            debug!("No account for this email, creating one");
            let defaults = &request.defaults;
            let account = conn.create(NewAccountFields {
                email: request.email.clone(),
                password_hash,
                role: request.role,
                first_name: defaults.first_name.clone(),
                last_name: defaults.last_name.clone(),
                language: defaults.language,
                plan: defaults.plan,
            })?;
            Ok(ProvisionOutcome::Created(account))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::modules::auth::hasher::{BcryptHasher, Pbkdf2Hasher};
    use crate::modules::store::{FailOn, MemoryAccountStore};

    fn hasher() -> BcryptHasher {
        BcryptHasher::new(4).unwrap()
    }

    #[test]
    fn test_creates_account_with_defaults() {
        let store = MemoryAccountStore::new();
        let request = ProvisionRequest::new("jeff.kosi@formease.com", "FormEase2025!");

        let outcome = provision_admin(&store, &hasher(), &request).unwrap();
        assert!(outcome.is_created());
        assert_eq!(outcome.status_message(), "Admin créé avec succès.");

        let account = store.get("jeff.kosi@formease.com").unwrap();
        assert_eq!(&account, outcome.account());
        assert_eq!(account.role, Role::SuperAdmin);
        assert_eq!(account.first_name, "Admin");
        assert_eq!(account.last_name, "FormEase");
        assert_eq!(account.language, Language::Fr);
        assert_eq!(account.plan, Plan::Free);
        assert_ne!(account.password_hash, "FormEase2025!");
        assert!(hasher().verify("FormEase2025!", &account.password_hash).unwrap());
        assert!(!hasher().verify("wrong", &account.password_hash).unwrap());
    }

    #[test]
    fn test_updates_existing_account() {
        let store = MemoryAccountStore::new();
        provision_admin(&store, &hasher(), &ProvisionRequest::new("a@formease.com", "FirstPass1")).unwrap();
        let before = store.get("a@formease.com").unwrap();

        let mut request = ProvisionRequest::new("a@formease.com", "SecondPass2");
        request.defaults.first_name = "Ignored".to_string();
        let outcome = provision_admin(&store, &hasher(), &request).unwrap();
        assert!(!outcome.is_created());
        assert_eq!(outcome.status_message(), "Admin mis à jour avec succès.");

        let after = store.get("a@formease.com").unwrap();
        assert_eq!(store.len(), 1);
        assert_eq!(after.id, before.id);
        assert_eq!(after.first_name, before.first_name);
        assert_eq!(after.last_name, before.last_name);
        assert_eq!(after.created_at, before.created_at);
        assert_ne!(after.password_hash, before.password_hash);
        assert!(after.updated_at >= before.updated_at);
        assert!(hasher().verify("SecondPass2", &after.password_hash).unwrap());
        assert!(!hasher().verify("FirstPass1", &after.password_hash).unwrap());
    }

    #[test]
    fn test_update_promotes_role() {
        let store = MemoryAccountStore::new();
        let mut request = ProvisionRequest::new("b@formease.com", "Password123!");
        request.role = Role::User;
        provision_admin(&store, &hasher(), &request).unwrap();
        assert_eq!(store.get("b@formease.com").unwrap().role, Role::User);

        request.role = Role::SuperAdmin;
        provision_admin(&store, &hasher(), &request).unwrap();
        assert_eq!(store.get("b@formease.com").unwrap().role, Role::SuperAdmin);
    }

    #[test]
    fn test_short_password_is_rejected_without_storage_calls() {
        let store = MemoryAccountStore::new();
        let request = ProvisionRequest::new("admin@formease.com", "short");

        let err = provision_admin(&store, &hasher(), &request).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Validation(PasswordError::TooShort { actual: 5, .. })
        ));
        assert!(store.is_empty());
        assert_eq!(store.operations(), 0);
        assert_eq!(store.connections_opened(), 0);
        assert_eq!(store.connections_released(), 0);
    }

    #[test]
    fn test_short_password_wins_over_unreachable_store() {
        let store = MemoryAccountStore::new();
        store.fail_on(FailOn::Connect);
        let request = ProvisionRequest::new("admin@formease.com", "short");

        let err = provision_admin(&store, &hasher(), &request).unwrap_err();
        assert!(matches!(err, ProvisionError::Validation(_)));
        assert_eq!(store.connections_opened(), 0);
    }

    #[test]
    fn test_overlong_bcrypt_password_is_rejected_before_storage() {
        let store = MemoryAccountStore::new();
        let request = ProvisionRequest::new("g@formease.com", format!("{}first", "A".repeat(72)));

        let err = provision_admin(&store, &hasher(), &request).unwrap_err();
        assert!(matches!(
            err,
            ProvisionError::Hashing(HashError::PasswordTooLong { max: 72, .. })
        ));
        assert!(store.is_empty());
        assert_eq!(store.connections_opened(), 0);
    }

    #[test]
    fn test_connection_released_on_storage_failure() {
        for op in [FailOn::Find, FailOn::Create] {
            let store = MemoryAccountStore::new();
            store.fail_on(op);
            let request = ProvisionRequest::new("c@formease.com", "Password123!");

            let err = provision_admin(&store, &hasher(), &request).unwrap_err();
            assert!(matches!(err, ProvisionError::Storage(_)));
            assert!(store.is_empty());
            assert_eq!(store.connections_released(), 1);
        }
    }

    #[test]
    fn test_failed_update_keeps_previous_record() {
        let store = MemoryAccountStore::new();
        let request = ProvisionRequest::new("d@formease.com", "Password123!");
        provision_admin(&store, &hasher(), &request).unwrap();
        let before = store.get("d@formease.com").unwrap();

        store.fail_on(FailOn::Update);
        let err = provision_admin(&store, &hasher(), &ProvisionRequest::new("d@formease.com", "Another123!"))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Storage(_)));
        assert_eq!(store.get("d@formease.com").unwrap(), before);
        assert_eq!(store.connections_opened(), 2);
        assert_eq!(store.connections_released(), 2);
    }

    #[test]
    fn test_connect_failure_is_storage_error() {
        let store = MemoryAccountStore::new();
        store.fail_on(FailOn::Connect);
        let err = provision_admin(&store, &hasher(), &ProvisionRequest::new("e@formease.com", "Password123!"))
            .unwrap_err();
        assert!(matches!(err, ProvisionError::Storage(StorageError::Connection(_))));
        assert_eq!(store.connections_released(), 0);
    }

    #[test]
    fn test_works_with_pbkdf2() {
        let store = MemoryAccountStore::new();
        let pbkdf2 = Pbkdf2Hasher::new(1_000).unwrap();
        provision_admin(&store, &pbkdf2, &ProvisionRequest::new("f@formease.com", "Password123!")).unwrap();

        let account = store.get("f@formease.com").unwrap();
        assert!(account.password_hash.starts_with("pbkdf2-sha256$1000$"));
        assert!(pbkdf2.verify("Password123!", &account.password_hash).unwrap());
    }
}
