use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Privilege tag carried by every account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "UPPERCASE")]
pub enum Role {
    User,
    Admin,
    SuperAdmin,
}

impl Role {
    /// The highest-privilege role, used for provisioning
    pub fn highest() -> Self {
        Role::SuperAdmin
    }
}

/// Interface language of an account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Language {
    #[default]
    Fr,
    En,
}

/// Subscription plan of an account
#[derive(Serialize, Deserialize, Debug, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "UPPERCASE")]
pub enum Plan {
    #[default]
    Free,
    Premium,
}

/// A persisted account. Owned by the store; callers only read it.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
pub struct Account {
    pub id: u64,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub language: Language,
    pub plan: Plan,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Every field a store needs to create an account
#[derive(Debug, Clone, PartialEq)]
pub struct NewAccountFields {
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub first_name: String,
    pub last_name: String,
    pub language: Language,
    pub plan: Plan,
}

/// The only fields provisioning is allowed to change on an existing account
#[derive(Debug, Clone, PartialEq)]
pub struct AccountUpdateFields {
    pub role: Role,
    pub password_hash: String,
    pub updated_at: DateTime<Utc>,
}

impl Account {
    /// Build a fresh record from creation fields
    pub fn from_new(id: u64, fields: NewAccountFields, now: DateTime<Utc>) -> Self {
        Self {
            id,
            email: fields.email,
            password_hash: fields.password_hash,
            role: fields.role,
            first_name: fields.first_name,
            last_name: fields.last_name,
            language: fields.language,
            plan: fields.plan,
            created_at: now,
            updated_at: now,
        }
    }

    /// Apply an update in place, leaving display and locale fields untouched
    pub fn apply(&mut self, fields: AccountUpdateFields) {
        self.role = fields.role;
        self.password_hash = fields.password_hash;
        self.updated_at = fields.updated_at;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn new_fields() -> NewAccountFields {
        NewAccountFields {
            email: "admin@formease.com".to_string(),
            password_hash: "hash-1".to_string(),
            role: Role::SuperAdmin,
            first_name: "Admin".to_string(),
            last_name: "FormEase".to_string(),
            language: Language::Fr,
            plan: Plan::Free,
        }
    }

    #[test]
    fn test_apply_only_touches_update_fields() {
        let created = Utc::now();
        let mut account = Account::from_new(1, new_fields(), created);
        assert_eq!(account.created_at, account.updated_at);

        let later = created + Duration::seconds(30);
        account.apply(AccountUpdateFields {
            role: Role::Admin,
            password_hash: "hash-2".to_string(),
            updated_at: later,
        });

        assert_eq!(account.role, Role::Admin);
        assert_eq!(account.password_hash, "hash-2");
        assert_eq!(account.updated_at, later);
        assert_eq!(account.created_at, created);
        assert_eq!(account.first_name, "Admin");
        assert_eq!(account.last_name, "FormEase");
        assert_eq!(account.language, Language::Fr);
        assert_eq!(account.plan, Plan::Free);
    }

    #[test]
    fn test_enum_wire_names() {
        assert_eq!(serde_json::to_string(&Role::SuperAdmin).unwrap(), "\"SUPERADMIN\"");
        assert_eq!(serde_json::to_string(&Language::Fr).unwrap(), "\"FR\"");
        assert_eq!(serde_json::to_string(&Plan::Premium).unwrap(), "\"PREMIUM\"");
        assert_eq!(serde_json::from_str::<Role>("\"ADMIN\"").unwrap(), Role::Admin);
    }

    #[test]
    fn test_role_helpers() {
        assert_eq!(Role::highest(), Role::SuperAdmin);
    }
}
