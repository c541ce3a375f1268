// First, declare the modules folder itself
mod modules;

// Re-export everything from modules for easier access
pub use modules::{admin, auth, cli, store, utils};

// Re-export commonly used types
pub use modules::admin::config::ProvisionConfig;
pub use modules::admin::provision::{provision_admin, ProvisionError, ProvisionOutcome, ProvisionRequest};
pub use modules::auth::hasher::{BcryptHasher, HashConfig, HashScheme, PasswordHasher, Pbkdf2Hasher};
pub use modules::store::{AccountStore, JsonFileAccountStore, MemoryAccountStore, StorageError, StoreConnection};
pub use modules::store::account::{Account, AccountUpdateFields, Language, NewAccountFields, Plan, Role};

// Constants
pub const DEFAULT_ADMIN_EMAIL: &str = "admin@formease.com";
pub const DEFAULT_ADMIN_PASSWORD: &str = "admin123";
pub const DEFAULT_STORE_FILE: &str = "formease-accounts.json";
pub const MIN_PASSWORD_LENGTH: usize = 8;
pub const DEFAULT_BCRYPT_COST: u32 = 10;
pub const DEFAULT_PBKDF2_ITERATIONS: u32 = 100_000;

// Type aliases
pub type HmacSha256 = hmac::Hmac<sha2::Sha256>;
