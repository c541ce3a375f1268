pub mod config;
pub mod provision;

pub use config::{ConfigError, ProvisionConfig};
pub use provision::{
    provision_admin, AccountDefaults, ProvisionError, ProvisionOutcome, ProvisionRequest,
};
