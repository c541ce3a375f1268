use std::fmt;
use std::io::{self, Write};
use std::path::PathBuf;
use std::time::Instant;

use clap::{Arg, ArgAction, ArgMatches, Command};
use log::{debug, info, warn};

use crate::modules::admin::config::{parse_cost, parse_scheme, ConfigError, ProvisionConfig};
use crate::modules::admin::provision::{provision_admin, ProvisionError};
use crate::modules::auth::hasher::{verify_password, HashConfig, HashError, HashScheme};
use crate::modules::auth::password::{read_password, validate_password, PasswordError};
use crate::modules::store::JsonFileAccountStore;
use crate::modules::utils::io::is_valid_email;
use crate::modules::utils::logging::log_provision_event;
use crate::modules::utils::time::{format_datetime, format_elapsed};

/// Failures surfaced by the command-line front end
#[derive(Debug)]
pub enum CliError {
    Config(ConfigError),
    InvalidEmail(String),
    Validation(PasswordError),
    PasswordMismatch,
    Provision(ProvisionError),
    Hash(HashError),
    VerificationFailed,
    Io(io::Error),
}

impl CliError {
    /// Process exit code: 2 for rejected input, 3 for a hash that does not
    /// match, 1 for everything else
    pub fn exit_code(&self) -> u8 {
        match self {
            CliError::InvalidEmail(_)
            | CliError::Validation(_)
            | CliError::PasswordMismatch
            | CliError::Provision(ProvisionError::Validation(_))
            | CliError::Hash(HashError::PasswordTooLong { .. })
            | CliError::Provision(ProvisionError::Hashing(HashError::PasswordTooLong { .. })) => 2,
            CliError::VerificationFailed => 3,
            _ => 1,
        }
    }
}

impl From<ConfigError> for CliError {
    fn from(error: ConfigError) -> Self {
        CliError::Config(error)
    }
}

impl From<ProvisionError> for CliError {
    fn from(error: ProvisionError) -> Self {
        CliError::Provision(error)
    }
}

impl From<HashError> for CliError {
    fn from(error: HashError) -> Self {
        CliError::Hash(error)
    }
}

impl From<PasswordError> for CliError {
    fn from(error: PasswordError) -> Self {
        CliError::Validation(error)
    }
}

impl From<io::Error> for CliError {
    fn from(error: io::Error) -> Self {
        CliError::Io(error)
    }
}

impl fmt::Display for CliError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CliError::Config(e) => write!(f, "configuration error: {}", e),
            CliError::InvalidEmail(email) => write!(f, "invalid admin email: {}", email),
            CliError::Validation(e) => write!(f, "validation error: {}", e),
            CliError::PasswordMismatch => write!(f, "passwords don't match"),
            CliError::Provision(e) => write!(f, "{}", e),
            CliError::Hash(e) => write!(f, "{}", e),
            CliError::VerificationFailed => write!(f, "password does not match hash"),
            CliError::Io(e) => write!(f, "IO error: {}", e),
        }
    }
}

impl std::error::Error for CliError {}

fn scheme_args() -> [Arg; 2] {
    [
        Arg::new("scheme")
            .long("scheme")
            .help("Hash scheme: bcrypt or pbkdf2")
            .value_name("SCHEME"),
        Arg::new("cost")
            .long("cost")
            .help("Work factor: bcrypt cost or pbkdf2 iterations")
            .value_name("COST"),
    ]
}

/// Define the command-line interface
pub fn build_cli() -> Command {
    Command::new("formease-admin")
        .about("FormEase administration tooling")
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Enable debug logging")
                .action(ArgAction::SetTrue)
                .global(true),
        )
        .subcommand_required(true)
        .subcommand(
            Command::new("provision")
                .about("Create or update the admin account")
                .arg(
                    Arg::new("email")
                        .long("email")
                        .help("Admin email (overrides ADMIN_EMAIL)")
                        .value_name("EMAIL"),
                )
                .arg(
                    Arg::new("password")
                        .long("password")
                        .help("Admin password (overrides ADMIN_PASSWORD)")
                        .value_name("PASSWORD"),
                )
                .arg(
                    Arg::new("store")
                        .long("store")
                        .help("Account store file (overrides FORMEASE_STORE)")
                        .value_name("PATH"),
                )
                .args(scheme_args()),
        )
        .subcommand(
            Command::new("hash")
                .about("Print a hash of a password")
                .arg(
                    Arg::new("password")
                        .help("Password to hash; prompted for when omitted")
                        .required(false),
                )
                .args(scheme_args()),
        )
        .subcommand(
            Command::new("verify")
                .about("Check a password against a stored hash")
                .arg(Arg::new("password").help("Plaintext password").required(true))
                .arg(Arg::new("hash").help("Stored hash").required(true)),
        )
}

/// Dispatch a parsed command line.
///
/// `lookup` resolves environment keys, `out` receives operator-facing output.
pub fn run(
    matches: &ArgMatches,
    lookup: &dyn Fn(&str) -> Option<String>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    match matches.subcommand() {
        Some(("provision", sub)) => run_provision(sub, lookup, out),
        Some(("hash", sub)) => run_hash(sub, lookup, out),
        Some(("verify", sub)) => run_verify(sub, out),
        _ => Ok(()),
    }
}

/// Apply `--scheme` / `--cost` on top of an environment-derived hash config
fn hash_config_from(sub: &ArgMatches, mut config: HashConfig) -> Result<HashConfig, CliError> {
    if let Some(scheme) = sub.get_one::<String>("scheme") {
        let scheme: HashScheme = parse_scheme("--scheme", scheme)?;
        if scheme != config.scheme {
            // A cost tuned for one scheme is meaningless for the other
            config.cost = None;
        }
        config.scheme = scheme;
    }
    if let Some(cost) = sub.get_one::<String>("cost") {
        config.cost = Some(parse_cost("--cost", cost)?);
    }
    Ok(config)
}

fn run_provision(
    sub: &ArgMatches,
    lookup: &dyn Fn(&str) -> Option<String>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let mut config = ProvisionConfig::from_lookup(lookup)?;
    if let Some(email) = sub.get_one::<String>("email") {
        config.email = email.trim().to_string();
    }
    if let Some(password) = sub.get_one::<String>("password") {
        config = config.with_password(password.clone());
    }
    if let Some(path) = sub.get_one::<String>("store") {
        config.store_path = PathBuf::from(path);
    }
    config.hash = hash_config_from(sub, config.hash)?;

    if !is_valid_email(&config.email) {
        return Err(CliError::InvalidEmail(config.email));
    }
    if config.password_is_default {
        warn!("SECURITY WARNING: ADMIN_PASSWORD is not set, provisioning with the built-in default password. Change it immediately.");
    }

    let hasher = config.hash.build()?;
    let store = JsonFileAccountStore::new(&config.store_path);
    debug!(
        "Provisioning with {} (cost {}) into {}",
        config.hash.scheme,
        config.hash.effective_cost(),
        config.store_path.display()
    );

    match provision_admin(&store, hasher.as_ref(), &config.request()) {
        Ok(outcome) => {
            let account = outcome.account();
            let action = if outcome.is_created() { "create" } else { "update" };
            log_provision_event(
                action,
                &account.email,
                true,
                Some(&format!("updated_at={}", format_datetime(&account.updated_at))),
            );
            writeln!(out, "{}", outcome.status_message())?;
            Ok(())
        }
        Err(e) => {
            log_provision_event("provision", &config.email, false, Some(&e.to_string()));
            Err(e.into())
        }
    }
}

fn run_hash(
    sub: &ArgMatches,
    lookup: &dyn Fn(&str) -> Option<String>,
    out: &mut dyn Write,
) -> Result<(), CliError> {
    let password = match sub.get_one::<String>("password") {
        Some(password) => password.clone(),
        None => prompt_new_password()?,
    };
    validate_password(&password)?;

    let env_config = ProvisionConfig::from_lookup(lookup)?;
    let hash_config = hash_config_from(sub, env_config.hash)?;
    let hasher = hash_config.build()?;

    let started = Instant::now();
    let hash = hasher.hash(&password)?;
    info!(
        "Generated {} hash (cost {}) in {}",
        hash_config.scheme,
        hash_config.effective_cost(),
        format_elapsed(started.elapsed())
    );

    writeln!(out, "{}", hash)?;
    Ok(())
}

fn run_verify(sub: &ArgMatches, out: &mut dyn Write) -> Result<(), CliError> {
    let password = sub.get_one::<String>("password").map(String::as_str).unwrap_or_default();
    let hash = sub.get_one::<String>("hash").map(String::as_str).unwrap_or_default();

    if verify_password(password, hash)? {
        writeln!(out, "valid")?;
        Ok(())
    } else {
        writeln!(out, "invalid")?;
        Err(CliError::VerificationFailed)
    }
}

fn prompt_new_password() -> Result<String, CliError> {
    eprintln!("Enter password to hash:");
    let password = read_password()?;
    eprintln!("Confirm password:");
    let confirm = read_password()?;
    if password != confirm {
        return Err(CliError::PasswordMismatch);
    }
    Ok(password)
}
