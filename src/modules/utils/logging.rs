use env_logger::{Builder, Env, WriteStyle};
use log::{error, info, LevelFilter, SetLoggerError};

/// Initialize the logging system on stderr.
///
/// `RUST_LOG` wins when set; otherwise the level is `info`, or `debug`
/// with `verbose`.
pub fn initialize_logging(verbose: bool) -> Result<(), SetLoggerError> {
    let default_level = if verbose { LevelFilter::Debug } else { LevelFilter::Info };

    Builder::new()
        .filter_level(default_level)
        .parse_env(Env::default())
        .format_timestamp_secs()
        .format_module_path(true)
        .write_style(WriteStyle::Auto)
        .target(env_logger::Target::Stderr)
        .try_init()
}

/// Helper function to format sensitive data for logging
pub fn format_sensitive(text: &str) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= 4 {
        return "*".repeat(chars.len());
    }
    let head: String = chars[..2].iter().collect();
    let tail: String = chars[chars.len() - 2..].iter().collect();
    format!("{}***{}", head, tail)
}

/// Mask the local part of an email, keep the domain
pub fn mask_email(email: &str) -> String {
    match email.split_once('@') {
        Some((local, domain)) => format!("{}@{}", format_sensitive(local), domain),
        None => format_sensitive(email),
    }
}

/// Structured log line for a provisioning outcome
pub fn log_provision_event(action: &str, email: &str, success: bool, details: Option<&str>) {
    let timestamp = chrono::Local::now().format("%Y-%m-%d %H:%M:%S").to_string();
    if success {
        info!(
            "Provision event: action={}, account={}, success=true, timestamp={}, details={:?}",
            action,
            mask_email(email),
            timestamp,
            details
        );
    } else {
        error!(
            "Provision event: action={}, account={}, success=false, timestamp={}, details={:?}",
            action,
            mask_email(email),
            timestamp,
            details
        );
    }
}
