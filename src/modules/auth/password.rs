use std::fmt;
use std::io;

use crate::MIN_PASSWORD_LENGTH;

/// Reasons a plaintext credential is refused before it reaches the hasher
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PasswordError {
    TooShort { min: usize, actual: usize },
}

impl fmt::Display for PasswordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PasswordError::TooShort { min, actual } => write!(
                f,
                "password must be at least {} characters long (got {})",
                min, actual
            ),
        }
    }
}

impl std::error::Error for PasswordError {}

/// Function to validate a credential against the admin password policy.
/// Length is counted in characters, not bytes.
pub fn validate_password(password: &str) -> Result<(), PasswordError> {
    let actual = password.chars().count();
    if actual < MIN_PASSWORD_LENGTH {
        return Err(PasswordError::TooShort {
            min: MIN_PASSWORD_LENGTH,
            actual,
        });
    }
    Ok(())
}

/// Helper function to read a password securely
pub fn read_password() -> io::Result<String> {
    rpassword::read_password()
}
