pub mod hasher;
pub mod password;

// Re-export the main types and functions
pub use hasher::{
    detect_scheme, verify_password, BcryptHasher, HashConfig, HashError, HashScheme,
    PasswordHasher, Pbkdf2Hasher,
};
pub use password::{read_password, validate_password, PasswordError};
