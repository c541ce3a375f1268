use std::fmt;
use std::num::NonZeroU32;
use std::str::FromStr;

use pbkdf2::pbkdf2;
use rand::Rng;

use crate::{HmacSha256, DEFAULT_BCRYPT_COST, DEFAULT_PBKDF2_ITERATIONS};

const PBKDF2_PREFIX: &str = "pbkdf2-sha256";
const PBKDF2_SALT_LEN: usize = 16;
const PBKDF2_KEY_LEN: usize = 32;
const BCRYPT_MIN_COST: u32 = 4;
const BCRYPT_MAX_COST: u32 = 31;
/// bcrypt only reads this many bytes of the password
pub const BCRYPT_MAX_PASSWORD_BYTES: usize = 72;
pub const PBKDF2_MAX_ITERATIONS: u32 = 10_000_000;

/// Errors raised by the hashing collaborators
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HashError {
    InvalidCost { scheme: HashScheme, cost: u32 },
    PasswordTooLong { max: usize, actual: usize },
    UnknownScheme(String),
    MalformedHash(String),
    Backend(String),
}

impl fmt::Display for HashError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HashError::InvalidCost { scheme, cost } => {
                write!(f, "cost {} is not allowed for {}", cost, scheme)
            }
            HashError::PasswordTooLong { max, actual } => write!(
                f,
                "password is {} bytes, the hash scheme only uses the first {}",
                actual, max
            ),
            HashError::UnknownScheme(name) => write!(f, "unknown hash scheme: {}", name),
            HashError::MalformedHash(msg) => write!(f, "malformed hash: {}", msg),
            HashError::Backend(msg) => write!(f, "hashing failed: {}", msg),
        }
    }
}

impl std::error::Error for HashError {}

impl From<bcrypt::BcryptError> for HashError {
    fn from(error: bcrypt::BcryptError) -> Self {
        HashError::Backend(error.to_string())
    }
}

/// Supported credential hashing schemes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HashScheme {
    Bcrypt,
    Pbkdf2,
}

impl HashScheme {
    pub fn as_str(&self) -> &'static str {
        match self {
            HashScheme::Bcrypt => "bcrypt",
            HashScheme::Pbkdf2 => "pbkdf2",
        }
    }

    /// Work factor used when none is configured
    pub fn default_cost(&self) -> u32 {
        match self {
            HashScheme::Bcrypt => DEFAULT_BCRYPT_COST,
            HashScheme::Pbkdf2 => DEFAULT_PBKDF2_ITERATIONS,
        }
    }
}

impl fmt::Display for HashScheme {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for HashScheme {
    type Err = HashError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bcrypt" => Ok(HashScheme::Bcrypt),
            "pbkdf2" | "pbkdf2-sha256" => Ok(HashScheme::Pbkdf2),
            other => Err(HashError::UnknownScheme(other.to_string())),
        }
    }
}

/// One-way, salted credential transform with a tunable work factor.
pub trait PasswordHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError>;
    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError>;
    fn scheme(&self) -> HashScheme;
}

/// bcrypt, modular-crypt `$2b$` output
#[derive(Debug, Clone)]
pub struct BcryptHasher {
    cost: u32,
}

impl BcryptHasher {
    pub fn new(cost: u32) -> Result<Self, HashError> {
        if !(BCRYPT_MIN_COST..=BCRYPT_MAX_COST).contains(&cost) {
            return Err(HashError::InvalidCost {
                scheme: HashScheme::Bcrypt,
                cost,
            });
        }
        Ok(Self { cost })
    }

    pub fn cost(&self) -> u32 {
        self.cost
    }
}

impl Default for BcryptHasher {
    fn default() -> Self {
        Self {
            cost: DEFAULT_BCRYPT_COST,
        }
    }
}

impl PasswordHasher for BcryptHasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        // Longer inputs would be truncated, so distinct passwords could share a hash
        if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
            return Err(HashError::PasswordTooLong {
                max: BCRYPT_MAX_PASSWORD_BYTES,
                actual: plaintext.len(),
            });
        }
        Ok(bcrypt::hash(plaintext, self.cost)?)
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        if plaintext.len() > BCRYPT_MAX_PASSWORD_BYTES {
            return Ok(false);
        }
        bcrypt::verify(plaintext, hash).map_err(|e| HashError::MalformedHash(e.to_string()))
    }

    fn scheme(&self) -> HashScheme {
        HashScheme::Bcrypt
    }
}

/// PBKDF2-HMAC-SHA256 with a random per-hash salt.
///
/// Encoded as `pbkdf2-sha256$<iterations>$<salt hex>$<key hex>` so that
/// verification does not depend on the hasher's own iteration setting.
#[derive(Debug, Clone)]
pub struct Pbkdf2Hasher {
    iterations: NonZeroU32,
}

impl Pbkdf2Hasher {
    pub fn new(iterations: u32) -> Result<Self, HashError> {
        let invalid = HashError::InvalidCost {
            scheme: HashScheme::Pbkdf2,
            cost: iterations,
        };
        if iterations > PBKDF2_MAX_ITERATIONS {
            return Err(invalid);
        }
        let iterations = NonZeroU32::new(iterations).ok_or(invalid)?;
        Ok(Self { iterations })
    }

    pub fn iterations(&self) -> u32 {
        self.iterations.get()
    }
}

impl Default for Pbkdf2Hasher {
    fn default() -> Self {
        Self {
            iterations: NonZeroU32::new(DEFAULT_PBKDF2_ITERATIONS).unwrap_or(NonZeroU32::MIN),
        }
    }
}

impl PasswordHasher for Pbkdf2Hasher {
    fn hash(&self, plaintext: &str) -> Result<String, HashError> {
        let salt = generate_random_salt();
        let key = derive_key_from_passphrase(plaintext, &salt, self.iterations.get());
        Ok(format!(
            "{}${}${}${}",
            PBKDF2_PREFIX,
            self.iterations,
            hex::encode(&salt),
            hex::encode(key)
        ))
    }

    fn verify(&self, plaintext: &str, hash: &str) -> Result<bool, HashError> {
        let parts: Vec<&str> = hash.split('$').collect();
        if parts.len() != 4 || parts[0] != PBKDF2_PREFIX {
            return Err(HashError::MalformedHash(
                "expected pbkdf2-sha256$<iterations>$<salt>$<key>".to_string(),
            ));
        }

        let iterations: u32 = parts[1]
            .parse()
            .map_err(|_| HashError::MalformedHash(format!("bad iteration count: {}", parts[1])))?;
        if iterations == 0 || iterations > PBKDF2_MAX_ITERATIONS {
            return Err(HashError::MalformedHash(format!(
                "iteration count {} outside 1..={}",
                iterations, PBKDF2_MAX_ITERATIONS
            )));
        }
        let salt = hex::decode(parts[2])
            .map_err(|e| HashError::MalformedHash(format!("failed to decode salt: {}", e)))?;
        let stored_key = hex::decode(parts[3])
            .map_err(|e| HashError::MalformedHash(format!("failed to decode key: {}", e)))?;

        let test_key = derive_key_from_passphrase(plaintext, &salt, iterations);
        Ok(constant_time_eq(&test_key, &stored_key))
    }

    fn scheme(&self) -> HashScheme {
        HashScheme::Pbkdf2
    }
}

/// Hasher selection, built once from configuration
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HashConfig {
    pub scheme: HashScheme,
    pub cost: Option<u32>,
}

impl Default for HashConfig {
    fn default() -> Self {
        Self {
            scheme: HashScheme::Bcrypt,
            cost: None,
        }
    }
}

impl HashConfig {
    pub fn effective_cost(&self) -> u32 {
        self.cost.unwrap_or_else(|| self.scheme.default_cost())
    }

    pub fn build(&self) -> Result<Box<dyn PasswordHasher>, HashError> {
        let cost = self.effective_cost();
        Ok(match self.scheme {
            HashScheme::Bcrypt => Box::new(BcryptHasher::new(cost)?),
            HashScheme::Pbkdf2 => Box::new(Pbkdf2Hasher::new(cost)?),
        })
    }
}

/// Identify the scheme of a stored hash from its prefix
pub fn detect_scheme(hash: &str) -> Option<HashScheme> {
    if ["$2a$", "$2b$", "$2x$", "$2y$"]
        .iter()
        .any(|p| hash.starts_with(p))
    {
        Some(HashScheme::Bcrypt)
    } else if hash.starts_with(PBKDF2_PREFIX) {
        Some(HashScheme::Pbkdf2)
    } else {
        None
    }
}

/// Verify a plaintext against a stored hash of either supported scheme
pub fn verify_password(plaintext: &str, hash: &str) -> Result<bool, HashError> {
    match detect_scheme(hash) {
        Some(HashScheme::Bcrypt) => BcryptHasher::default().verify(plaintext, hash),
        Some(HashScheme::Pbkdf2) => Pbkdf2Hasher::default().verify(plaintext, hash),
        None => Err(HashError::MalformedHash(
            "unrecognised hash format".to_string(),
        )),
    }
}

/// Function to generate a random salt for PBKDF2
pub fn generate_random_salt() -> Vec<u8> {
    let mut rng = rand::thread_rng();
    (0..PBKDF2_SALT_LEN).map(|_| rng.gen()).collect()
}

/// Function to derive a 32-byte key from the passphrase using PBKDF2
pub fn derive_key_from_passphrase(passphrase: &str, salt: &[u8], iterations: u32) -> Vec<u8> {
    let mut key = vec![0u8; PBKDF2_KEY_LEN];
    pbkdf2::<HmacSha256>(passphrase.as_bytes(), salt, iterations, &mut key);
    key
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
