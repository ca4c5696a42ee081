use sha2::{Digest, Sha256};
use uuid::Uuid;

/// Chained SHA-256 rounds per digest
const ROUNDS: u32 = 100_000;

/// Salted password digest as stored in the `users` table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PasswordHash {
    pub hash: String,
    pub salt: String,
}

impl PasswordHash {
    /// Hash `password` with a fresh random salt
    pub fn generate(password: &str) -> Self {
        let salt = Uuid::new_v4().simple().to_string();
        let hash = digest(&salt, password);
        Self { hash, salt }
    }

    pub fn verify(&self, password: &str) -> bool {
        constant_time_eq(digest(&self.salt, password).as_bytes(), self.hash.as_bytes())
    }
}

fn digest(salt: &str, password: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(salt.as_bytes());
    hasher.update(b":");
    hasher.update(password.as_bytes());
    let mut state = hasher.finalize();

    for _ in 1..ROUNDS {
        let mut hasher = Sha256::new();
        hasher.update(state);
        hasher.update(password.as_bytes());
        state = hasher.finalize();
    }
    hex::encode(state)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    if a.len() != b.len() {
        return false;
    }
    a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
