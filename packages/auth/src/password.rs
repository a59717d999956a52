//! Password hashing with PBKDF2-HMAC-SHA256.
//!
//! Stored form: `pbkdf2-sha256$<rounds>$<salt hex>$<hash hex>`.

const SCHEME: &str = "pbkdf2-sha256";

/// Iteration count for new hashes.
pub const PBKDF2_ROUNDS: u32 = 100_000;

/// Hashes `password` with a fresh random salt.
#[must_use]
pub fn hash_password(password: &str) -> String {
    let salt = *uuid::Uuid::new_v4().as_bytes();
    let hash = derive(password, &salt, PBKDF2_ROUNDS);
    format!(
        "{SCHEME}${PBKDF2_ROUNDS}${}${}",
        hex::encode(salt),
        hex::encode(hash)
    )
}

/// Checks `password` against a stored hash. Malformed hashes never verify.
#[must_use]
pub fn verify_password(password: &str, stored: &str) -> bool {
    let mut parts = stored.split('$');
    let (Some(SCHEME), Some(rounds), Some(salt), Some(expected), None) = (
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
        parts.next(),
    ) else {
        return false;
    };

    let (Ok(rounds), Ok(salt), Ok(expected)) =
        (rounds.parse::<u32>(), hex::decode(salt), hex::decode(expected))
    else {
        return false;
    };
    if rounds == 0 {
        return false;
    }

    constant_time_eq(&derive(password, &salt, rounds), &expected)
}

fn derive(password: &str, salt: &[u8], rounds: u32) -> [u8; 32] {
    pbkdf2::pbkdf2_hmac_array::<sha2::Sha256, 32>(password.as_bytes(), salt, rounds)
}

fn constant_time_eq(a: &[u8], b: &[u8]) -> bool {
    a.len() == b.len() && a.iter().zip(b).fold(0u8, |acc, (x, y)| acc | (x ^ y)) == 0
}
