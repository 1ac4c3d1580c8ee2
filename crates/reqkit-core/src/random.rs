//! Random identifier generation.

use rand::Rng;

/// Character set for generated identifiers: 64 characters, URL- and
/// filename-safe.
const ALPHABET: &[u8] = b"abcdefghijklmnopqrstuvwxyzABCDEFGHIJKLMNOPQRSTUVXWYZ0123456789_+";

/// Returns a string of `len` characters drawn uniformly from [`ALPHABET`].
///
/// Generated strings double as unguessable file identifiers, so the RNG is
/// the OS-seeded CSPRNG behind `rand::rng()`. Entropy-source exhaustion
/// panics inside `rand` and is treated as a process-level fault; this
/// function has no error path.
pub fn random_string(len: usize) -> String {
    let mut rng = rand::rng();
    (0..len)
        .map(|_| ALPHABET[rng.random_range(0..ALPHABET.len())] as char)
        .collect()
}
