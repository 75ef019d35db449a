// Utility functions for credential generation and logging

use rand::RngCore;

/// `len` random bytes from the thread-local CSPRNG, hex encoded.
pub fn token_hex(len: usize) -> String {
    let mut bytes = vec![0u8; len];
    rand::thread_rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Mask a credential for log output, keeping the prefix and last four characters.
pub fn mask_key(key: &str) -> String {
    let visible_end = 4;
    let visible_start = key.find('_').map(|i| i + 1).unwrap_or(0);

    if key.len() <= visible_start + visible_end || !key.is_ascii() {
        return "*".repeat(key.chars().count().min(8));
    }

    let masked_len = key.len() - visible_start - visible_end;

    format!(
        "{}{}{}",
        &key[..visible_start],
        "*".repeat(masked_len),
        &key[key.len() - visible_end..]
    )
}
