//! String hashing.
//!
//! Two algorithms with different jobs:
//!
//! - [`rolling_hash`] is the short, fast, non-adversarial 32-bit polynomial
//!   hash used for fingerprints, license signatures and the display checksum.
//! - [`sha256_hex`] is used only for build artifact integrity.

use sha2::{Digest, Sha256};

/// 32-bit polynomial hash (`h = h * 31 + c`, wrapping) rendered as the
/// absolute value in base 36.
///
/// Characters are consumed as UTF-16 code units so that values agree with
/// licenses and fingerprints issued by existing deployments.
pub fn rolling_hash(input: &str) -> String {
    let hash = input.encode_utf16().fold(0i32, |hash, unit| {
        hash.wrapping_mul(31).wrapping_add(i32::from(unit))
    });
    to_base36(i64::from(hash).unsigned_abs())
}

/// Lowercase hex SHA-256 digest of the UTF-8 bytes of `input`.
pub fn sha256_hex(input: &str) -> String {
    sha256_bytes_hex(input.as_bytes())
}

/// Lowercase hex SHA-256 digest of raw bytes.
pub fn sha256_bytes_hex(input: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(input);
    hex::encode(hasher.finalize())
}

/// Hash identifying where the application runs: `hostname|mode|app_id`.
///
/// Hosts without a display surface report the hostname `server`.
pub fn environment_hash(hostname: Option<&str>, mode: &str, app_id: &str) -> String {
    let data = [hostname.unwrap_or("server"), mode, app_id].join("|");
    rolling_hash(&data)
}

/// Lowercase base-36 rendering of `value`.
pub fn to_base36(mut value: u64) -> String {
    const DIGITS: &[u8; 36] = b"0123456789abcdefghijklmnopqrstuvwxyz";

    if value == 0 {
        return "0".to_string();
    }

    let mut out = Vec::with_capacity(7);
    while value > 0 {
        out.push(DIGITS[(value % 36) as usize]);
        value /= 36;
    }
    out.reverse();
    String::from_utf8(out).unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rolling_hash_empty() {
        assert_eq!(rolling_hash(""), "0");
    }

    #[test]
    fn test_rolling_hash_known_values() {
        // "a" = 97 -> "2p"; "ab" = 97 * 31 + 98 = 3105 -> "2e9"
        assert_eq!(rolling_hash("a"), "2p");
        assert_eq!(rolling_hash("ab"), "2e9");
    }

    #[test]
    fn test_rolling_hash_deterministic() {
        let input = "ruhi-8f3a2c1d";
        assert_eq!(rolling_hash(input), rolling_hash(input));
        assert_ne!(rolling_hash(input), rolling_hash("ruhi-8f3a2c1e"));
    }

    #[test]
    fn test_rolling_hash_wraps_and_takes_absolute_value() {
        let long = "x".repeat(1000);
        let hash = rolling_hash(&long);
        assert!(hash.chars().all(|c| c.is_ascii_digit() || c.is_ascii_lowercase()));
        // |i32::MIN| in base 36
        assert_eq!(to_base36(2_147_483_648), "zik0zk");
    }

    #[test]
    fn test_rolling_hash_uses_utf16_units() {
        // U+1F600 is a surrogate pair in UTF-16, so it hashes as two units.
        let expected = {
            let hi = 0xD83Di32;
            let lo = 0xDE00i32;
            to_base36(i64::from(hi.wrapping_mul(31).wrapping_add(lo)).unsigned_abs())
        };
        assert_eq!(rolling_hash("\u{1F600}"), expected);
    }

    #[test]
    fn test_sha256_hex() {
        assert_eq!(
            sha256_hex(""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
        assert_eq!(
            sha256_hex("abc"),
            "ba7816bf8f01cfea414140de5dae2223b00361a396177a9cb410ff61f20015ad"
        );
    }

    #[test]
    fn test_environment_hash_inputs() {
        let server = environment_hash(None, "production", "ruhi");
        assert_eq!(server, rolling_hash("server|production|ruhi"));
        assert_ne!(server, environment_hash(Some("localhost"), "production", "ruhi"));
        assert_ne!(server, environment_hash(None, "development", "ruhi"));
        assert_ne!(server, environment_hash(None, "production", "other"));
    }
}
