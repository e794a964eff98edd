//! Display obfuscation.
//!
//! `obfuscate(s) = rot13(base64(s))`. This is an encoding, not encryption:
//! anyone holding the output can reverse it by inspection. It exists only to
//! keep values from being readable at a glance in logs and UI.

use crate::{Error, Result};
use base64::Engine;
use rand::Rng;
use rand::seq::SliceRandom;

/// Encode `input` as ROT13 over its base64 representation.
pub fn obfuscate(input: &str) -> String {
    let encoded = base64::engine::general_purpose::STANDARD.encode(input.as_bytes());
    rot13(&encoded)
}

/// Exact inverse of [`obfuscate`].
pub fn deobfuscate(input: &str) -> Result<String> {
    let decoded = base64::engine::general_purpose::STANDARD
        .decode(rot13(input))
        .map_err(|e| Error::Encoding(format!("Invalid base64: {}", e)))?;
    String::from_utf8(decoded).map_err(|e| Error::Encoding(format!("Invalid UTF-8: {}", e)))
}

/// Shuffle the characters of `input`. Not invertible.
pub fn scramble<R: Rng + ?Sized>(input: &str, rng: &mut R) -> String {
    let mut chars: Vec<char> = input.chars().collect();
    chars.shuffle(rng);
    chars.into_iter().collect()
}

fn rot13(input: &str) -> String {
    input
        .chars()
        .map(|c| match c {
            'a'..='z' => (((c as u8 - b'a') + 13) % 26 + b'a') as char,
            'A'..='Z' => (((c as u8 - b'A') + 13) % 26 + b'A') as char,
            _ => c,
        })
        .collect()
}
