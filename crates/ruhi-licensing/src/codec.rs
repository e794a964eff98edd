//! License encoding: base64 over UTF-8 JSON.

use crate::types::LicenseRecord;
use base64::Engine;
use base64::alphabet;
use base64::engine::{DecodePaddingMode, GeneralPurpose, GeneralPurposeConfig};
use ruhi_core::{Error, Result, rolling_hash};

/// Signature over the record fields and the application id.
pub fn license_signature(key: &str, issued: i64, expires: i64, app_id: &str) -> String {
    rolling_hash(&format!("{}{}{}{}", key, issued, expires, app_id))
}

/// Encode a record for distribution.
pub fn encode_license(record: &LicenseRecord) -> Result<String> {
    let json = serde_json::to_vec(record)?;
    Ok(base64::engine::general_purpose::STANDARD.encode(json))
}

/// Standard alphabet, padding optional on decode.
const LENIENT: GeneralPurpose = GeneralPurpose::new(
    &alphabet::STANDARD,
    GeneralPurposeConfig::new().with_decode_padding_mode(DecodePaddingMode::Indifferent),
);

/// Decode a distributed license string.
///
/// Accepts padded or unpadded input in either the standard or URL-safe
/// alphabet, and ignores embedded whitespace from pasting. Any failure
/// (base64, UTF-8, JSON shape) is reported as [`Error::InvalidLicenseFormat`].
pub fn decode_license(encoded: &str) -> Result<LicenseRecord> {
    let normalized: String = encoded
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            c => c,
        })
        .collect();
    let bytes = LENIENT
        .decode(normalized)
        .map_err(|_| Error::InvalidLicenseFormat)?;
    let json = String::from_utf8(bytes).map_err(|_| Error::InvalidLicenseFormat)?;
    serde_json::from_str(&json).map_err(|_| Error::InvalidLicenseFormat)
}
