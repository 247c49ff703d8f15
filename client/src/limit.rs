//! Human-readable size limit parsing
//!
//! Accepts quantities like `1MB`, `512kb`, or `1.5 GB`, with 1024-based
//! units, matching what upload size limits are usually written as.

use crate::error::{UploadError, UploadResult};

/// Parses a human-readable byte quantity into bytes.
///
/// Supported units: `b`, `kb`, `mb`, `gb`, `tb` (case and surrounding
/// whitespace insensitive); a bare number is taken as bytes. Fractional
/// values are truncated to whole bytes.
///
/// # Errors
///
/// Returns [`UploadError::InvalidSizeLimit`] when the number or the unit
/// cannot be parsed.
pub fn parse_size_limit(input: &str) -> UploadResult<u64> {
    let trimmed = input.trim();
    let unit_start = trimmed
        .find(|c: char| !c.is_ascii_digit() && c != '.')
        .unwrap_or(trimmed.len());
    let (number, unit) = trimmed.split_at(unit_start);

    let value: f64 = number
        .parse()
        .map_err(|_| UploadError::InvalidSizeLimit(input.to_owned()))?;
    if !value.is_finite() || value < 0.0 {
        return Err(UploadError::InvalidSizeLimit(input.to_owned()));
    }

    let multiplier: f64 = match unit.trim().to_ascii_lowercase().as_str() {
        "" | "b" => 1.0,
        "kb" => 1024.0,
        "mb" => 1024.0 * 1024.0,
        "gb" => 1024.0 * 1024.0 * 1024.0,
        "tb" => 1024.0 * 1024.0 * 1024.0 * 1024.0,
        _ => return Err(UploadError::InvalidSizeLimit(input.to_owned())),
    };

    #[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
    let bytes = (value * multiplier) as u64;
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_numbers_are_bytes() {
        assert_eq!(parse_size_limit("100").unwrap(), 100);
        assert_eq!(parse_size_limit("0").unwrap(), 0);
    }

    #[test]
    fn units_are_1024_based() {
        assert_eq!(parse_size_limit("1KB").unwrap(), 1024);
        assert_eq!(parse_size_limit("1MB").unwrap(), 1024 * 1024);
        assert_eq!(parse_size_limit("1GB").unwrap(), 1024 * 1024 * 1024);
        assert_eq!(parse_size_limit("2TB").unwrap(), 2 * 1024_u64.pow(4));
    }

    #[test]
    fn case_and_whitespace_are_ignored() {
        assert_eq!(parse_size_limit(" 512kb ").unwrap(), 512 * 1024);
        assert_eq!(parse_size_limit("5 MB").unwrap(), 5 * 1024 * 1024);
    }

    #[test]
    fn fractional_quantities_truncate() {
        assert_eq!(parse_size_limit("1.5MB").unwrap(), 1_572_864);
        assert_eq!(parse_size_limit("0.5KB").unwrap(), 512);
    }

    #[test]
    fn garbage_is_rejected() {
        assert!(parse_size_limit("").is_err());
        assert!(parse_size_limit("MB").is_err());
        assert!(parse_size_limit("ten MB").is_err());
        assert!(parse_size_limit("1XB").is_err());
        assert!(parse_size_limit("-1MB").is_err());
        assert!(parse_size_limit("1.2.3MB").is_err());
    }
}
