use alloy_primitives::Address;
use std::str::FromStr;
use thiserror::Error;

#[derive(Error, Debug, PartialEq)]
pub enum ValidationError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(String),

    #[error("Invalid address format: {0}")]
    InvalidAddress(String),
}

/// Canonical stored form of an address: trimmed and lowercased.
pub fn normalize_address(address: &str) -> String {
    address.trim().to_lowercase()
}

/// Accepts any-case `0x`-prefixed 20-byte hex. Checksums are not enforced.
pub fn validate_address(address: &str) -> Result<(), ValidationError> {
    let address = address.trim();
    if address.is_empty() {
        return Err(ValidationError::MissingParameter("address".to_string()));
    }

    let Some(body) = address.strip_prefix("0x").or_else(|| address.strip_prefix("0X")) else {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    };

    if body.len() != 40 || !body.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(ValidationError::InvalidAddress(address.to_string()));
    }

    Ok(())
}

/// EIP-55 checksummed form of an address, if it parses.
pub fn to_checksum_address(address: &str) -> Result<String, ValidationError> {
    validate_address(address)?;
    let parsed = Address::from_str(&normalize_address(address))
        .map_err(|_| ValidationError::InvalidAddress(address.to_string()))?;
    Ok(parsed.to_checksum(None))
}
