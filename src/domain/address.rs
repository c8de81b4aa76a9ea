//! Chain address validation.
//!
//! Accepts the same inputs as the usual wallet tooling: 40 hex digits
//! with an optional `0x` prefix, in all-lowercase, all-uppercase, or
//! EIP-55 checksummed form. Mixed case with a bad checksum is rejected.

use alloy::primitives::Address;

use super::error::RelevanceError;

/// Parse a chain address, returning `None` if it is not well formed.
pub fn parse_address(raw: &str) -> Option<Address> {
    let hex = raw.strip_prefix("0x").unwrap_or(raw);
    if hex.len() != 40 || !hex.bytes().all(|b| b.is_ascii_hexdigit()) {
        return None;
    }

    let prefixed = format!("0x{hex}");
    let has_lower = hex.bytes().any(|b| b.is_ascii_lowercase());
    let has_upper = hex.bytes().any(|b| b.is_ascii_uppercase());

    if has_lower && has_upper {
        Address::parse_checksummed(&prefixed, None).ok()
    } else {
        prefixed.parse().ok()
    }
}

/// Parse a caller-supplied wallet address.
pub fn parse_wallet_address(raw: &str) -> Result<Address, RelevanceError> {
    parse_address(raw).ok_or_else(|| RelevanceError::InvalidAddress(raw.to_string()))
}
