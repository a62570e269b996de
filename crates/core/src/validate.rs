//! Input validation for administrator fields and key material

use thiserror::Error;

/// Validation failures; every variant names the offending field
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ValidationError {
    #[error("Invalid email: {0}")]
    InvalidEmail(String),

    #[error("Invalid {field}: {reason}")]
    InvalidName { field: &'static str, reason: String },

    #[error("Invalid wallet address: {0}")]
    InvalidWalletAddress(String),

    #[error("Invalid secret key: {0}")]
    InvalidSecretKey(String),

    #[error("Permission count {count} out of range (must be 1..={max})")]
    InvalidPermissionCount { count: usize, max: usize },
}

const MAX_EMAIL_LEN: usize = 255;
const MAX_NAME_LEN: usize = 50;

/// Check an email address: one `@`, non-empty parts, dotted domain, length cap
pub fn validate_email(email: &str) -> Result<(), ValidationError> {
    if email.is_empty() || email.len() > MAX_EMAIL_LEN {
        return Err(ValidationError::InvalidEmail(format!(
            "length must be 1..={MAX_EMAIL_LEN}"
        )));
    }

    let mut parts = email.splitn(2, '@');
    let local = parts.next().unwrap_or("");
    let domain = parts.next().unwrap_or("");

    if local.is_empty() || domain.is_empty() || domain.contains('@') {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    if !domain.contains('.') || domain.starts_with('.') || domain.ends_with('.') {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }
    if email.chars().any(char::is_whitespace) {
        return Err(ValidationError::InvalidEmail(email.to_string()));
    }

    Ok(())
}

/// Check a first/last name: 1-50 chars, letters/spaces/hyphen/apostrophe
pub fn validate_name(field: &'static str, name: &str) -> Result<(), ValidationError> {
    if name.is_empty() || name.chars().count() > MAX_NAME_LEN {
        return Err(ValidationError::InvalidName {
            field,
            reason: format!("length must be 1..={MAX_NAME_LEN}"),
        });
    }

    let ok = name
        .chars()
        .all(|c| c.is_alphabetic() || c == ' ' || c == '-' || c == '\'');
    if !ok {
        return Err(ValidationError::InvalidName {
            field,
            reason: "only letters, spaces, hyphens and apostrophes allowed".to_string(),
        });
    }

    Ok(())
}

/// Check a wallet/signer address against common address shapes:
/// `0x` + 40 hex chars, 64 hex chars, or 32-44 base58-style alphanumerics.
pub fn validate_wallet_address(address: &str) -> Result<(), ValidationError> {
    let is_hex = |s: &str| !s.is_empty() && s.chars().all(|c| c.is_ascii_hexdigit());

    if let Some(rest) = address.strip_prefix("0x") {
        if rest.len() == 40 && is_hex(rest) {
            return Ok(());
        }
        return Err(ValidationError::InvalidWalletAddress(address.to_string()));
    }

    if address.len() == 64 && is_hex(address) {
        return Ok(());
    }

    if (32..=44).contains(&address.len()) && address.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Ok(());
    }

    Err(ValidationError::InvalidWalletAddress(address.to_string()))
}

/// Check imported secret key material: exactly 64 hex chars (32 bytes)
pub fn validate_secret_key(secret_hex: &str) -> Result<(), ValidationError> {
    if secret_hex.len() != 64 {
        return Err(ValidationError::InvalidSecretKey(
            "secret key must be 64 hex characters".to_string(),
        ));
    }
    hex::decode(secret_hex)
        .map_err(|e| ValidationError::InvalidSecretKey(e.to_string()))?;
    Ok(())
}

/// Check the permission-set cardinality bound (1..=max)
pub fn validate_permission_count(count: usize, max: usize) -> Result<(), ValidationError> {
    if count == 0 || count > max {
        return Err(ValidationError::InvalidPermissionCount { count, max });
    }
    Ok(())
}
