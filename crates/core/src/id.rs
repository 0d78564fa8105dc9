//! Snapshot identifiers and repository slugs.

use rand::RngCore;

use crate::Error;

/// Longest identifier accepted from callers.
const MAX_ID_LEN: usize = 64;

/// Generate a fresh snapshot id: 128 random bits, hex-encoded.
///
/// No uniqueness check against the store is made.
pub fn generate_snapshot_id() -> String {
    let mut bytes = [0u8; 16];
    rand::rng().fill_bytes(&mut bytes);
    hex::encode(bytes)
}

/// Check an id supplied by a caller before it reaches a path or a table key.
pub fn validate_snapshot_id(id: &str) -> Result<&str, Error> {
    if id.is_empty() {
        return Err(Error::Validation("snapshot id must not be empty".into()));
    }
    if id.len() > MAX_ID_LEN {
        return Err(Error::Validation(format!("snapshot id too long: {} chars (max {MAX_ID_LEN})", id.len())));
    }
    if !id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Err(Error::Validation(format!("snapshot id must be alphanumeric: {id:?}")));
    }
    Ok(id)
}

/// Validate a slug (letters, numbers, `-` and `_`) and lowercase it.
pub fn validate_slug(raw: &str) -> Result<String, Error> {
    if raw.is_empty() || !raw.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(Error::Validation(format!(
            "a valid non-empty slug is required (letters, numbers, -, and _): {raw:?}"
        )));
    }
    Ok(raw.to_ascii_lowercase())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_id_format() {
        let id = generate_snapshot_id();
        assert_eq!(id.len(), 32);
        assert!(id.chars().all(|c| c.is_ascii_hexdigit()));
        assert!(validate_snapshot_id(&id).is_ok());
    }

    #[test]
    fn test_generated_ids_differ() {
        assert_ne!(generate_snapshot_id(), generate_snapshot_id());
    }

    #[test]
    fn test_validate_snapshot_id() {
        assert!(validate_snapshot_id("abc123").is_ok());
        assert!(validate_snapshot_id("").is_err());
        assert!(validate_snapshot_id("../etc").is_err());
        assert!(validate_snapshot_id("a/b").is_err());
        assert!(validate_snapshot_id(&"a".repeat(65)).is_err());
    }

    #[test]
    fn test_validate_slug() {
        assert_eq!(validate_slug("My-Repo_2").unwrap(), "my-repo_2");
        assert!(matches!(validate_slug(""), Err(Error::Validation(_))));
        assert!(validate_slug("has space").is_err());
        assert!(validate_slug("dot.ted").is_err());
    }
}
