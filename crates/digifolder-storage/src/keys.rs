//! Shared key generation for storage backends.
//!
//! Key format: `{user_id}/{timestamp_ms}_{upload_id}_{file_name}`, where
//! `upload_id` is a fresh simple-form UUID so that two uploads of the same
//! name never share an object.

use uuid::Uuid;

use crate::traits::{StorageError, StorageResult};

/// Strip path components and traversal sequences from a user supplied name.
pub fn sanitize_file_name(file_name: &str) -> String {
    let last = file_name
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or(file_name)
        .replace("..", "");
    let trimmed = last.trim();
    if trimmed.is_empty() {
        "file".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Generate a storage key for the given owner, upload time and file name.
///
/// Every call returns a distinct key, even for identical arguments.
pub fn generate_storage_key(user_id: Uuid, timestamp_ms: i64, file_name: &str) -> String {
    format!(
        "{}/{}_{}_{}",
        user_id,
        timestamp_ms,
        Uuid::new_v4().simple(),
        sanitize_file_name(file_name)
    )
}

/// Reject keys that could address anything outside the store's namespace.
///
/// Backends call this before touching an object, so a key that never came
/// from [`generate_storage_key`] is refused the same way everywhere.
pub fn validate_key(storage_key: &str) -> StorageResult<()> {
    let invalid = |reason: &str| {
        Err(StorageError::InvalidKey(format!("{} ({})", reason, storage_key)))
    };

    if storage_key.trim().is_empty() {
        return invalid("empty key");
    }
    if storage_key.starts_with('/') || storage_key.contains('\\') {
        return invalid("absolute or platform-specific path");
    }
    if storage_key
        .split('/')
        .any(|segment| segment.is_empty() || segment == "." || segment.contains(".."))
    {
        return invalid("empty or traversal segment");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generated_keys_validate() {
        let key = generate_storage_key(Uuid::new_v4(), 1, "../scan 1.pdf");
        assert!(validate_key(&key).is_ok());
    }

    #[test]
    fn test_unsafe_keys_rejected() {
        for key in ["", "/etc/passwd", "a/../b", "a//b", "a\\b", "./a", "a/"] {
            assert!(
                matches!(validate_key(key), Err(StorageError::InvalidKey(_))),
                "{key:?} should be rejected"
            );
        }
    }

    #[test]
    fn test_key_is_namespaced_by_user() {
        let user = Uuid::new_v4();
        let key = generate_storage_key(user, 1700000000000, "notes.txt");
        let (owner, object) = key.split_once('/').unwrap();
        assert_eq!(owner, user.to_string());
        assert!(object.starts_with("1700000000000_"));
        assert!(object.ends_with("_notes.txt"));
        assert_eq!(object.len(), "1700000000000_".len() + 32 + "_notes.txt".len());
    }

    #[test]
    fn test_same_name_same_instant_gets_distinct_keys() {
        let user = Uuid::new_v4();
        let first = generate_storage_key(user, 42, "notes.doc");
        let second = generate_storage_key(user, 42, "notes.doc");
        assert_ne!(first, second);
    }

    #[test]
    fn test_traversal_is_stripped() {
        assert_eq!(sanitize_file_name("../../etc/passwd"), "passwd");
        assert_eq!(sanitize_file_name("a\\b\\..c.pdf"), "c.pdf");
        assert_eq!(sanitize_file_name(".."), "file");
        assert_eq!(sanitize_file_name("  "), "file");
    }
}
