//! Shared key generation for storage backends.
//!
//! Key format: `uploads/{user_id}/{filename}` for user uploads and
//! `generated/{filename}` for regenerated documents. User ids come from the
//! identity provider and may contain characters that are unsafe in object
//! keys, so they are percent-encoded.

/// Generate a storage key for a user upload.
pub fn upload_key(user_id: &str, filename: &str) -> String {
    format!("uploads/{}/{}", urlencoding::encode(user_id), filename)
}

/// Generate a storage key for a regenerated document.
pub fn generated_key(filename: &str) -> String {
    format!("generated/{}", filename)
}

/// Strip path components and control characters from a client-supplied
/// display name so it is safe to embed in a key.
pub fn sanitize_filename(name: &str) -> String {
    let base = name.rsplit(['/', '\\']).next().unwrap_or(name);
    let cleaned: String = base
        .chars()
        .filter(|c| !c.is_control())
        .map(|c| if c == ' ' { '_' } else { c })
        .collect();
    if cleaned.is_empty() {
        "file".to_string()
    } else {
        cleaned
    }
}
