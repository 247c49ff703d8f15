//! Collision-resistant object key generation

use uuid::Uuid;

/// Derives a globally unique object key from a client-supplied filename.
///
/// The key is `<random>-<stem>.<ext>`, where `<random>` is a hyphen-less
/// UUID v4 (122 bits of entropy) and the extension is everything after the
/// last `.` in the original name. Filenames without a dot produce
/// `<random>-<name>` with no extension.
#[must_use]
pub fn generate_object_key(original_name: &str) -> String {
    let id = Uuid::new_v4().simple();
    match original_name.rsplit_once('.') {
        Some((stem, extension)) => format!("{id}-{stem}.{extension}"),
        None => format!("{id}-{original_name}"),
    }
}
