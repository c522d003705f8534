use serde::{Deserialize, Serialize};

/// A stored license key.
///
/// `id` is allocated by the store on insert from a persistent counter and is
/// never reused while the table lives, even after deletes. `key` is the
/// opaque license material — duplicates are permitted and values are never
/// mutated in place (create, read, delete only).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseKey {
    pub id: i64,
    pub key: String,
}
