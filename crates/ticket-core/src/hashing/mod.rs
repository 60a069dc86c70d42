//! Hashing y canonicalización JSON para huellas de plantillas y snapshots.

pub mod canonical_json;
pub mod hash;

pub use canonical_json::to_canonical_json;
pub use hash::{hash_str, hash_value, snapshot_digest, template_hash};
