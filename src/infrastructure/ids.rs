//! Identifier generation

use uuid::Uuid;

/// A fresh opaque identifier for a tagset, tag definition, property or instance
pub fn generate_id() -> String {
    format!("TW_{}", Uuid::new_v4().simple().to_string().to_uppercase())
}
