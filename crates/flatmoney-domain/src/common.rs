//! Helpers shared by ledger entities.

/// Generates a fresh opaque identifier for a new entity.
pub fn new_entity_id() -> String {
    uuid::Uuid::new_v4().to_string()
}
