//! ID generation utilities.

use ulid::Ulid;
use uuid::Uuid;

/// ID generator for entities and session tokens.
#[derive(Debug, Clone, Default)]
pub struct IdGenerator {
    _private: (),
}

impl IdGenerator {
    /// Create a new ID generator.
    #[must_use]
    pub const fn new() -> Self {
        Self { _private: () }
    }

    /// Generate a new ULID-based ID.
    ///
    /// ULIDs sort by creation millisecond, which keeps primary keys roughly
    /// in insertion order.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate an opaque session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component in session tokens
        Uuid::new_v4().simple().to_string()
    }

    /// Generate a short random suffix for de-duplicating file names.
    #[must_use]
    pub fn generate_suffix(&self) -> String {
        let mut token = self.generate_token();
        token.truncate(7);
        token
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_generate_ulid() {
        let id_gen = IdGenerator::new();
        let id1 = id_gen.generate();
        let id2 = id_gen.generate();

        assert_eq!(id1.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_token() {
        let token = IdGenerator::new().generate_token();
        assert_eq!(token.len(), 32);
    }

    #[test]
    fn test_generate_suffix() {
        let suffix = IdGenerator::new().generate_suffix();
        assert_eq!(suffix.len(), 7);
        assert!(suffix.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
