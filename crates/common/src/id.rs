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
    /// ULIDs are lexicographically sortable by creation time, which lets
    /// the id act as a tiebreaker for posts created in the same instant.
    #[must_use]
    pub fn generate(&self) -> String {
        Ulid::new().to_string().to_lowercase()
    }

    /// Generate a random session token.
    #[must_use]
    pub fn generate_token(&self) -> String {
        // No time component in session tokens
        Uuid::new_v4().simple().to_string()
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
        assert_eq!(id2.len(), 26);
        assert_ne!(id1, id2);
        assert_eq!(id1, id1.to_lowercase());
    }

    #[test]
    fn test_generate_token() {
        let id_gen = IdGenerator::new();
        let token = id_gen.generate_token();

        assert_eq!(token.len(), 32);
        assert_ne!(token, id_gen.generate_token());
    }
}
