//! Session identifier generation.

use base64::{Engine, engine::general_purpose::URL_SAFE_NO_PAD};
use rand::RngCore;

/// Produces session identifiers.
///
/// Implementations must return identifiers that are unguessable and
/// collision-free in practice. Counters and timestamps alone do not qualify.
/// Any `Fn() -> String + Send + Sync` closure is also a generator.
pub trait KeyGenerator: Send + Sync {
    /// Generate a new, non-empty identifier.
    fn generate(&self) -> String;
}

impl<F> KeyGenerator for F
where
    F: Fn() -> String + Send + Sync,
{
    fn generate(&self) -> String {
        self()
    }
}

/// UUID v4 identifiers, drawn from the OS random source.
#[derive(Debug, Clone, Copy, Default)]
pub struct UuidKeyGenerator;

impl KeyGenerator for UuidKeyGenerator {
    fn generate(&self) -> String {
        uuid::Uuid::new_v4().to_string()
    }
}

/// Number of random bytes in a [`RandomKeyGenerator`] identifier.
pub const RANDOM_KEY_BYTES: usize = 32;

/// 256-bit random identifiers, URL-safe base64 without padding.
#[derive(Debug, Clone, Copy, Default)]
pub struct RandomKeyGenerator;

impl KeyGenerator for RandomKeyGenerator {
    fn generate(&self) -> String {
        let mut bytes = [0u8; RANDOM_KEY_BYTES];
        rand::rng().fill_bytes(&mut bytes);
        URL_SAFE_NO_PAD.encode(bytes)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashSet;

    #[test]
    fn test_uuid_keys_are_distinct() {
        let keys: HashSet<String> = (0..1000).map(|_| UuidKeyGenerator.generate()).collect();
        assert_eq!(keys.len(), 1000);
        assert!(keys.iter().all(|k| uuid::Uuid::parse_str(k).is_ok()));
    }

    #[test]
    fn test_random_keys_are_url_safe() {
        let key = RandomKeyGenerator.generate();
        // 32 bytes -> 43 base64 chars without padding
        assert_eq!(key.len(), 43);
        assert!(
            key.chars()
                .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
        );
        assert_ne!(key, RandomKeyGenerator.generate());
    }

    #[test]
    fn test_closure_generator() {
        let generator = || "fixed-id".to_string();
        assert_eq!(KeyGenerator::generate(&generator), "fixed-id");
    }
}
