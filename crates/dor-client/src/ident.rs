//! Local identifier minting.

use uuid::Uuid;

use dor_types::Pid;

use crate::error::{ClientError, ClientResult};

/// Mint a namespace-qualified identifier from a version-4 UUID.
///
/// The UUID is generated locally from 122 random bits; collisions are
/// possible but astronomically unlikely and are not checked against the
/// server.
pub fn uuid_identifier(namespace: &str) -> ClientResult<Pid> {
    let uuid = from_random_bytes(rand::random());
    Pid::from_parts(namespace, &uuid).map_err(ClientError::from)
}

/// Build the canonical hyphenated form from raw random bytes. The builder
/// forces the version nibble to 4 and the variant bits to `10`.
fn from_random_bytes(bytes: [u8; 16]) -> String {
    let uuid: Uuid = uuid::Builder::from_random_bytes(bytes).into_uuid();
    uuid.hyphenated().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn identifier_joins_namespace() {
        let pid = uuid_identifier("test").unwrap();
        assert_eq!(pid.namespace(), "test");
        assert_eq!(pid.local_id().len(), 36);
    }

    #[test]
    fn invalid_namespace_is_rejected() {
        assert!(uuid_identifier("").is_err());
        assert!(uuid_identifier("a:b").is_err());
    }

    proptest! {
        #[test]
        fn version_and_variant_bits_forced(bytes in any::<[u8; 16]>()) {
            let uuid = from_random_bytes(bytes);
            let chars: Vec<char> = uuid.chars().collect();
            prop_assert_eq!(chars.len(), 36);
            // 8-4-4-4-12 hyphenation.
            for i in [8, 13, 18, 23] {
                prop_assert_eq!(chars[i], '-');
            }
            // Version nibble is always 4.
            prop_assert_eq!(chars[14], '4');
            // Variant: top two bits of the 17th hex digit are 10.
            prop_assert!(matches!(chars[19], '8' | '9' | 'a' | 'b'));
        }
    }
}
