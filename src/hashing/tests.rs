//! Content Hash Tests
//!
//! ## Test Scopes
//! - **Hex Codec**: Round trips and rejection of malformed strings.
//! - **Digests**: Known SHA-256 vectors, prefix hashing.
//! - **Serde**: Hex string in JSON, raw bytes in bincode.

#[cfg(test)]
mod tests {
    use crate::error::HashParseError;
    use crate::hashing::types::{ContentHash, DIGEST_LENGTH};
    use std::collections::HashSet;

    const ABCDEF_HEX: &str = "e9c0f8b575cbfcb42ab3b78ecc87efa3b011d9a5d10b09fa4e96f240bf6a82f5";

    // ============================================================
    // HEX CODEC
    // ============================================================

    #[test]
    fn test_hex_round_trip() {
        let hash = ContentHash::digest(b"round trip");

        let restored = ContentHash::from_hex(&hash.to_hex()).unwrap();

        assert_eq!(hash, restored);
        assert_eq!(hash.to_hex().len(), 64);
    }

    #[test]
    fn test_from_hex_accepts_upper_case() {
        let lower = ContentHash::from_hex(ABCDEF_HEX).unwrap();
        let upper = ContentHash::from_hex(&ABCDEF_HEX.to_uppercase()).unwrap();

        assert_eq!(lower, upper);
        // Encoding is always lower case
        assert_eq!(upper.to_hex(), ABCDEF_HEX);
    }

    #[test]
    fn test_from_hex_rejects_wrong_length() {
        let result = ContentHash::from_hex("abcd");

        assert_eq!(result, Err(HashParseError::InvalidLength(4)));
        assert!(ContentHash::from_hex(&format!("{}00", ABCDEF_HEX)).is_err());
    }

    #[test]
    fn test_from_hex_rejects_non_hex_characters() {
        let bad = format!("{}zz", &ABCDEF_HEX[..62]);

        let result = ContentHash::from_hex(&bad);

        assert!(matches!(result, Err(HashParseError::InvalidHex(_))));
    }

    #[test]
    fn test_from_str_matches_from_hex() {
        let parsed: ContentHash = ABCDEF_HEX.parse().unwrap();

        assert_eq!(parsed, ContentHash::from_hex(ABCDEF_HEX).unwrap());
        assert_eq!(parsed.to_string(), ABCDEF_HEX);
    }

    // ============================================================
    // DIGESTS
    // ============================================================

    #[test]
    fn test_digest_known_vector() {
        let hash = ContentHash::digest(b"ABCDEF");

        assert_eq!(hash.to_hex(), ABCDEF_HEX);
    }

    #[test]
    fn test_of_prefix_ignores_trailing_bytes() {
        // The hint cracker hashes a permutation without its last character
        let hash = ContentHash::of_prefix(b"ABCDEFG", 6);

        assert_eq!(hash, ContentHash::digest(b"ABCDEF"));
    }

    #[test]
    fn test_equal_hashes_collapse_in_sets() {
        let mut set = HashSet::new();
        set.insert(ContentHash::digest(b"same"));
        set.insert(ContentHash::digest(b"same"));
        set.insert(ContentHash::digest(b"other"));

        assert_eq!(set.len(), 2);
    }

    // ============================================================
    // SERDE
    // ============================================================

    #[test]
    fn test_json_representation_is_hex_string() {
        let hash = ContentHash::from_hex(ABCDEF_HEX).unwrap();

        let json = serde_json::to_string(&hash).unwrap();
        assert_eq!(json, format!("\"{}\"", ABCDEF_HEX));

        let restored: ContentHash = serde_json::from_str(&json).unwrap();
        assert_eq!(restored, hash);
    }

    #[test]
    fn test_json_rejects_malformed_hash() {
        let result: Result<ContentHash, _> = serde_json::from_str("\"not-a-hash\"");

        assert!(result.is_err());
    }

    #[test]
    fn test_bincode_round_trip() {
        let hash = ContentHash::digest(b"bincode");

        let encoded = bincode::serialize(&hash).expect("Bincode serialization failed");
        let restored: ContentHash =
            bincode::deserialize(&encoded).expect("Bincode deserialization failed");

        assert_eq!(restored, hash);
    }

    #[test]
    fn test_bincode_stores_raw_digest_bytes() {
        let hash = ContentHash::digest(b"compact");

        let encoded = bincode::serialize(&hash).expect("Bincode serialization failed");

        // u64 length prefix followed by the 32 digest bytes
        assert_eq!(encoded.len(), 8 + DIGEST_LENGTH);
        assert_eq!(hex::encode(&encoded[8..]), hash.to_hex());
    }

    #[test]
    fn test_bincode_rejects_short_digest() {
        let encoded = bincode::serialize(&vec![0u8; 31]).expect("Bincode serialization failed");

        let result: Result<ContentHash, _> = bincode::deserialize(&encoded);

        assert!(result.is_err());
    }
}
