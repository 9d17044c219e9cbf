use sha2::{Digest, Sha256};

/// Hex SHA-256 over the canonical JSON serialization of a request body
/// (`spec.md` §3 IdempotencyRecord, §4.3). `serde_json::Value` iterates map
/// keys in sorted order by default (the `preserve_order` feature is not
/// enabled anywhere in this workspace), so `to_string` already produces a
/// canonical form for equal values regardless of the order fields arrived in.
pub fn canonical_request_hash(body: &serde_json::Value) -> String {
    let canonical = serde_json::to_string(body).unwrap_or_default();
    let digest = Sha256::digest(canonical.as_bytes());
    digest.iter().map(|b| format!("{b:02x}")).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn same_value_different_key_order_hashes_equal() {
        let a = json!({"region": "us-east-1", "requested_by": "dashboard"});
        let b = json!({"requested_by": "dashboard", "region": "us-east-1"});
        assert_eq!(canonical_request_hash(&a), canonical_request_hash(&b));
    }

    #[test]
    fn different_value_hashes_differ() {
        let a = json!({"region": "us-east-1"});
        let b = json!({"region": "us-west-2"});
        assert_ne!(canonical_request_hash(&a), canonical_request_hash(&b));
    }

    #[test]
    fn hash_is_64_hex_chars() {
        let hash = canonical_request_hash(&json!({"a": 1}));
        assert_eq!(hash.len(), 64);
        assert!(hash.chars().all(|c| c.is_ascii_hexdigit()));
    }
}
