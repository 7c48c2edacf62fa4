use anonsignals_types::{AggregationArtifacts, Bytes32};
use serde_json::Value;
use tracing::{debug, warn};

/// Looks a field up in `aggregationDetails` first, then at the top level,
/// trying each alias in order.
fn lookup<'a>(raw: &'a Value, keys: &[&str]) -> Option<&'a Value> {
    let details = raw.get("aggregationDetails");
    keys.iter().find_map(|key| {
        details
            .and_then(|d| d.get(*key))
            .or_else(|| raw.get(*key))
            .filter(|v| !v.is_null())
    })
}

/// JSON number, decimal string or `0x` hex string.
fn as_u64(value: &Value) -> Option<u64> {
    match value {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => {
            let s = s.trim();
            match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
                Some(digits) => u64::from_str_radix(digits, 16).ok(),
                None => s.parse().ok(),
            }
        }
        _ => None,
    }
}

fn as_bytes32(value: &Value) -> Option<Bytes32> {
    value.as_str().and_then(|s| Bytes32::from_hex(s.trim()).ok())
}

fn number(raw: &Value, keys: &[&str]) -> Option<u64> {
    let value = lookup(raw, keys)?;
    let parsed = as_u64(value);
    if parsed.is_none() {
        warn!("Unparseable aggregation field {}: {}", keys[0], value);
    }
    parsed
}

/// Pulls aggregation metadata out of a job-status payload. Returns `None`
/// when the leaf, a non-empty Merkle path or the aggregation id is absent
/// or malformed. Domain id (falling back to `default_domain_id`), leaf
/// count and leaf index are optional here; only the on-chain check needs
/// them.
pub fn extract_artifacts(raw: &Value, default_domain_id: Option<u64>) -> Option<AggregationArtifacts> {
    let leaf = match lookup(raw, &["leaf"]).and_then(as_bytes32) {
        Some(leaf) => leaf,
        None => {
            debug!("Aggregation payload has no usable leaf");
            return None;
        }
    };

    let path_values = lookup(raw, &["merkleProof", "merklePath"])?.as_array()?;
    let merkle_path = path_values
        .iter()
        .map(as_bytes32)
        .collect::<Option<Vec<_>>>()?;
    if merkle_path.is_empty() {
        debug!("Aggregation payload has an empty Merkle path");
        return None;
    }

    let aggregation_id = number(raw, &["aggregationId"])?;
    let leaf_count = number(raw, &["numberOfLeaves", "leafCount"]);
    let index = number(raw, &["leafIndex", "index"]);
    let domain_id = number(raw, &["domainId"]).or(default_domain_id);
    let tree_depth = number(raw, &["treeDepth"]);

    if let (Some(index), Some(leaf_count)) = (index, leaf_count) {
        if index >= leaf_count {
            warn!("Aggregation leaf index {} outside {} leaves", index, leaf_count);
            return None;
        }
    }

    Some(AggregationArtifacts {
        aggregation_id,
        domain_id,
        leaf,
        merkle_path,
        leaf_count,
        index,
        tree_depth,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn h(byte: u8) -> String {
        format!("0x{}", hex::encode([byte; 32]))
    }

    fn payload() -> Value {
        json!({
            "jobId": "job-1",
            "status": "Aggregated",
            "aggregationId": 17,
            "domainId": "0",
            "aggregationDetails": {
                "receipt": h(0xee),
                "leaf": h(0xaa),
                "merkleProof": [h(1), h(2), h(3)],
                "numberOfLeaves": "8",
                "leafIndex": "0x5"
            }
        })
    }

    #[test]
    fn test_relayer_payload_extracted() {
        let artifacts = extract_artifacts(&payload(), None).unwrap();
        assert_eq!(artifacts.aggregation_id, 17);
        assert_eq!(artifacts.domain_id, Some(0));
        assert_eq!(artifacts.leaf, Bytes32([0xaa; 32]));
        assert_eq!(artifacts.merkle_path.len(), 3);
        assert_eq!(artifacts.leaf_count, Some(8));
        assert_eq!(artifacts.index, Some(5));
        assert_eq!(artifacts.inclusion_inputs(), Some((0, 8, 5)));
        assert_eq!(artifacts.tree_depth, None);
    }

    #[test]
    fn test_flat_payload_with_aliases() {
        let raw = json!({
            "aggregationId": "0x10",
            "leaf": h(0xbb),
            "merklePath": [h(4)],
            "leafCount": 2,
            "index": 1,
            "treeDepth": 1
        });
        let artifacts = extract_artifacts(&raw, Some(3)).unwrap();
        assert_eq!(artifacts.aggregation_id, 16);
        assert_eq!(artifacts.domain_id, Some(3));
        assert_eq!(artifacts.tree_depth, Some(1));
    }

    #[test]
    fn test_missing_required_fields() {
        for pointer in ["leaf", "merkleProof"] {
            let mut raw = payload();
            raw["aggregationDetails"].as_object_mut().unwrap().remove(pointer);
            assert!(extract_artifacts(&raw, Some(0)).is_none(), "{} removed", pointer);
        }

        let mut raw = payload();
        raw.as_object_mut().unwrap().remove("aggregationId");
        assert!(extract_artifacts(&raw, Some(0)).is_none());
    }

    #[test]
    fn test_inclusion_fields_are_optional() {
        let mut raw = payload();
        raw.as_object_mut().unwrap().remove("domainId");
        let details = raw["aggregationDetails"].as_object_mut().unwrap();
        details.remove("numberOfLeaves");
        details.remove("leafIndex");

        let artifacts = extract_artifacts(&raw, None).unwrap();
        assert_eq!(artifacts.leaf, Bytes32([0xaa; 32]));
        assert_eq!(artifacts.domain_id, None);
        assert_eq!(artifacts.leaf_count, None);
        assert_eq!(artifacts.index, None);
        assert_eq!(artifacts.inclusion_inputs(), None);
    }

    #[test]
    fn test_domain_falls_back_to_config() {
        let mut raw = payload();
        raw.as_object_mut().unwrap().remove("domainId");
        assert_eq!(extract_artifacts(&raw, None).unwrap().domain_id, None);
        assert_eq!(extract_artifacts(&raw, Some(9)).unwrap().domain_id, Some(9));
    }

    #[test]
    fn test_malformed_values_rejected() {
        let mut raw = payload();
        raw["aggregationDetails"]["merkleProof"] = json!([]);
        assert!(extract_artifacts(&raw, None).is_none());

        let mut raw = payload();
        raw["aggregationDetails"]["merkleProof"] = json!([h(1), "0x12"]);
        assert!(extract_artifacts(&raw, None).is_none());

        let mut raw = payload();
        raw["aggregationDetails"]["leaf"] = json!("not-hex");
        assert!(extract_artifacts(&raw, None).is_none());

        let mut raw = payload();
        raw["aggregationDetails"]["leafIndex"] = json!(8);
        assert!(extract_artifacts(&raw, None).is_none());
    }
}
