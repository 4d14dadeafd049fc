use sha2::{Digest, Sha256};

use crate::detectors::{anomaly, consistency};

pub fn sha256_hex(bytes: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(bytes);
    hex::encode(hasher.finalize())
}

pub fn hash_file(path: &std::path::Path) -> anyhow::Result<String> {
    let data = std::fs::read(path)?;
    Ok(sha256_hex(&data))
}

/// Sorted ids of every consistency rule and anomaly indicator, prefixed by kind.
pub fn rule_catalog() -> Vec<String> {
    let mut ids: Vec<String> = consistency::RULES
        .iter()
        .map(|r| format!("consistency:{}", r.id))
        .chain(
            anomaly::INDICATORS
                .iter()
                .map(|i| format!("anomaly:{}", i.id)),
        )
        .collect();
    ids.sort();
    ids
}

/// Stable digest of the rule catalog; changes whenever a rule is added or removed.
pub fn catalog_hash() -> String {
    sha256_hex(rule_catalog().join(",").as_bytes())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sha256_of_empty_input() {
        assert_eq!(
            sha256_hex(b""),
            "e3b0c44298fc1c149afbf4c8996fb92427ae41e4649b934ca495991b7852b855"
        );
    }

    #[test]
    fn catalog_is_sorted_and_unique() {
        let catalog = rule_catalog();
        let mut deduped = catalog.clone();
        deduped.dedup();
        assert_eq!(catalog, deduped);
        assert!(catalog.windows(2).all(|w| w[0] < w[1]));
        assert_eq!(catalog_hash(), catalog_hash());
    }
}
