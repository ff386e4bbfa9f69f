//! Export the loaded knowledge base as a bundled JSON asset.
//!
//! The output has the top-level fields `algorithms`, `clinicalDetails` and
//! `breedRisks`, and is what [`crate::sources::BundleKnowledgeSource`] reads
//! back on deployments without the YAML document tree.

use anyhow::{Context, Result};
use std::path::Path;

use crate::cache::KnowledgeBaseCache;
use crate::config::Config;
use crate::models::KnowledgeBase;
use crate::sources::create_source;

pub fn bundle_json(kb: &KnowledgeBase) -> Result<String> {
    serde_json::to_string_pretty(kb).context("Failed to serialize knowledge base")
}

/// Load the knowledge base and write it as a bundle.
///
/// If `output` is `Some`, writes to that file path. Otherwise writes
/// to stdout for piping.
pub async fn run_export(config: &Config, output: Option<&Path>) -> Result<()> {
    let cache = KnowledgeBaseCache::new(create_source(config)?);
    let kb = cache.load().await;
    let json = bundle_json(&kb)?;

    match output {
        Some(path) => {
            if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create {}", parent.display()))?;
            }
            std::fs::write(path, &json)
                .with_context(|| format!("Failed to write {}", path.display()))?;
            eprintln!(
                "Exported {} algorithms, {} clinical details, {} breed risks to {}",
                kb.algorithms.len(),
                kb.clinical_details.len(),
                kb.breed_risks.len(),
                path.display()
            );
        }
        None => println!("{}", json),
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AlgorithmGroup, AlgorithmRecord, BreedRiskRecord};
    use crate::sources::parse_bundle;
    use serde_json::{json, Map};

    #[test]
    fn test_bundle_reads_back() {
        let mut extra = Map::new();
        extra.insert("pagina".to_string(), json!(4));
        let kb = KnowledgeBase {
            algorithms: vec![AlgorithmRecord {
                id: "disnea".to_string(),
                name: Some("Disnea".to_string()),
                user_level: Some("familiar".to_string()),
                species: Some(json!("perro")),
                schema: vec![json!({ "paso": 1 })],
                group: AlgorithmGroup::Geriatric,
                extra,
            }],
            breed_risks: vec![BreedRiskRecord {
                species: "gato".to_string(),
                breed: "Persa".to_string(),
                predispositions: vec!["Poliquistosis renal".to_string()],
            }],
            ..KnowledgeBase::default()
        };

        let json = bundle_json(&kb).unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value.get("clinicalDetails").is_some());
        assert_eq!(value["algorithms"][0]["grupo"], json!("geriatrico"));

        let mut back = parse_bundle(&json).unwrap();
        assert!(back.fingerprint.is_some());
        back.fingerprint = None;
        assert_eq!(back, kb);
    }
}
