//! Built-in knowledge sources.
//!
//! - [`FsKnowledgeSource`] walks a directory of YAML documents and runs the
//!   classify/normalize pipeline; used by the long-running server.
//! - [`BundleKnowledgeSource`] reads a prebuilt JSON asset (see
//!   [`crate::export`]); used where there is no document tree to walk.

use anyhow::{Context, Result};
use async_trait::async_trait;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::PathBuf;
use std::sync::Arc;

use crate::config::{Config, KnowledgeConfig};
use crate::loader::scan_documents;
use crate::models::KnowledgeBase;
use crate::normalize::{
    bundle_algorithms, bundle_breed_risks, bundle_clinical_details, normalize_documents,
};
use crate::traits::KnowledgeSource;

/// Pick the source named by `knowledge.source`.
pub fn create_source(config: &Config) -> Result<Arc<dyn KnowledgeSource>> {
    match config.knowledge.source.as_str() {
        "filesystem" => Ok(Arc::new(FsKnowledgeSource::new(config.knowledge.clone()))),
        "bundle" => {
            let path = config
                .knowledge
                .bundle_path
                .clone()
                .ok_or_else(|| anyhow::anyhow!("knowledge.bundle_path is not set"))?;
            Ok(Arc::new(BundleKnowledgeSource::from_path(path)))
        }
        other => anyhow::bail!("Unknown knowledge source: {}", other),
    }
}

pub struct FsKnowledgeSource {
    config: KnowledgeConfig,
    description: String,
}

impl FsKnowledgeSource {
    pub fn new(config: KnowledgeConfig) -> Self {
        let description = format!("YAML documents under {}", config.root.display());
        Self {
            config,
            description,
        }
    }

    /// Synchronous load, for callers outside a runtime.
    pub fn load_blocking(&self) -> Result<KnowledgeBase> {
        load_directory(&self.config)
    }
}

fn load_directory(config: &KnowledgeConfig) -> Result<KnowledgeBase> {
    let documents = scan_documents(config)?;
    Ok(normalize_documents(&documents))
}

#[async_trait]
impl KnowledgeSource for FsKnowledgeSource {
    fn name(&self) -> &str {
        "filesystem"
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn load(&self) -> Result<KnowledgeBase> {
        let config = self.config.clone();
        tokio::task::spawn_blocking(move || load_directory(&config))
            .await
            .context("knowledge load task panicked")?
    }
}

enum BundleOrigin {
    Path(PathBuf),
    Inline(String),
}

pub struct BundleKnowledgeSource {
    origin: BundleOrigin,
    description: String,
}

impl BundleKnowledgeSource {
    pub fn from_path(path: PathBuf) -> Self {
        let description = format!("bundled JSON asset at {}", path.display());
        Self {
            origin: BundleOrigin::Path(path),
            description,
        }
    }

    /// A bundle compiled into the binary, e.g. with `include_str!`.
    pub fn from_json_str(label: &str, json: &str) -> Self {
        Self {
            origin: BundleOrigin::Inline(json.to_string()),
            description: format!("inline bundle '{}'", label),
        }
    }
}

#[async_trait]
impl KnowledgeSource for BundleKnowledgeSource {
    fn name(&self) -> &str {
        "bundle"
    }

    fn description(&self) -> &str {
        &self.description
    }

    async fn load(&self) -> Result<KnowledgeBase> {
        let text = match &self.origin {
            BundleOrigin::Path(path) => tokio::fs::read_to_string(path)
                .await
                .with_context(|| format!("Failed to read bundle: {}", path.display()))?,
            BundleOrigin::Inline(json) => json.clone(),
        };
        parse_bundle(&text)
    }
}

/// Parse a bundle. A bare JSON array is the older algorithms-only form.
///
/// Records are mapped field by field, so a value of an unexpected type
/// degrades that field instead of rejecting the bundle. Only a list field
/// that is not a list is an error.
pub fn parse_bundle(text: &str) -> Result<KnowledgeBase> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    let value: Value = serde_json::from_str(text).context("Failed to parse bundle JSON")?;

    let mut kb = match &value {
        Value::Array(items) => KnowledgeBase {
            algorithms: bundle_algorithms(items),
            ..KnowledgeBase::default()
        },
        Value::Object(map) => KnowledgeBase {
            algorithms: bundle_algorithms(bundle_list(map, "algorithms")?),
            clinical_details: bundle_clinical_details(bundle_list(map, "clinicalDetails")?),
            breed_risks: bundle_breed_risks(bundle_list(map, "breedRisks")?),
            fingerprint: None,
        },
        _ => anyhow::bail!("Invalid knowledge base bundle: expected an object or an array"),
    };

    kb.fingerprint = Some(hex::encode(Sha256::digest(text.as_bytes())));
    Ok(kb)
}

fn bundle_list<'a>(map: &'a Map<String, Value>, field: &str) -> Result<&'a [Value]> {
    match map.get(field) {
        None | Some(Value::Null) => Ok(&[][..]),
        Some(Value::Array(items)) => Ok(items.as_slice()),
        Some(_) => anyhow::bail!("Invalid knowledge base bundle: `{}` is not a list", field),
    }
}
