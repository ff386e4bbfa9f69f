//! Knowledge document loader.
//!
//! Walks the configured root, keeps files matching the include globs (and
//! not the exclude globs), and parses each one into an untyped tree. Files
//! are read whole and visited in lexicographic order of their relative path.
//! A document that cannot be read or parsed is logged and skipped; a missing
//! root yields no documents.

use anyhow::Result;
use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::Deserialize;
use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use std::path::Path;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::config::KnowledgeConfig;
use crate::error::LoadError;

/// One parsed source document. Only lives for the duration of a load.
#[derive(Debug, Clone)]
pub struct RawDocument {
    /// Bare file name, used for sink and group routing.
    pub file_name: String,
    /// Path relative to the knowledge root, used for ordering and fingerprinting.
    pub relative_path: String,
    pub tree: Value,
    /// Hex SHA-256 of the document text.
    pub digest: String,
}

pub fn scan_documents(config: &KnowledgeConfig) -> Result<Vec<RawDocument>> {
    let root = &config.root;
    if !root.exists() {
        warn!(root = %root.display(), "knowledge root does not exist, nothing to load");
        return Ok(Vec::new());
    }

    let include_set = build_globset(&config.include_globs)?;
    let exclude_set = build_globset(&config.exclude_globs)?;

    let mut paths = Vec::new();

    let walker = WalkDir::new(root).follow_links(config.follow_symlinks);
    for entry in walker {
        let entry = match entry {
            Ok(entry) => entry,
            Err(e) => {
                warn!(error = %e, "skipping unreadable directory entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().replace('\\', "/");

        if exclude_set.is_match(&rel_str) || !include_set.is_match(&rel_str) {
            continue;
        }

        paths.push((rel_str, path.to_path_buf()));
    }

    paths.sort_by(|a, b| a.0.cmp(&b.0));

    let mut documents = Vec::with_capacity(paths.len());
    for (rel_str, path) in paths {
        match read_document(&path, &rel_str) {
            Ok(doc) => {
                debug!(file = %rel_str, "parsed document");
                documents.push(doc);
            }
            Err(e) => warn!(file = %rel_str, error = %e, "skipping document"),
        }
    }

    Ok(documents)
}

pub fn read_document(path: &Path, relative_path: &str) -> Result<RawDocument, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::DocumentUnreadable {
        path: path.to_path_buf(),
        source,
    })?;

    let tree = parse_document(&text)
        .map_err(|source| LoadError::DocumentUnparsable {
            path: path.to_path_buf(),
            source,
        })?
        .ok_or_else(|| LoadError::DocumentEmpty(path.to_path_buf()))?;

    let file_name = path
        .file_name()
        .map(|n| n.to_string_lossy().to_string())
        .unwrap_or_default();

    Ok(RawDocument {
        file_name,
        relative_path: relative_path.to_string(),
        tree,
        digest: hex::encode(Sha256::digest(text.as_bytes())),
    })
}

/// Parse YAML text into a tree.
///
/// Returns `Ok(None)` for blank text or text holding only null documents.
/// Several documents in one file come back as a sequence of their trees.
pub fn parse_document(text: &str) -> Result<Option<Value>, serde_yaml::Error> {
    let text = text.strip_prefix('\u{feff}').unwrap_or(text);
    if text.trim().is_empty() {
        return Ok(None);
    }

    let mut trees = Vec::new();
    for document in serde_yaml::Deserializer::from_str(text) {
        let value = serde_yaml::Value::deserialize(document)?;
        if !value.is_null() {
            trees.push(yaml_to_json(value));
        }
    }

    Ok(match trees.len() {
        0 => None,
        1 => trees.pop(),
        _ => Some(Value::Array(trees)),
    })
}

fn yaml_to_json(value: serde_yaml::Value) -> Value {
    use serde_yaml::Value as Yaml;

    match value {
        Yaml::Null => Value::Null,
        Yaml::Bool(b) => Value::Bool(b),
        Yaml::Number(n) => {
            if let Some(i) = n.as_i64() {
                Value::from(i)
            } else if let Some(u) = n.as_u64() {
                Value::from(u)
            } else {
                n.as_f64()
                    .and_then(serde_json::Number::from_f64)
                    .map(Value::Number)
                    .unwrap_or(Value::Null)
            }
        }
        Yaml::String(s) => Value::String(s),
        Yaml::Sequence(items) => Value::Array(items.into_iter().map(yaml_to_json).collect()),
        Yaml::Mapping(mapping) => {
            let mut obj = Map::new();
            for (k, v) in mapping {
                obj.insert(key_to_string(k), yaml_to_json(v));
            }
            Value::Object(obj)
        }
        Yaml::Tagged(tagged) => yaml_to_json(tagged.value),
    }
}

/// JSON object keys must be strings; numeric and boolean YAML keys are
/// written the way they appear in the source.
fn key_to_string(key: serde_yaml::Value) -> String {
    use serde_yaml::Value as Yaml;

    match key {
        Yaml::String(s) => s,
        Yaml::Number(n) => n.to_string(),
        Yaml::Bool(b) => b.to_string(),
        Yaml::Null => "null".to_string(),
        other => serde_yaml::to_string(&other)
            .map(|s| s.trim().to_string())
            .unwrap_or_default(),
    }
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::fs;
    use tempfile::TempDir;

    fn config_for(root: &Path) -> KnowledgeConfig {
        KnowledgeConfig {
            root: root.to_path_buf(),
            ..KnowledgeConfig::default()
        }
    }

    #[test]
    fn test_missing_root_is_empty() {
        let tmp = TempDir::new().unwrap();
        let docs = scan_documents(&config_for(&tmp.path().join("nope"))).unwrap();
        assert!(docs.is_empty());
    }

    #[test]
    fn test_scan_sorted_and_filtered() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("sub")).unwrap();
        fs::write(root.join("b.yaml"), "- id: b_alg\n  nombre: B\n").unwrap();
        fs::write(root.join("a.yml"), "id: a_alg\nnombre: A\n").unwrap();
        fs::write(root.join("sub/c.yaml"), "id: c\n").unwrap();
        fs::write(root.join("notes.txt"), "id: ignored\n").unwrap();

        let docs = scan_documents(&config_for(root)).unwrap();
        let names: Vec<&str> = docs.iter().map(|d| d.relative_path.as_str()).collect();
        assert_eq!(names, vec!["a.yml", "b.yaml", "sub/c.yaml"]);
        assert_eq!(docs[2].file_name, "c.yaml");
    }

    #[test]
    fn test_exclude_globs() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("drafts")).unwrap();
        fs::write(root.join("keep.yaml"), "id: keep\n").unwrap();
        fs::write(root.join("drafts/skip.yaml"), "id: skip\n").unwrap();

        let mut config = config_for(root);
        config.exclude_globs = vec!["drafts/**".to_string()];
        let docs = scan_documents(&config).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].relative_path, "keep.yaml");
    }

    #[test]
    fn test_empty_and_broken_files_skipped() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path();
        fs::write(root.join("empty.yaml"), "   \n").unwrap();
        fs::write(root.join("broken.yaml"), "id: [unclosed\n").unwrap();
        fs::write(root.join("good.yaml"), "id: fine\n").unwrap();

        let docs = scan_documents(&config_for(root)).unwrap();
        assert_eq!(docs.len(), 1);
        assert_eq!(docs[0].file_name, "good.yaml");
    }

    #[test]
    fn test_read_document_errors() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("missing.yaml");
        assert!(matches!(
            read_document(&missing, "missing.yaml"),
            Err(LoadError::DocumentUnreadable { .. })
        ));

        let empty = tmp.path().join("empty.yaml");
        fs::write(&empty, "").unwrap();
        assert!(matches!(
            read_document(&empty, "empty.yaml"),
            Err(LoadError::DocumentEmpty(_))
        ));

        let broken = tmp.path().join("broken.yaml");
        fs::write(&broken, "a: b: c\n").unwrap();
        assert!(matches!(
            read_document(&broken, "broken.yaml"),
            Err(LoadError::DocumentUnparsable { .. })
        ));
    }

    #[test]
    fn test_parse_strips_bom() {
        let tree = parse_document("\u{feff}id: alpha\n").unwrap().unwrap();
        assert_eq!(tree, json!({ "id": "alpha" }));
    }

    #[test]
    fn test_parse_multi_document() {
        let tree = parse_document("id: one\n---\nid: two\n").unwrap().unwrap();
        assert_eq!(tree, json!([{ "id": "one" }, { "id": "two" }]));
    }

    #[test]
    fn test_numeric_keys_become_strings() {
        let tree = parse_document("1:\n  id: first\n2:\n  id: second\n")
            .unwrap()
            .unwrap();
        assert_eq!(tree["1"]["id"], json!("first"));
        assert_eq!(tree["2"]["id"], json!("second"));
    }

    #[test]
    fn test_numeric_id_stays_numeric() {
        let tree = parse_document("id: 42\n").unwrap().unwrap();
        assert_eq!(tree["id"], json!(42));
    }

    #[test]
    fn test_digest_is_stable() {
        let tmp = TempDir::new().unwrap();
        let path = tmp.path().join("doc.yaml");
        fs::write(&path, "id: alpha\n").unwrap();
        let a = read_document(&path, "doc.yaml").unwrap();
        let b = read_document(&path, "doc.yaml").unwrap();
        assert_eq!(a.digest, b.digest);
        assert_eq!(a.digest.len(), 64);
    }
}
