//! Dataset normalization.
//!
//! Routes each loaded document to one of three sinks by its file name and
//! reshapes the source fields into the normalized records of
//! [`crate::models`]:
//!
//! | File name contains | Sink | List field |
//! |--------------------|------|------------|
//! | `klinicheskie_detali` | clinical details | `detalles_clinicos` |
//! | `predisposiciones_raza` | breed risks | `predisposiciones_raza_parte_1` |
//! | anything else | algorithms (via [`crate::classify`]) | n/a |
//!
//! Algorithm records are tagged with an [`AlgorithmGroup`] taken from the
//! file name, `general` when nothing matches.

use serde_json::{Map, Value};
use sha2::{Digest, Sha256};
use tracing::{info, warn};

use crate::classify::{collect_algorithms, SCHEMA_FIELD};
use crate::loader::RawDocument;
use crate::models::{
    AlgorithmGroup, AlgorithmRecord, BreedRiskRecord, ClinicalDetailRecord, KnowledgeBase,
};
use crate::stats::duplicate_ids;

const CLINICAL_FILE_MARKER: &str = "klinicheskie_detali";
const CLINICAL_LIST_FIELD: &str = "detalles_clinicos";
const BREED_FILE_MARKER: &str = "predisposiciones_raza";
const BREED_LIST_FIELD: &str = "predisposiciones_raza_parte_1";

/// File name fragments that select an algorithm group, checked in order.
const GROUP_MARKERS: [(&str, AlgorithmGroup); 4] = [
    ("algoritmos_geriatricos", AlgorithmGroup::Geriatric),
    ("algoritmos_t4", AlgorithmGroup::T4),
    ("algoritmos_anestesia", AlgorithmGroup::Anesthesia),
    ("algoritmos_familiar", AlgorithmGroup::Familiar),
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DocumentSink {
    ClinicalDetails,
    BreedRisks,
    Algorithms(AlgorithmGroup),
}

pub fn route(file_name: &str) -> DocumentSink {
    let lower = file_name.to_lowercase();
    if lower.contains(CLINICAL_FILE_MARKER) {
        return DocumentSink::ClinicalDetails;
    }
    if lower.contains(BREED_FILE_MARKER) {
        return DocumentSink::BreedRisks;
    }
    let group = GROUP_MARKERS
        .iter()
        .find(|(marker, _)| lower.contains(marker))
        .map(|(_, group)| *group)
        .unwrap_or_default();
    DocumentSink::Algorithms(group)
}

/// Build a knowledge base from loaded documents.
pub fn normalize_documents(documents: &[RawDocument]) -> KnowledgeBase {
    let mut kb = KnowledgeBase::default();
    let mut hasher = Sha256::new();

    for doc in documents {
        hasher.update(doc.relative_path.as_bytes());
        hasher.update([0u8]);
        hasher.update(doc.digest.as_bytes());
        hasher.update(b"\n");

        match route(&doc.file_name) {
            DocumentSink::ClinicalDetails => {
                let records = clinical_details(&doc.tree);
                info!(file = %doc.relative_path, records = records.len(), "loaded clinical details");
                kb.clinical_details.extend(records);
            }
            DocumentSink::BreedRisks => {
                let records = breed_risks(&doc.tree);
                info!(file = %doc.relative_path, records = records.len(), "loaded breed risks");
                kb.breed_risks.extend(records);
            }
            DocumentSink::Algorithms(group) => {
                let records: Vec<AlgorithmRecord> = collect_algorithms(&doc.tree)
                    .into_iter()
                    .map(|node| algorithm_record(node, group))
                    .collect();
                info!(
                    file = %doc.relative_path,
                    group = group.as_str(),
                    algorithms = records.len(),
                    "loaded algorithms"
                );
                kb.algorithms.extend(records);
            }
        }
    }

    for (id, count) in duplicate_ids(&kb.algorithms) {
        warn!(id = %id, occurrences = count, "algorithm id collected more than once");
    }

    kb.fingerprint = Some(hex::encode(hasher.finalize()));
    kb
}

/// Convert an algorithm-shaped node. The node must have passed
/// [`crate::classify::is_algorithm_node`], so `id` is a string.
pub fn algorithm_record(node: &Map<String, Value>, group: AlgorithmGroup) -> AlgorithmRecord {
    let mut record = AlgorithmRecord {
        id: node.get("id").and_then(scalar_text).unwrap_or_default(),
        name: None,
        user_level: None,
        species: None,
        schema: Vec::new(),
        group,
        extra: Map::new(),
    };

    for (key, value) in node {
        match key.as_str() {
            "id" | "grupo" => {}
            "nombre" if scalar_text(value).is_some() => record.name = scalar_text(value),
            "nivelUsuario" if scalar_text(value).is_some() => {
                record.user_level = scalar_text(value)
            }
            "especie" if !value.is_null() => record.species = Some(value.clone()),
            k if k == SCHEMA_FIELD && value.is_array() => {
                record.schema = value.as_array().cloned().unwrap_or_default()
            }
            _ => {
                record.extra.insert(key.clone(), value.clone());
            }
        }
    }

    record
}

pub fn clinical_details(tree: &Value) -> Vec<ClinicalDetailRecord> {
    list_field(tree, CLINICAL_LIST_FIELD)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|item| ClinicalDetailRecord {
            disease_id: item.get("id_enfermedad").and_then(scalar_text),
            name: item.get("nombre").and_then(scalar_text),
            species: item.get("вид").and_then(scalar_text),
            risk_breeds: item
                .get("породы_риска_тестирования")
                .map(text_list)
                .unwrap_or_default(),
            key_symptoms: item.get("sintomas_clave").map(text).unwrap_or_default(),
            relevant_diagnostics: item
                .get("diagnostico_relevante")
                .map(text)
                .unwrap_or_default(),
        })
        .collect()
}

pub fn breed_risks(tree: &Value) -> Vec<BreedRiskRecord> {
    list_field(tree, BREED_LIST_FIELD)
        .into_iter()
        .flatten()
        .filter_map(Value::as_object)
        .map(|item| BreedRiskRecord {
            species: item.get("especie").map(text).unwrap_or_default(),
            breed: item.get("raza").map(text).unwrap_or_default(),
            predispositions: item.get("predisposiciones").map(text_list).unwrap_or_default(),
        })
        .collect()
}

/// Algorithms from a bundled asset. Items without a usable `id` are
/// dropped; everything else goes through [`algorithm_record`], so a field
/// with an unexpected shape lands in `extra` instead of failing the bundle.
pub fn bundle_algorithms(items: &[Value]) -> Vec<AlgorithmRecord> {
    items
        .iter()
        .filter_map(Value::as_object)
        .filter(|item| {
            item.get("id")
                .and_then(scalar_text)
                .is_some_and(|id| !id.trim().is_empty())
        })
        .map(|item| {
            let group = item
                .get("grupo")
                .and_then(|g| serde_json::from_value(g.clone()).ok())
                .unwrap_or_default();
            algorithm_record(item, group)
        })
        .collect()
}

/// Clinical details from a bundled asset, keyed by the exported names.
pub fn bundle_clinical_details(items: &[Value]) -> Vec<ClinicalDetailRecord> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| ClinicalDetailRecord {
            disease_id: item.get("id").and_then(scalar_text),
            name: item.get("nombre").and_then(scalar_text),
            species: item.get("especie").and_then(scalar_text),
            risk_breeds: item.get("razasRiesgo").map(text_list).unwrap_or_default(),
            key_symptoms: item.get("sintomasClave").map(text).unwrap_or_default(),
            relevant_diagnostics: item
                .get("diagnosticoRelevante")
                .map(text)
                .unwrap_or_default(),
        })
        .collect()
}

pub fn bundle_breed_risks(items: &[Value]) -> Vec<BreedRiskRecord> {
    items
        .iter()
        .filter_map(Value::as_object)
        .map(|item| BreedRiskRecord {
            species: item.get("especie").map(text).unwrap_or_default(),
            breed: item.get("raza").map(text).unwrap_or_default(),
            predispositions: item.get("predisposiciones").map(text_list).unwrap_or_default(),
        })
        .collect()
}

/// The named list on the document root, or on the first document of a
/// multi-document file that has it.
fn list_field<'a>(tree: &'a Value, field: &str) -> Option<&'a Vec<Value>> {
    match tree {
        Value::Object(map) => map.get(field).and_then(Value::as_array),
        Value::Array(docs) => docs
            .iter()
            .find_map(|doc| doc.get(field).and_then(Value::as_array)),
        _ => None,
    }
}

fn scalar_text(value: &Value) -> Option<String> {
    match value {
        Value::String(s) => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        Value::Bool(b) => Some(b.to_string()),
        _ => None,
    }
}

fn text(value: &Value) -> String {
    match value {
        Value::Array(items) => items
            .iter()
            .map(text)
            .filter(|s| !s.is_empty())
            .collect::<Vec<_>>()
            .join(", "),
        Value::Object(_) => value.to_string(),
        other => scalar_text(other).unwrap_or_default(),
    }
}

fn text_list(value: &Value) -> Vec<String> {
    match value {
        Value::Array(items) => items
            .iter()
            .map(text)
            .filter(|s| !s.is_empty())
            .collect(),
        Value::Null => Vec::new(),
        other => {
            let s = text(other);
            if s.is_empty() {
                Vec::new()
            } else {
                vec![s]
            }
        }
    }
}
