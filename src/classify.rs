//! Structural classification of parsed knowledge documents.
//!
//! Source documents have no fixed schema: algorithms may sit in a bare list,
//! under a named key, or several levels down inside other structures. Every
//! node is viewed through [`NodeShape`] and an algorithm is recognised by
//! shape alone:
//!
//! - it is a map whose `id` is a string containing a letter or underscore
//!   (numeric ids belong to steps inside an algorithm), and
//! - it has a non-empty `esquema` list or at least one marker field.
//!
//! The walk in [`collect_algorithms`] keeps descending into a matched node,
//! so an algorithm nested inside another algorithm is collected as well.
//! Callers that care about that case should measure duplicate ids
//! (see [`crate::stats`]) rather than assume deduplication.

use serde_json::{Map, Value};

/// Fields whose presence marks a top-level algorithm node.
pub const MARKER_FIELDS: [&str; 5] = ["nombre", "pagina", "tipoSintoma", "nivelUsuario", "especie"];

/// Ordered list of decision steps.
pub const SCHEMA_FIELD: &str = "esquema";

/// A borrowed view of one node in a parsed document.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum NodeShape<'a> {
    AlgorithmCandidate(&'a Map<String, Value>),
    Container(Container<'a>),
    Scalar(&'a Value),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Container<'a> {
    Map(&'a Map<String, Value>),
    Seq(&'a [Value]),
}

pub fn classify(node: &Value) -> NodeShape<'_> {
    match node {
        Value::Object(map) if looks_like_algorithm(map) => NodeShape::AlgorithmCandidate(map),
        Value::Object(map) => NodeShape::Container(Container::Map(map)),
        Value::Array(items) => NodeShape::Container(Container::Seq(items)),
        other => NodeShape::Scalar(other),
    }
}

pub fn is_algorithm_node(node: &Value) -> bool {
    matches!(classify(node), NodeShape::AlgorithmCandidate(_))
}

fn looks_like_algorithm(map: &Map<String, Value>) -> bool {
    let id_ok = map
        .get("id")
        .and_then(Value::as_str)
        .is_some_and(|id| id.chars().any(|c| c == '_' || c.is_alphabetic()));
    if !id_ok {
        return false;
    }

    let has_schema = map
        .get(SCHEMA_FIELD)
        .and_then(Value::as_array)
        .is_some_and(|steps| !steps.is_empty());

    has_schema || MARKER_FIELDS.iter().any(|field| map.contains_key(*field))
}

/// Collect every algorithm-shaped node under `root`, depth-first, in the
/// order keys and items appear in the document.
pub fn collect_algorithms(root: &Value) -> Vec<&Map<String, Value>> {
    let mut found = Vec::new();
    walk(root, &mut found);
    found
}

fn walk<'a>(node: &'a Value, found: &mut Vec<&'a Map<String, Value>>) {
    match classify(node) {
        NodeShape::AlgorithmCandidate(map) => {
            found.push(map);
            for child in map.values() {
                walk(child, found);
            }
        }
        NodeShape::Container(Container::Map(map)) => {
            for child in map.values() {
                walk(child, found);
            }
        }
        NodeShape::Container(Container::Seq(items)) => {
            for child in items {
                walk(child, found);
            }
        }
        NodeShape::Scalar(_) => {}
    }
}
