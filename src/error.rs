//! Per-document failures raised while loading the knowledge base.
//!
//! None of these abort a load: the loader logs the error and moves on to
//! the next document. Nodes that merely look like algorithms but fail the
//! structural check are not errors at all and never reach this type.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("failed to read {}: {source}", path.display())]
    DocumentUnreadable {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    DocumentUnparsable {
        path: PathBuf,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("document is empty: {}", .0.display())]
    DocumentEmpty(PathBuf),
}
