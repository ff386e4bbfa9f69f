//! # Triage Harness
//!
//! Knowledge-base ingestion and clinical context building for a pet-symptom
//! triage chat agent.
//!
//! A collection of YAML documents (decision-tree algorithms, clinical detail
//! sheets, breed predisposition tables) is walked once per process,
//! classified by shape, normalized into typed records and cached. Each
//! request then filters the cached knowledge base down to what matters for
//! one pet (user level, age, species, breed) and hands the resulting context
//! payload to a language model.
//!
//! ## Architecture
//!
//! ```text
//! ┌────────────┐   ┌────────────┐   ┌─────────────┐   ┌──────────────┐
//! │   loader   │──▶│  classify  │──▶│  normalize  │──▶│    cache     │
//! │ YAML walk  │   │ NodeShape  │   │ sinks/group │   │ load once    │
//! └────────────┘   └────────────┘   └─────────────┘   └──────┬───────┘
//!                                                            │
//!                                      ┌─────────────────────┤
//!                                      ▼                     ▼
//!                                ┌───────────┐        ┌────────────┐
//!                                │  context  │──────▶│   agent    │
//!                                │  filters  │        │ ChatModel  │
//!                                └───────────┘        └────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! triage kb                          # load and summarize the knowledge base
//! triage context --pet pet.json      # print the context payload for a pet
//! triage export --output kb.json     # write a bundled JSON asset
//! triage serve                       # start the HTTP server
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Record types and pet profile |
//! | [`error`] | Per-document load errors |
//! | [`loader`] | Directory walk and YAML parsing |
//! | [`classify`] | Algorithm-node detection |
//! | [`normalize`] | File routing and record mapping |
//! | [`traits`] | `KnowledgeSource` and `ChatModel` traits |
//! | [`sources`] | Filesystem and bundle knowledge sources |
//! | [`cache`] | Load-once knowledge-base cache |
//! | [`breeds`] | Breed alias resolution |
//! | [`context`] | Context filter/builder |
//! | [`stats`] | Knowledge-base summary |
//! | [`export`] | Bundle export |
//! | [`llm`] | Chat model clients |
//! | [`agent`] | Conversation turn handling |
//! | [`server`] | HTTP server |

pub mod agent;
pub mod breeds;
pub mod cache;
pub mod classify;
pub mod config;
pub mod context;
pub mod error;
pub mod export;
pub mod llm;
pub mod loader;
pub mod models;
pub mod normalize;
pub mod server;
pub mod sources;
pub mod stats;
pub mod traits;
