//! Knowledge-base statistics and health overview.
//!
//! Provides a quick summary of what was loaded: algorithm counts per group,
//! clinical-detail and breed-risk counts, the dataset fingerprint, and any
//! algorithm ids collected more than once. Used by `triage kb` and the
//! `GET /kb/stats` endpoint.

use anyhow::Result;
use serde::Serialize;
use std::collections::BTreeMap;

use crate::cache::KnowledgeBaseCache;
use crate::config::Config;
use crate::models::{AlgorithmRecord, KnowledgeBase};
use crate::sources::create_source;

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct KnowledgeBaseStats {
    pub algorithms: usize,
    pub by_group: BTreeMap<String, usize>,
    pub by_user_level: BTreeMap<String, usize>,
    pub clinical_details: usize,
    pub breed_risks: usize,
    pub fingerprint: Option<String>,
    pub duplicate_ids: Vec<DuplicateId>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DuplicateId {
    pub id: String,
    pub count: usize,
}

impl KnowledgeBaseStats {
    pub fn from_kb(kb: &KnowledgeBase) -> Self {
        let mut by_group = BTreeMap::new();
        let mut by_user_level = BTreeMap::new();
        for alg in &kb.algorithms {
            *by_group.entry(alg.group.as_str().to_string()).or_insert(0) += 1;
            let level = alg.user_level_key().unwrap_or_else(|| "(none)".to_string());
            *by_user_level.entry(level).or_insert(0) += 1;
        }

        Self {
            algorithms: kb.algorithms.len(),
            by_group,
            by_user_level,
            clinical_details: kb.clinical_details.len(),
            breed_risks: kb.breed_risks.len(),
            fingerprint: kb.fingerprint.clone(),
            duplicate_ids: duplicate_ids(&kb.algorithms)
                .into_iter()
                .map(|(id, count)| DuplicateId { id, count })
                .collect(),
        }
    }
}

/// Algorithm ids that occur more than once, sorted by id.
pub fn duplicate_ids(algorithms: &[AlgorithmRecord]) -> Vec<(String, usize)> {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for alg in algorithms {
        *counts.entry(alg.id.as_str()).or_insert(0) += 1;
    }
    counts
        .into_iter()
        .filter(|(_, count)| *count > 1)
        .map(|(id, count)| (id.to_string(), count))
        .collect()
}

/// Run the `kb` command: load the knowledge base and print a summary.
pub async fn run_stats(config: &Config) -> Result<()> {
    let cache = KnowledgeBaseCache::new(create_source(config)?);
    let kb = cache.load().await;
    let stats = KnowledgeBaseStats::from_kb(&kb);

    println!("Knowledge Base Stats");
    println!("====================");
    println!();
    println!("  Source:      {}", cache.source_label());
    println!(
        "  Fingerprint: {}",
        stats.fingerprint.as_deref().unwrap_or("-")
    );
    println!();
    println!("  Algorithms:       {}", stats.algorithms);
    println!("  Clinical details: {}", stats.clinical_details);
    println!("  Breed risks:      {}", stats.breed_risks);

    if !stats.by_group.is_empty() {
        println!();
        println!("  {:<16} {:>8}", "GROUP", "COUNT");
        for (group, count) in &stats.by_group {
            println!("  {:<16} {:>8}", group, count);
        }
    }

    if !stats.by_user_level.is_empty() {
        println!();
        println!("  {:<16} {:>8}", "USER LEVEL", "COUNT");
        for (level, count) in &stats.by_user_level {
            println!("  {:<16} {:>8}", level, count);
        }
    }

    if !stats.duplicate_ids.is_empty() {
        println!();
        println!("  Duplicate algorithm ids:");
        for dup in &stats.duplicate_ids {
            println!("    {} (x{})", dup.id, dup.count);
        }
    }

    Ok(())
}
