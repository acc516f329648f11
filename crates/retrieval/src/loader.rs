use std::io::ErrorKind;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use tracing::{info, warn};
use transit_core::{Chunk, SourceTag, TrainRecord};

use crate::chunking::TextSplitter;

pub const DEFAULT_SCHEDULE_PATH: &str = "train_data.json";
pub const DEFAULT_POLICY_PATH: &str = "policies.txt";

#[derive(Debug, Clone)]
pub struct DocumentSources {
    pub schedule_path: PathBuf,
    pub policy_path: PathBuf,
}

impl Default for DocumentSources {
    fn default() -> Self {
        Self {
            schedule_path: PathBuf::from(DEFAULT_SCHEDULE_PATH),
            policy_path: PathBuf::from(DEFAULT_POLICY_PATH),
        }
    }
}

/// Schedule chunks first, in file order, then policy windows.
pub fn load(sources: &DocumentSources, splitter: &TextSplitter) -> Result<Vec<Chunk>> {
    let mut chunks = load_schedule(&sources.schedule_path)?;
    chunks.extend(load_policies(&sources.policy_path, splitter)?);
    Ok(chunks)
}

pub fn load_schedule(path: &Path) -> Result<Vec<Chunk>> {
    let Some(raw) = read_optional(path)? else {
        return Ok(Vec::new());
    };

    let records = serde_json::from_str::<Vec<TrainRecord>>(&raw)
        .with_context(|| format!("failed parsing train schedule: {}", path.display()))?;

    let chunks = records
        .iter()
        .map(|record| Chunk::new(record.describe(), SourceTag::Schedule))
        .collect::<Vec<_>>();

    info!(path = %path.display(), chunks = chunks.len(), "schedule loaded");
    Ok(chunks)
}

pub fn load_policies(path: &Path, splitter: &TextSplitter) -> Result<Vec<Chunk>> {
    let Some(raw) = read_optional(path)? else {
        return Ok(Vec::new());
    };

    let chunks = splitter
        .split(&raw)
        .into_iter()
        .map(|window| window.text.trim().to_string())
        .filter(|text| !text.is_empty())
        .map(|text| Chunk::new(text, SourceTag::Policy))
        .collect::<Vec<_>>();

    info!(path = %path.display(), chunks = chunks.len(), "policies loaded");
    Ok(chunks)
}

fn read_optional(path: &Path) -> Result<Option<String>> {
    match std::fs::read_to_string(path) {
        Ok(raw) => Ok(Some(raw)),
        Err(err) if err.kind() == ErrorKind::NotFound => {
            warn!(path = %path.display(), "source file not found, skipping");
            Ok(None)
        }
        Err(err) => {
            Err(err).with_context(|| format!("failed reading source file: {}", path.display()))
        }
    }
}
