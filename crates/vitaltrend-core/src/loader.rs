//! Export file discovery and loading
//!
//! Files are read and decoded in parallel, then merged in path order so the
//! last-write-wins rule of the aligner follows a deterministic file order.

use crate::{parse_dataset, CoreError, Dataset};
use rayon::prelude::*;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// Outcome of loading a set of export files
#[derive(Debug, Default)]
pub struct LoadResult {
    pub dataset: Dataset,
    pub files_loaded: usize,
    pub files_skipped: Vec<PathBuf>,
}

fn is_export_file(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|ext| ext.to_str())
            .is_some_and(|ext| ext.eq_ignore_ascii_case("json"))
}

/// Every `*.json` file under `root`, sorted by path.
///
/// A file root is returned as-is regardless of its extension. A missing root
/// yields nothing.
pub fn scan_exports(root: &Path) -> Vec<PathBuf> {
    if root.is_file() {
        return vec![root.to_path_buf()];
    }
    if !root.exists() {
        return Vec::new();
    }

    let mut files: Vec<PathBuf> = WalkDir::new(root)
        .into_iter()
        .filter_map(|e| e.ok())
        .map(|e| e.into_path())
        .filter(|path| is_export_file(path))
        .collect();
    files.sort();
    files
}

/// Scan several roots, keeping root order and dropping repeated paths.
pub fn scan_all(roots: &[PathBuf]) -> Vec<PathBuf> {
    let mut seen = std::collections::HashSet::new();
    roots
        .iter()
        .flat_map(|root| scan_exports(root))
        .filter(|path| seen.insert(path.clone()))
        .collect()
}

pub fn load_dataset_file(path: &Path) -> Result<Dataset, CoreError> {
    let text = std::fs::read_to_string(path).map_err(|source| CoreError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(parse_dataset(&text))
}

/// Load `paths` in parallel and merge them in the given order.
pub fn load_exports(paths: &[PathBuf]) -> LoadResult {
    let loaded: Vec<(PathBuf, Result<Dataset, CoreError>)> = paths
        .par_iter()
        .map(|path| (path.clone(), load_dataset_file(path)))
        .collect();

    let mut result = LoadResult::default();
    for (path, outcome) in loaded {
        match outcome {
            Ok(dataset) => {
                tracing::debug!(
                    path = %path.display(),
                    weight = dataset.weight.len(),
                    heart_rate = dataset.heart_rate.len(),
                    activity = dataset.activity.len(),
                    sleep = dataset.sleep.len(),
                    discarded = dataset.discarded.total(),
                    "loaded export"
                );
                result.dataset.extend(dataset);
                result.files_loaded += 1;
            }
            Err(e) => {
                tracing::warn!(error = %e, "skipping unreadable export");
                result.files_skipped.push(path);
            }
        }
    }
    result
}
