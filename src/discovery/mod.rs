//! Pipeline file discovery and vendor detection

pub mod loader;
pub mod selector;

use crate::core::Vendor;
use serde_yaml::Value;
use std::path::{Component, Path, PathBuf};
use tracing::debug;

pub use loader::{infer_workspace, LoadRequest, LoadedDocument, LoadedPipeline, PipelineLoader};
pub use selector::{FirstCandidate, Selector, TerminalSelector};

/// File names looked for at the root of a directory, in this order
pub const KNOWN_FILES: [&str; 4] = [
    "codemagic.yaml",
    "codemagic.yml",
    "azure-pipelines.yml",
    "azure-pipelines.yaml",
];

/// Directories whose YAML files are all pipeline candidates
pub const KNOWN_DIRS: [&str; 2] = [".azure-pipelines", ".github/workflows"];

/// Detect the vendor of a file from its path, then from its content
pub fn detect(path: &Path) -> Option<Vendor> {
    if let Some(vendor) = detect_by_path(path) {
        return Some(vendor);
    }
    match std::fs::read_to_string(path) {
        Ok(content) => detect_content(&content),
        Err(e) => {
            debug!("Could not read {} for detection: {}", path.display(), e);
            None
        }
    }
}

/// Path-only heuristics
pub fn detect_by_path(path: &Path) -> Option<Vendor> {
    let file_name = path.file_name()?.to_str()?.to_ascii_lowercase();
    if file_name == "codemagic.yaml" || file_name == "codemagic.yml" {
        return Some(Vendor::CodeMagic);
    }
    if file_name.starts_with("azure-pipelines") && is_yaml(path) {
        return Some(Vendor::Azure);
    }

    let components: Vec<String> = path
        .components()
        .filter_map(|c| match c {
            Component::Normal(part) => part.to_str().map(str::to_string),
            _ => None,
        })
        .collect();
    if components.iter().any(|c| c == ".azure-pipelines") {
        return Some(Vendor::Azure);
    }
    if components
        .windows(2)
        .any(|pair| pair[0] == ".github" && pair[1] == "workflows")
    {
        return Some(Vendor::GitHub);
    }
    None
}

/// Content heuristics over the document's top-level keys
pub fn detect_content(document: &str) -> Option<Vendor> {
    let value: Value = serde_yaml::from_str(document).ok()?;
    let map = value.as_mapping()?;
    let has = |key: &str| map.contains_key(key);

    if has("on") && has("jobs") {
        Some(Vendor::GitHub)
    } else if has("workflows") || has("definitions") {
        Some(Vendor::CodeMagic)
    } else if has("trigger") || has("pr") || has("pool") || has("stages") {
        Some(Vendor::Azure)
    } else if has("steps") || has("jobs") {
        Some(Vendor::Azure)
    } else {
        None
    }
}

/// Candidate pipeline files in `dir`: known names first, then known directories
pub fn find_candidates(dir: &Path) -> Vec<PathBuf> {
    let mut candidates: Vec<PathBuf> = KNOWN_FILES
        .iter()
        .map(|name| dir.join(name))
        .filter(|path| path.is_file())
        .collect();

    for sub in KNOWN_DIRS {
        let Ok(entries) = std::fs::read_dir(dir.join(sub)) else {
            continue;
        };
        let mut files: Vec<PathBuf> = entries
            .filter_map(|entry| entry.ok().map(|e| e.path()))
            .filter(|path| path.is_file() && is_yaml(path))
            .collect();
        files.sort();
        candidates.extend(files);
    }

    candidates
}

fn is_yaml(path: &Path) -> bool {
    matches!(
        path.extension().and_then(|e| e.to_str()),
        Some("yml") | Some("yaml")
    )
}
