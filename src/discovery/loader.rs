//! Turning a path into a normalized workflow

use crate::adapters::{adapter_for, AdapterContext};
use crate::core::{RunnerError, RunnerResult, Vendor, Workflow};
use crate::discovery::selector::Selector;
use crate::discovery::{detect_by_path, detect_content, find_candidates};
use std::path::{Component, Path, PathBuf};
use tracing::{debug, info, warn};

/// What the caller asked to load
#[derive(Debug, Clone, Default)]
pub struct LoadRequest {
    /// A pipeline file, or a directory to search
    pub path: PathBuf,
    /// Skip detection and use this vendor's adapter
    pub vendor: Option<Vendor>,
    /// Workflow to pick when a document (or directory) holds several
    pub workflow: Option<String>,
}

impl LoadRequest {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            ..Default::default()
        }
    }

    pub fn with_vendor(mut self, vendor: Option<Vendor>) -> Self {
        self.vendor = vendor;
        self
    }

    pub fn with_workflow(mut self, workflow: Option<String>) -> Self {
        self.workflow = workflow;
        self
    }
}

/// A workflow ready to run
#[derive(Debug, Clone)]
pub struct LoadedPipeline {
    pub workflow: Workflow,
    /// The document it came from
    pub path: PathBuf,
    /// Directory scripts run in by default
    pub workspace: PathBuf,
}

/// Every workflow of one document
#[derive(Debug, Clone)]
pub struct LoadedDocument {
    pub vendor: Vendor,
    pub path: PathBuf,
    pub workspace: PathBuf,
    pub workflows: Vec<Workflow>,
}

pub struct PipelineLoader {
    selector: Box<dyn Selector>,
}

impl PipelineLoader {
    pub fn new(selector: impl Selector + 'static) -> Self {
        Self {
            selector: Box::new(selector),
        }
    }

    /// Resolve, decode and normalize the requested workflow.
    ///
    /// Returns `Ok(None)` when the selector declined to choose.
    pub fn load(&self, request: &LoadRequest) -> RunnerResult<Option<LoadedPipeline>> {
        let Some(path) = self.resolve_file(request)? else {
            return Ok(None);
        };
        let document = self.load_document(&path, request.vendor)?;
        let LoadedDocument {
            vendor,
            path,
            workspace,
            mut workflows,
        } = document;

        let index = match (&request.workflow, vendor) {
            (Some(_), Vendor::Azure) => {
                warn!("Azure pipelines hold a single workflow; ignoring --workflow");
                Some(0)
            }
            (Some(name), _) => Some(find_workflow(&workflows, name)?),
            (None, _) if workflows.len() == 1 => Some(0),
            (None, _) if workflows.is_empty() => {
                return Err(RunnerError::NoPipelineFound(path));
            }
            (None, _) => {
                let labels: Vec<String> = workflows.iter().map(workflow_label).collect();
                self.selector.select("Select a workflow to run", &labels)
            }
        };

        Ok(index.map(|i| LoadedPipeline {
            workflow: workflows.swap_remove(i),
            path,
            workspace,
        }))
    }

    /// Pick the pipeline file for a request; `Ok(None)` when nothing was chosen
    pub fn resolve_file(&self, request: &LoadRequest) -> RunnerResult<Option<PathBuf>> {
        let path = &request.path;
        if path.is_file() {
            return Ok(Some(path.clone()));
        }
        if !path.is_dir() {
            return Err(RunnerError::Io {
                path: path.clone(),
                source: std::io::Error::new(std::io::ErrorKind::NotFound, "no such file or directory"),
            });
        }

        let mut candidates = find_candidates(path);
        if let Some(vendor) = request.vendor {
            candidates.retain(|c| detect_by_path(c) == Some(vendor));
        }
        debug!("Found {} candidate file(s) in {}", candidates.len(), path.display());

        if let Some(name) = &request.workflow {
            if let Some(found) = candidates
                .iter()
                .find(|c| c.file_stem().and_then(|s| s.to_str()) == Some(name.as_str()))
            {
                return Ok(Some(found.clone()));
            }
        }

        match candidates.len() {
            0 => Err(RunnerError::NoPipelineFound(path.clone())),
            1 => Ok(candidates.pop()),
            _ => {
                let labels: Vec<String> = candidates
                    .iter()
                    .map(|c| c.strip_prefix(path).unwrap_or(c).display().to_string())
                    .collect();
                Ok(self
                    .selector
                    .select("Select a pipeline file", &labels)
                    .map(|i| candidates.swap_remove(i)))
            }
        }
    }

    /// Decode one document into all of its workflows
    pub fn load_document(&self, path: &Path, vendor: Option<Vendor>) -> RunnerResult<LoadedDocument> {
        let content = std::fs::read_to_string(path).map_err(|source| RunnerError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        let vendor = vendor
            .or_else(|| detect_by_path(path))
            .or_else(|| detect_content(&content))
            .ok_or_else(|| RunnerError::UnknownVendor(path.to_path_buf()))?;
        info!("Loading {} as {}", path.display(), vendor);

        let workspace = infer_workspace(path);
        let mut ctx = AdapterContext::new(&workspace);
        if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
            ctx = ctx.with_document_name(stem);
        }

        let workflows = adapter_for(vendor).normalize(&content, &ctx)?;
        Ok(LoadedDocument {
            vendor,
            path: path.to_path_buf(),
            workspace,
            workflows,
        })
    }
}

fn find_workflow(workflows: &[Workflow], name: &str) -> RunnerResult<usize> {
    workflows
        .iter()
        .position(|w| w.id == name)
        .or_else(|| {
            workflows.iter().position(|w| {
                w.name
                    .as_deref()
                    .is_some_and(|n| n.eq_ignore_ascii_case(name))
            })
        })
        .ok_or_else(|| RunnerError::UnknownWorkflow {
            name: name.to_string(),
            available: workflows
                .iter()
                .map(|w| w.id.as_str())
                .collect::<Vec<_>>()
                .join(", "),
        })
}

fn workflow_label(workflow: &Workflow) -> String {
    match &workflow.name {
        Some(name) if *name != workflow.id => format!("{} ({})", workflow.id, name),
        _ => workflow.id.clone(),
    }
}

/// Repository root for a pipeline file: the parent of `.github` or
/// `.azure-pipelines` when the file lives under one, else its directory
pub fn infer_workspace(path: &Path) -> PathBuf {
    let absolute = std::fs::canonicalize(path).unwrap_or_else(|_| path.to_path_buf());
    let mut root = PathBuf::new();
    for component in absolute.components() {
        if let Component::Normal(part) = component {
            if part == ".github" || part == ".azure-pipelines" {
                return normalize_dir(root);
            }
        }
        root.push(component);
    }
    normalize_dir(absolute.parent().map(Path::to_path_buf).unwrap_or_default())
}

fn normalize_dir(dir: PathBuf) -> PathBuf {
    if dir.as_os_str().is_empty() {
        PathBuf::from(".")
    } else {
        dir
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::discovery::selector::FirstCandidate;
    use std::fs;

    struct Decline;

    impl Selector for Decline {
        fn select(&self, _prompt: &str, _candidates: &[String]) -> Option<usize> {
            None
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("localci-{}-{}", tag, uuid::Uuid::new_v4()));
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    const CODEMAGIC: &str = "workflows:\n  android:\n    scripts: [echo a]\n  ios:\n    name: iOS\n    scripts: [echo i]\n";

    #[test]
    fn test_load_named_codemagic_workflow() {
        let dir = temp_dir("cm");
        fs::write(dir.join("codemagic.yaml"), CODEMAGIC).unwrap();

        let loader = PipelineLoader::new(Decline);
        let request = LoadRequest::new(&dir).with_workflow(Some("ios".to_string()));
        let loaded = loader.load(&request).unwrap().unwrap();
        assert_eq!(loaded.workflow.id, "ios");
        assert_eq!(loaded.workflow.vendor, Vendor::CodeMagic);

        let request = LoadRequest::new(&dir).with_workflow(Some("web".to_string()));
        let err = loader.load(&request).unwrap_err();
        assert!(matches!(err, RunnerError::UnknownWorkflow { ref available, .. } if available == "android, ios"));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_declined_selection_is_none() {
        let dir = temp_dir("decline");
        fs::write(dir.join("codemagic.yaml"), CODEMAGIC).unwrap();

        let loaded = PipelineLoader::new(Decline).load(&LoadRequest::new(&dir)).unwrap();
        assert!(loaded.is_none());

        let loaded = PipelineLoader::new(FirstCandidate)
            .load(&LoadRequest::new(&dir))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.workflow.id, "android");

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_github_directory_picks_by_file_stem() {
        let dir = temp_dir("gh");
        let workflows = dir.join(".github/workflows");
        fs::create_dir_all(&workflows).unwrap();
        fs::write(workflows.join("build.yml"), "on: push\njobs:\n  b:\n    steps: []\n").unwrap();
        fs::write(workflows.join("release.yml"), "on: push\njobs:\n  r:\n    steps: []\n").unwrap();

        let request = LoadRequest::new(&dir).with_workflow(Some("release".to_string()));
        let loaded = PipelineLoader::new(Decline).load(&request).unwrap().unwrap();
        assert_eq!(loaded.workflow.units[0].name, "r");
        assert_eq!(
            fs::canonicalize(&loaded.workspace).unwrap(),
            fs::canonicalize(&dir).unwrap()
        );

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_unknown_vendor_and_missing_path() {
        let dir = temp_dir("unknown");
        let file = dir.join("pipeline.yml");
        fs::write(&file, "name: nothing here\n").unwrap();

        let loader = PipelineLoader::new(Decline);
        let err = loader.load(&LoadRequest::new(&file)).unwrap_err();
        assert!(matches!(err, RunnerError::UnknownVendor(_)));

        let err = loader.load(&LoadRequest::new(dir.join("missing.yml"))).unwrap_err();
        assert!(matches!(err, RunnerError::Io { .. }));

        let err = loader.load(&LoadRequest::new(&dir)).unwrap_err();
        assert!(matches!(err, RunnerError::NoPipelineFound(_)));

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn test_forced_vendor_skips_detection() {
        let dir = temp_dir("forced");
        let file = dir.join("pipeline.yml");
        fs::write(&file, "steps:\n  - script: echo hi\n").unwrap();

        let loaded = PipelineLoader::new(Decline)
            .load(&LoadRequest::new(&file).with_vendor(Some(Vendor::Azure)))
            .unwrap()
            .unwrap();
        assert_eq!(loaded.workflow.vendor, Vendor::Azure);
        assert_eq!(loaded.workflow.id, "pipeline");

        fs::remove_dir_all(&dir).unwrap();
    }
}
