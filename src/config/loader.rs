//! Pipeline file discovery and loading.

use crate::config::schema::PipelineConfig;
use crate::config::validator::validate;
use crate::error::{PipegraphError, Result};
use std::fs;
use std::path::{Path, PathBuf};

/// Default pipeline file name, looked up in the working directory.
pub const DEFAULT_PIPELINE_FILE: &str = "pipeline.yml";

/// A parsed, validated pipeline and the directory it was loaded from.
#[derive(Debug, Clone)]
pub struct LoadedPipeline {
    pub config: PipelineConfig,
    /// Directory relative paths in the pipeline resolve against.
    pub root: PathBuf,
}

/// Resolve the pipeline path from an optional override.
pub fn pipeline_path(explicit: Option<&Path>, cwd: &Path) -> PathBuf {
    match explicit {
        Some(path) if path.is_absolute() => path.to_path_buf(),
        Some(path) => cwd.join(path),
        None => cwd.join(DEFAULT_PIPELINE_FILE),
    }
}

/// Load, parse and validate a pipeline file.
///
/// # Errors
///
/// Returns `ConfigNotFound` if the file doesn't exist.
/// Returns `ConfigParseError` if the YAML is invalid.
/// Returns `ConfigValidationError` if the pipeline is inconsistent.
pub fn load_pipeline(path: &Path) -> Result<LoadedPipeline> {
    let content = fs::read_to_string(path).map_err(|e| {
        if e.kind() == std::io::ErrorKind::NotFound {
            PipegraphError::ConfigNotFound {
                path: path.to_path_buf(),
            }
        } else {
            PipegraphError::Io(e)
        }
    })?;

    let config = parse_pipeline(&content, path)?;
    validate(&config)?;

    let root = path
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."));
    Ok(LoadedPipeline { config, root })
}

/// Parse YAML content into a [`PipelineConfig`].
///
/// # Arguments
///
/// * `content` - The YAML content to parse
/// * `source_path` - Path for error reporting
pub fn parse_pipeline(content: &str, source_path: &Path) -> Result<PipelineConfig> {
    serde_yaml::from_str(content).map_err(|e| PipegraphError::ConfigParseError {
        path: source_path.to_path_buf(),
        message: e.to_string(),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_file_is_config_not_found() {
        let temp = TempDir::new().unwrap();
        let err = load_pipeline(&temp.path().join("pipeline.yml")).unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigNotFound { .. }));
    }

    #[test]
    fn invalid_yaml_is_parse_error() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.yml");
        fs::write(&path, "steps: [unclosed").unwrap();
        let err = load_pipeline(&path).unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigParseError { .. }));
    }

    #[test]
    fn loads_and_records_root() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.yml");
        fs::write(&path, "name: ci\nsteps:\n  - name: a\n    command: 'true'\n").unwrap();

        let loaded = load_pipeline(&path).unwrap();
        assert_eq!(loaded.config.name.as_deref(), Some("ci"));
        assert_eq!(loaded.root, temp.path());
    }

    #[test]
    fn validation_runs_on_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("pipeline.yml");
        fs::write(&path, "steps:\n  - name: a\n    command: ''\n").unwrap();
        let err = load_pipeline(&path).unwrap_err();
        assert!(matches!(err, PipegraphError::ConfigValidationError { .. }));
    }

    #[test]
    fn pipeline_path_defaults_to_cwd() {
        let cwd = Path::new("/work");
        assert_eq!(pipeline_path(None, cwd), PathBuf::from("/work/pipeline.yml"));
        assert_eq!(
            pipeline_path(Some(Path::new("ci/p.yml")), cwd),
            PathBuf::from("/work/ci/p.yml")
        );
        assert_eq!(
            pipeline_path(Some(Path::new("/abs/p.yml")), cwd),
            PathBuf::from("/abs/p.yml")
        );
    }
}
