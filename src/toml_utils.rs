// -- imports
use serde::Deserialize;
use std::path::Path;

use crate::client::InferenceArgs;
use crate::count::CountArgs;
use crate::error::{AppError, Result};
use crate::source::Source;

// -- config

#[derive(Debug, Deserialize, Default)]
#[serde(default)]
struct TomlConfig {
    inference: InferenceArgs,
    count: CountArgs,
}

impl TomlConfig {
    /// Parse TOML config file with explicit project root for path resolution.
    ///
    /// # Arguments
    ///
    /// * `toml_path` - Path to the TOML config file
    /// * `project_root` - Base directory for resolving relative paths
    ///
    /// # Errors
    ///
    /// Returns `AppError` if:
    /// - The path is not a valid toml file
    /// - File read fails
    /// - TOML parsing fails
    pub fn from_toml(toml_path: &Path, project_root: &Path) -> Result<Self> {
        if !toml_path.is_file() || toml_path.extension().is_none_or(|ext| ext != "toml") {
            return Err(AppError::Config(format!(
                "TOML config path is not a valid .toml file: {:?}",
                toml_path
            )));
        }

        let content = std::fs::read_to_string(toml_path)?;
        let mut config: Self = toml::from_str(&content)?;
        config.resolve_paths(project_root);

        // Transfer inference config to count args
        config.count.inference = config.inference.clone();

        Ok(config)
    }

    /// Resolve relative paths against project root
    fn resolve_paths(&mut self, project_root: &Path) {
        self.count.source = match &self.count.source {
            Source::ImagePath(p) if !p.is_absolute() => Source::ImagePath(project_root.join(p)),
            Source::Directory(p) if !p.is_absolute() => Source::Directory(project_root.join(p)),
            Source::ImagePathVec(paths) => Source::ImagePathVec(
                paths
                    .iter()
                    .map(|p| {
                        if p.is_absolute() {
                            p.clone()
                        } else {
                            project_root.join(p)
                        }
                    })
                    .collect(),
            ),
            _ => self.count.source.clone(),
        };

        // A relative directory only classifies correctly once joined to the root
        if let Source::ImagePath(p) = &self.count.source
            && p.is_dir()
        {
            self.count.source = Source::Directory(p.clone());
        }
    }
}

impl From<TomlConfig> for CountArgs {
    fn from(config: TomlConfig) -> Self {
        config.count
    }
}

// -- public API

/// Parse TOML config file and return CountArgs.
///
/// # Arguments
///
/// * `toml_path` - Path to the TOML config file
/// * `project_root` - Base directory for resolving relative paths
///
/// # Errors
///
/// Returns `AppError` if TOML parsing or path resolution fails.
pub fn parse_toml(toml_path: &Path, project_root: &Path) -> Result<CountArgs> {
    TomlConfig::from_toml(toml_path, project_root).map(Into::into)
}

// -- tests

#[cfg(test)]
mod tests {
    use super::*;
    use crate::count::PrintFormat;
    use std::fs;
    use std::path::PathBuf;
    use tempfile::TempDir;

    #[test]
    fn test_from_toml_with_custom_values() {
        let temp_dir = TempDir::new().unwrap();
        let toml_path = temp_dir.path().join("config.toml");
        let toml_content = r#"
[inference]
endpoint = "https://api-inference.huggingface.co/models/google/vit-base-patch16-224"
token = "hf_abc"
timeout_secs = 60
retries = 2
retry_backoff_ms = 250
check_status = true
content_type = "image/jpeg"

[count]
source = "data/bike/1/ride.jpg"
label = "Egyptian cat"
reuse_predictions = true
print_format = "Pretty"
verbose = true
"#;
        fs::write(&toml_path, toml_content).unwrap();

        let config = TomlConfig::from_toml(&toml_path, temp_dir.path()).unwrap();

        assert!(config.inference.endpoint.ends_with("vit-base-patch16-224"));
        assert_eq!(config.inference.token, "hf_abc");
        assert_eq!(config.inference.timeout_secs, Some(60));
        assert_eq!(config.inference.retries, 2);
        assert_eq!(config.inference.retry_backoff_ms, 250);
        assert!(config.inference.check_status);
        assert_eq!(config.inference.content_type.as_deref(), Some("image/jpeg"));

        assert_eq!(config.count.label, "Egyptian cat");
        assert!(config.count.reuse_predictions);
        assert_eq!(config.count.print_format, PrintFormat::Pretty);
        assert!(config.count.verbose);
        match &config.count.source {
            Source::ImagePath(p) => {
                assert_eq!(p, &temp_dir.path().join("data/bike/1/ride.jpg"))
            }
            other => panic!("Expected ImagePath, got {:?}", other),
        }
    }

    #[test]
    fn test_parse_toml_returns_count_args_with_inference() {
        let temp_dir = TempDir::new().unwrap();
        let toml_path = temp_dir.path().join("config.toml");
        let toml_content = r#"
[inference]
token = "hf_abc"

[count]
label = "bicycle"
"#;
        fs::write(&toml_path, toml_content).unwrap();

        let args = parse_toml(&toml_path, temp_dir.path()).unwrap();

        assert_eq!(args.label, "bicycle");
        assert_eq!(args.inference.token, "hf_abc");
        assert_eq!(args.inference.endpoint, crate::client::DEFAULT_ENDPOINT);
        assert!(args.inference.timeout_secs.is_none());
        assert!(!args.inference.check_status);
        assert_eq!(args.print_format, PrintFormat::Compact);
    }

    #[test]
    fn test_relative_directory_source_is_resolved() {
        let temp_dir = TempDir::new().unwrap();
        fs::create_dir_all(temp_dir.path().join("data/bike")).unwrap();
        let toml_path = temp_dir.path().join("config.toml");
        fs::write(&toml_path, "[count]\nsource = \"data/bike\"\n").unwrap();

        let args = parse_toml(&toml_path, temp_dir.path()).unwrap();

        match args.source {
            Source::Directory(p) => assert_eq!(p, temp_dir.path().join("data/bike")),
            other => panic!("Expected Directory, got {:?}", other),
        }
    }

    #[test]
    fn test_source_list_is_resolved() {
        let temp_dir = TempDir::new().unwrap();
        let toml_path = temp_dir.path().join("config.toml");
        fs::write(
            &toml_path,
            "[count]\nsource = [\"a.jpg\", \"/abs/b.jpg\"]\n",
        )
        .unwrap();

        let args = parse_toml(&toml_path, temp_dir.path()).unwrap();

        match args.source {
            Source::ImagePathVec(paths) => {
                assert_eq!(paths[0], temp_dir.path().join("a.jpg"));
                assert_eq!(paths[1], PathBuf::from("/abs/b.jpg"));
            }
            other => panic!("Expected ImagePathVec, got {:?}", other),
        }
    }

    #[test]
    fn test_unknown_print_format_is_rejected() {
        let temp_dir = TempDir::new().unwrap();
        let toml_path = temp_dir.path().join("config.toml");
        fs::write(&toml_path, "[count]\nprint_format = \"Yaml\"\n").unwrap();

        let err = parse_toml(&toml_path, temp_dir.path()).unwrap_err();
        assert!(matches!(err, AppError::TomlConfig(_)));
        assert!(err.to_string().contains("Compact"));
    }

    #[test]
    fn test_from_toml_invalid_path() {
        let invalid_path = PathBuf::from("/nonexistent/config.toml");
        let project_root = PathBuf::from("/tmp");
        assert!(TomlConfig::from_toml(&invalid_path, &project_root).is_err());
    }

    #[test]
    fn test_from_toml_invalid_extension() {
        let temp_dir = TempDir::new().unwrap();
        let invalid_path = temp_dir.path().join("config.txt");
        fs::write(&invalid_path, "[count]\nlabel = \"bicycle\"\n").unwrap();
        assert!(TomlConfig::from_toml(&invalid_path, temp_dir.path()).is_err());
    }

    #[test]
    fn test_parse_toml_invalid_toml() {
        let temp_dir = TempDir::new().unwrap();
        let invalid_toml_path = temp_dir.path().join("invalid.toml");
        fs::write(&invalid_toml_path, "invalid toml [[[").unwrap();
        assert!(parse_toml(&invalid_toml_path, temp_dir.path()).is_err());
    }

    #[test]
    fn test_from_toml_with_empty_source() {
        let temp_dir = TempDir::new().unwrap();
        let toml_path = temp_dir.path().join("config.toml");
        fs::write(&toml_path, "[count]\nsource = \"\"\n").unwrap();

        let config = TomlConfig::from_toml(&toml_path, temp_dir.path()).unwrap();

        // Empty source string should become None
        assert!(config.count.source.is_none());
    }
}
