use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(default)]
    pub tools: ToolsConfig,
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub alignment: AlignmentConfig,
    #[serde(default)]
    pub progress: ProgressConfig,
}

/// Binary names (or absolute paths) of the external tools
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ToolsConfig {
    pub makeblastdb: String,
    pub mafft: String,
    pub muscle: String,
    pub hmmbuild: String,
    pub fas_annotate: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct IndexConfig {
    /// `-dbtype` passed to the database builder
    pub db_type: String,
    /// Extension of the index file whose presence marks a finished build
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct AlignmentConfig {
    pub mafft_args: Vec<String>,
    pub hmmbuild_cpus: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    pub show_bars: bool,
}

impl Default for ToolsConfig {
    fn default() -> Self {
        Self {
            makeblastdb: "makeblastdb".to_string(),
            mafft: "mafft".to_string(),
            muscle: "muscle".to_string(),
            hmmbuild: "hmmbuild".to_string(),
            fas_annotate: "fas.doAnno".to_string(),
        }
    }
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            db_type: "prot".to_string(),
            extension: "phr".to_string(),
        }
    }
}

impl Default for AlignmentConfig {
    fn default() -> Self {
        Self {
            mafft_args: ["--quiet", "--localpair", "--maxiterate", "1000"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            hmmbuild_cpus: 1,
        }
    }
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self { show_bars: true }
    }
}

pub fn default_config() -> PipelineConfig {
    PipelineConfig::default()
}

pub fn load_config<P: AsRef<Path>>(path: P) -> Result<PipelineConfig, crate::OrthoprepError> {
    let contents = std::fs::read_to_string(path)?;
    let config: PipelineConfig = toml::from_str(&contents)
        .map_err(|e| crate::OrthoprepError::Config(format!("Failed to parse config: {}", e)))?;
    Ok(config)
}

pub fn save_config<P: AsRef<Path>>(path: P, config: &PipelineConfig) -> Result<(), crate::OrthoprepError> {
    let contents = toml::to_string_pretty(config)
        .map_err(|e| crate::OrthoprepError::Config(format!("Failed to serialize config: {}", e)))?;
    std::fs::write(path, contents)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_partial_config_keeps_defaults() {
        let config: PipelineConfig = toml::from_str(
            r#"
            [tools]
            mafft = "/opt/mafft/bin/mafft"

            [index]
            extension = "pin"
            "#,
        )
        .unwrap();

        assert_eq!(config.tools.mafft, "/opt/mafft/bin/mafft");
        assert_eq!(config.tools.hmmbuild, "hmmbuild");
        assert_eq!(config.index.extension, "pin");
        assert_eq!(config.index.db_type, "prot");
        assert!(config.progress.show_bars);
    }

    #[test]
    fn test_save_and_load_config() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("orthoprep.toml");
        let mut config = default_config();
        config.alignment.hmmbuild_cpus = 2;

        save_config(&path, &config).unwrap();
        assert_eq!(load_config(&path).unwrap(), config);
    }

    #[test]
    fn test_invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("bad.toml");
        std::fs::write(&path, "[tools\nmafft = ").unwrap();

        assert!(matches!(load_config(&path), Err(crate::OrthoprepError::Config(_))));
    }
}
