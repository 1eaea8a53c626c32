//! Common types for external tools

use serde::{Deserialize, Serialize};

/// External programs the pipeline delegates to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Tool {
    MakeBlastDb,
    Mafft,
    Muscle,
    HmmBuild,
    FasAnnotate,
}

impl Tool {
    pub fn name(&self) -> &'static str {
        match self {
            Tool::MakeBlastDb => "makeblastdb",
            Tool::Mafft => "mafft",
            Tool::Muscle => "muscle",
            Tool::HmmBuild => "hmmbuild",
            Tool::FasAnnotate => "fas.doAnno",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Tool::MakeBlastDb => "BLAST+ makeblastdb",
            Tool::Mafft => "MAFFT",
            Tool::Muscle => "MUSCLE",
            Tool::HmmBuild => "HMMER hmmbuild",
            Tool::FasAnnotate => "FAS annotation",
        }
    }
}

impl std::fmt::Display for Tool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Multiple sequence aligner used for ortholog groups
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AlignTool {
    #[default]
    Mafft,
    Muscle,
}

impl AlignTool {
    pub fn tool(&self) -> Tool {
        match self {
            AlignTool::Mafft => Tool::Mafft,
            AlignTool::Muscle => Tool::Muscle,
        }
    }
}

impl std::fmt::Display for AlignTool {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.tool().name())
    }
}

impl std::str::FromStr for AlignTool {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "mafft" => Ok(AlignTool::Mafft),
            "muscle" => Ok(AlignTool::Muscle),
            _ => Err(format!(
                "Unknown alignment tool '{}': must be either mafft or muscle",
                s
            )),
        }
    }
}
