use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Granularity of lookup results
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Scope {
    /// Every discovered repository
    Repository,
    /// First repository seen per owning project
    Project,
}

impl Scope {
    pub fn dedups_by_project(&self) -> bool {
        matches!(self, Scope::Project)
    }
}

impl fmt::Display for Scope {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scope::Repository => write!(f, "repository"),
            Scope::Project => write!(f, "project"),
        }
    }
}

impl FromStr for Scope {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "repository" | "repo" => Ok(Scope::Repository),
            "project" => Ok(Scope::Project),
            other => Err(format!("unknown scope '{}', expected 'repository' or 'project'", other)),
        }
    }
}
