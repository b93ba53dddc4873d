// ⚙️ Configuration - data file locations + linking policy
//
// Precedence: defaults < environment (`.env` honoured by the binary) < CLI flags

use crate::database::UnresolvedPolicy;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

pub const NEO_FILE_VAR: &str = "NEO_FILE";
pub const CAD_FILE_VAR: &str = "CAD_FILE";
pub const POLICY_VAR: &str = "NEO_UNRESOLVED_POLICY";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// NEO CSV (`neos.csv`)
    pub neo_file: PathBuf,
    /// Close-approach JSON (`cad.json`)
    pub cad_file: PathBuf,
    pub unresolved: UnresolvedPolicy,
}

impl Default for Config {
    fn default() -> Self {
        Config {
            neo_file: PathBuf::from("data/neos.csv"),
            cad_file: PathBuf::from("data/cad.json"),
            unresolved: UnresolvedPolicy::default(),
        }
    }
}

impl Config {
    /// Defaults overridden by the process environment
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Defaults overridden by whatever `lookup` returns
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let mut config = Config::default();

        if let Some(path) = lookup(NEO_FILE_VAR) {
            config.neo_file = PathBuf::from(path);
        }
        if let Some(path) = lookup(CAD_FILE_VAR) {
            config.cad_file = PathBuf::from(path);
        }
        if let Some(policy) = lookup(POLICY_VAR) {
            config.unresolved = policy
                .parse::<UnresolvedPolicy>()
                .with_context(|| format!("Invalid {}", POLICY_VAR))?;
        }

        Ok(config)
    }
}
