//! `getx.toml` configuration.
//!
//! Looked up as `getx.toml` in the working directory, then `~/.getx/config.toml`.
//! Every key is optional:
//!
//! ```toml
//! rules_file = "~/.go-getx-map"
//! primary_branch = "master"
//! gopath = ["/home/me/go"]
//! build_flags = ["-v"]
//!
//! [[rules]]
//! pattern = "gh/([^/]+)/([^/]+)"
//! replace = "https://github.com/$1/$2.git"
//!
//! [defaults]
//! mode = "update"
//! errors = "warn"
//! ```

use crate::fetch::ScanMode;
use crate::report::ErrorPolicy;
use crate::rules::{Rule, RuleError, RuleSet};
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

pub const CONFIG_FILE: &str = "getx.toml";
pub const DEFAULT_RULES_FILE: &str = ".go-getx-map";

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {}: {source}", path.display())]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {}: {source}", path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("invalid inline rule '{pattern}': {source}")]
    InvalidRule {
        pattern: String,
        #[source]
        source: regex::Error,
    },

    #[error(transparent)]
    Rules(#[from] RuleError),
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct GetxConfig {
    pub rules_file: Option<PathBuf>,
    pub rules: Vec<RuleConfig>,
    pub primary_branch: Option<String>,
    pub gopath: Vec<PathBuf>,
    pub build_flags: Vec<String>,
    pub defaults: Defaults,

    /// File this config was read from.
    #[serde(skip)]
    pub source: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Clone)]
pub struct RuleConfig {
    pub pattern: String,
    pub replace: String,
}

#[derive(Deserialize, Debug, Default, Clone)]
#[serde(default)]
pub struct Defaults {
    pub mode: Option<ScanMode>,
    pub install: bool,
    pub hooks: bool,
    pub tagged: bool,
    pub recurse: bool,
    pub errors: Option<ErrorPolicy>,
}

fn expand_home(path: &Path) -> PathBuf {
    match path.strip_prefix("~") {
        Ok(rest) => match dirs::home_dir() {
            Some(home) => home.join(rest),
            None => path.to_path_buf(),
        },
        Err(_) => path.to_path_buf(),
    }
}

/// Config file that applies to `working_dir`, if any.
pub fn find_config(working_dir: &Path) -> Option<PathBuf> {
    let local = working_dir.join(CONFIG_FILE);
    if local.is_file() {
        return Some(local);
    }
    let global = dirs::home_dir()?.join(".getx").join("config.toml");
    global.is_file().then_some(global)
}

impl GetxConfig {
    /// Load the config for `working_dir`; defaults when no file exists.
    pub fn load(working_dir: &Path) -> Result<Self, ConfigError> {
        match find_config(working_dir) {
            Some(path) => Self::from_file(&path),
            None => Ok(Self::default()),
        }
    }

    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let mut config = Self::parse(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        config.source = Some(path.to_path_buf());
        Ok(config)
    }

    pub fn parse(text: &str) -> Result<Self, toml::de::Error> {
        toml::from_str(text)
    }

    /// Rule file location. Relative paths are taken from the config file's directory.
    pub fn rules_path(&self) -> Option<PathBuf> {
        match &self.rules_file {
            Some(path) => {
                let path = expand_home(path);
                if path.is_relative()
                    && let Some(dir) = self.source.as_deref().and_then(Path::parent)
                {
                    return Some(dir.join(path));
                }
                Some(path)
            }
            None => dirs::home_dir().map(|home| home.join(DEFAULT_RULES_FILE)),
        }
    }

    /// Inline rules followed by the rule file's. A missing default rule file is not an
    /// error; a missing configured one is.
    pub fn rule_set(&self) -> Result<RuleSet, ConfigError> {
        let inline = self
            .rules
            .iter()
            .map(|r| {
                Rule::new(&r.pattern, &r.replace).map_err(|source| ConfigError::InvalidRule {
                    pattern: r.pattern.clone(),
                    source,
                })
            })
            .collect::<Result<Vec<_>, _>>()?;
        let mut rules = RuleSet::new(inline);

        if let Some(path) = self.rules_path()
            && (self.rules_file.is_some() || path.is_file())
        {
            rules.extend(RuleSet::load(&path)?);
        }
        Ok(rules)
    }
}
