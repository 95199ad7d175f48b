//! # Configuration
//!
//! The configuration file is TOML and lists the hosting instances the tool
//! knows about:
//!
//! ```toml
//! [[instance]]
//! name = "mathhub"
//! remote = "https://gl.mathhub.info"
//! data_root = "/home/me/MathHub"   # optional
//! listing = "gitlab"               # optional, the only listing backend
//! page_size = 100                  # optional
//! token = "glpat-..."              # optional, for private listings
//! ```
//!
//! A missing file is not an error: the built-in default with a single
//! `mathhub` instance is used instead.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use url::Url;

use crate::defaults::{
    default_data_root, DEFAULT_INSTANCE_NAME, DEFAULT_PAGE_SIZE, DEFAULT_REMOTE,
};
use crate::error::{Error, Result};

/// Which listing API a remote instance speaks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ListingKind {
    #[default]
    Gitlab,
}

fn default_page_size() -> usize {
    DEFAULT_PAGE_SIZE
}

/// One hosting instance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct InstanceConfig {
    /// Unique name used to address the instance on the command line.
    pub name: String,
    /// Base URL of the hosting service.
    pub remote: String,
    /// Where archives of this instance are installed.
    #[serde(default)]
    pub data_root: Option<PathBuf>,
    #[serde(default)]
    pub listing: ListingKind,
    #[serde(default = "default_page_size")]
    pub page_size: usize,
    /// API token sent with listing requests.
    #[serde(default)]
    pub token: Option<String>,
}

impl InstanceConfig {
    /// The configured data root, or the platform default for this instance.
    pub fn data_root(&self) -> PathBuf {
        self.data_root
            .clone()
            .unwrap_or_else(|| default_data_root(&self.name))
    }

    /// Host name of the remote, e.g. `gl.mathhub.info`.
    pub fn hostname(&self) -> Result<String> {
        let url = Url::parse(&self.remote)?;
        url.host_str()
            .map(str::to_string)
            .ok_or_else(|| Error::ConfigParse {
                message: format!("instance '{}' has no host in '{}'", self.name, self.remote),
                hint: Some("use an absolute URL such as https://gitlab.example.org".to_string()),
            })
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    #[serde(default, rename = "instance")]
    pub instances: Vec<InstanceConfig>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            instances: vec![InstanceConfig {
                name: DEFAULT_INSTANCE_NAME.to_string(),
                remote: DEFAULT_REMOTE.to_string(),
                data_root: None,
                listing: ListingKind::Gitlab,
                page_size: DEFAULT_PAGE_SIZE,
                token: None,
            }],
        }
    }
}

impl Config {
    /// Parse and validate configuration text.
    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = toml::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    /// Load the configuration at `path`, falling back to the default when
    /// the file does not exist.
    pub fn from_file(path: &Path) -> Result<Self> {
        if !path.exists() {
            log::debug!("No configuration at {}, using defaults", path.display());
            return Ok(Self::default());
        }
        Self::parse(&fs::read_to_string(path)?)
    }

    pub fn instance(&self, name: &str) -> Option<&InstanceConfig> {
        self.instances.iter().find(|i| i.name == name)
    }

    fn validate(&self) -> Result<()> {
        if self.instances.is_empty() {
            return Err(Error::ConfigParse {
                message: "no instances configured".to_string(),
                hint: Some("add at least one [[instance]] table".to_string()),
            });
        }

        let mut names = HashSet::new();
        for instance in &self.instances {
            if !names.insert(instance.name.as_str()) {
                return Err(Error::ConfigParse {
                    message: format!("duplicate instance name '{}'", instance.name),
                    hint: None,
                });
            }
            if instance.page_size == 0 {
                return Err(Error::ConfigParse {
                    message: format!("instance '{}' has page_size = 0", instance.name),
                    hint: Some("page_size must be at least 1".to_string()),
                });
            }
            instance.hostname()?;
        }
        Ok(())
    }
}
