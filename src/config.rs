use clap::Args;
use serde::Deserialize;
use serde_inline_default::serde_inline_default;
use std::path::Path;
use thiserror::Error;
use crate::quant::DEFAULT_BASE_URL;
use crate::target::Overrides;

const DEFAULT_CONFIG: &str = include_str!("../default.toml");

/// Picked up from the working directory when `--config` is not given.
pub const DEFAULT_CONFIG_FILE: &str = "quant.toml";

#[derive(Error, Debug)]
pub enum Error {
    #[error("read {path}: {err}")]
    ReadFile { err: std::io::Error, path: String },

    #[error("parse {path}: {err}")]
    Parse { err: toml::de::Error, path: String },

    #[error("missing required input '{0}'")]
    MissingInput(&'static str),

    #[error("input '{name}' must be a boolean, got '{value}'")]
    InvalidBool { name: &'static str, value: String },
}

/// A quant.toml file. Every field is optional and falls back to the
/// [built-in config](../default.toml).
#[serde_inline_default]
#[derive(Deserialize, Debug, PartialEq, Eq)]
#[serde(deny_unknown_fields)]
pub struct File {
    #[serde_inline_default(DEFAULT_BASE_URL.to_string())]
    pub base_url: String,
    #[serde_inline_default(vec!["main".to_string(), "master".to_string()])]
    pub production_branches: Vec<String>,
    #[serde_inline_default("docker".to_string())]
    pub container_engine: String,
}

impl Default for File {
    fn default() -> Self {
        // The default config is compiled into the program and covered by
        // load_default_configuration below.
        toml::from_str(DEFAULT_CONFIG).expect("built-in default.toml is valid")
    }
}

impl File {
    pub fn from_path(path: &str) -> Result<Self, Error> {
        let content = std::fs::read_to_string(path).map_err(|err| Error::ReadFile {
            err,
            path: path.to_string(),
        })?;
        toml::from_str(&content).map_err(|err| Error::Parse {
            err,
            path: path.to_string(),
        })
    }

    /// Read an explicitly named config file, or [DEFAULT_CONFIG_FILE] inside
    /// `directory` if one exists. Without either, the built-in defaults apply.
    pub fn discover(explicit: Option<&str>, directory: &Path) -> Result<Self, Error> {
        if let Some(path) = explicit {
            return Self::from_path(path);
        }
        let implicit = directory.join(DEFAULT_CONFIG_FILE);
        if implicit.is_file() {
            Self::from_path(&implicit.to_string_lossy())
        } else {
            Ok(Self::default())
        }
    }
}

/// Action inputs. Each can be passed as a flag or through the `INPUT_*`
/// variable GitHub Actions sets for it. Empty values count as unset.
#[derive(Args, Default, Clone)]
pub struct RawInputs {
    /// Quant Cloud API key.
    #[arg(long, env = "INPUT_QUANT_API_KEY", hide_env_values = true)]
    pub quant_api_key: Option<String>,

    /// Quant Cloud organization.
    #[arg(long, env = "INPUT_QUANT_ORGANIZATION")]
    pub quant_organization: Option<String>,

    /// Application name. Defaults to the repository name.
    #[arg(long, env = "INPUT_QUANT_APPLICATION")]
    pub quant_application: Option<String>,

    /// The only branch that deploys to production.
    #[arg(long, env = "INPUT_MASTER_BRANCH_OVERRIDE")]
    pub master_branch_override: Option<String>,

    /// Fixed environment name. Branches never count as production when set.
    #[arg(long, env = "INPUT_ENVIRONMENT_NAME_OVERRIDE")]
    pub environment_name_override: Option<String>,

    /// Quant Cloud API root.
    #[arg(long, env = "INPUT_BASE_URL")]
    pub base_url: Option<String>,

    /// Do not log in to the container registry.
    #[arg(long, env = "INPUT_SKIP_DOCKER_LOGIN")]
    pub skip_docker_login: Option<String>,
}

/// Validated inputs merged with the config file.
pub struct Inputs {
    pub api_key: String,
    pub organization: String,
    pub overrides: Overrides,
    pub base_url: String,
    pub skip_docker_login: bool,
    pub container_engine: String,
    pub production_branches: Vec<String>,
}

impl Inputs {
    pub fn new(raw: RawInputs, file: File) -> Result<Self, Error> {
        Ok(Self {
            api_key: non_empty(raw.quant_api_key).ok_or(Error::MissingInput("quant_api_key"))?,
            organization: non_empty(raw.quant_organization)
                .ok_or(Error::MissingInput("quant_organization"))?,
            overrides: Overrides {
                application_name: non_empty(raw.quant_application),
                master_branch_name: non_empty(raw.master_branch_override),
                environment_name: non_empty(raw.environment_name_override),
            },
            base_url: non_empty(raw.base_url).unwrap_or(file.base_url),
            skip_docker_login: match non_empty(raw.skip_docker_login) {
                Some(value) => parse_bool("skip_docker_login", &value)?,
                None => false,
            },
            container_engine: file.container_engine,
            production_branches: file.production_branches,
        })
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}

fn parse_bool(name: &'static str, value: &str) -> Result<bool, Error> {
    match value.to_ascii_lowercase().as_str() {
        "true" | "1" | "yes" | "on" => Ok(true),
        "false" | "0" | "no" | "off" => Ok(false),
        _ => Err(Error::InvalidBool {
            name,
            value: value.to_string(),
        }),
    }
}
