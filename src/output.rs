//! Step outputs for downstream workflow steps.

use std::collections::BTreeMap;
use std::fs::OpenOptions;
use std::io::Write;
use std::path::PathBuf;
use thiserror::Error;
use crate::target::ResolvedTarget;
use crate::validate::ValidationState;

const HEREDOC_DELIMITER: &str = "QUANT_INIT_EOF";

#[derive(Error, Debug)]
pub enum Error {
    #[error("write {path}: {err}")]
    WriteFile { err: std::io::Error, path: String },
}

/// Write-only destination for step outputs.
pub trait OutputSink {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), Error>;
}

/// Appends to the file named by `GITHUB_OUTPUT`.
pub struct GithubOutput {
    path: PathBuf,
}

impl GithubOutput {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl OutputSink for GithubOutput {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let err = |err: std::io::Error| Error::WriteFile {
            err,
            path: self.path.display().to_string(),
        };
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(err)?;
        file.write_all(format_output(name, value).as_bytes())
            .map_err(err)
    }
}

/// Prints outputs as `name=value`, for running outside of GitHub Actions.
pub struct Stdout;

impl OutputSink for Stdout {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), Error> {
        print!("{}", format_output(name, value));
        Ok(())
    }
}

impl OutputSink for BTreeMap<String, String> {
    fn set_output(&mut self, name: &str, value: &str) -> Result<(), Error> {
        self.insert(name.to_string(), value.to_string());
        Ok(())
    }
}

fn format_output(name: &str, value: &str) -> String {
    if value.contains('\n') {
        let delimiter = heredoc_delimiter(value);
        format!("{name}<<{delimiter}\n{value}\n{delimiter}\n")
    } else {
        format!("{name}={value}\n")
    }
}

/// A delimiter that does not occur as a line of `value`, so the value cannot
/// terminate its own heredoc.
fn heredoc_delimiter(value: &str) -> String {
    let mut delimiter = HEREDOC_DELIMITER.to_string();
    while value.lines().any(|line| line == delimiter) {
        delimiter.push('_');
    }
    delimiter
}

/// Everything this step publishes. Of the registry credentials, only the
/// endpoint host is exposed.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outputs {
    pub project_exists: bool,
    pub environment_exists: bool,
    pub quant_application: String,
    pub environment_name: String,
    pub is_production: bool,
    pub stripped_endpoint: String,
    pub image_suffix: String,
    pub image_suffix_clean: String,
}

impl Outputs {
    pub fn new(target: &ResolvedTarget, state: ValidationState, endpoint: Option<&str>) -> Self {
        Self {
            project_exists: state.application_exists,
            environment_exists: state.environment_exists,
            quant_application: target.application_name.clone(),
            environment_name: target.environment_name.clone(),
            is_production: target.is_production,
            stripped_endpoint: endpoint.map(strip_scheme).unwrap_or_default().to_string(),
            image_suffix: target.image_suffix.clone(),
            image_suffix_clean: target.image_suffix_clean().to_string(),
        }
    }

    pub fn publish(&self, sink: &mut dyn OutputSink) -> Result<(), Error> {
        sink.set_output("project_exists", &self.project_exists.to_string())?;
        sink.set_output("environment_exists", &self.environment_exists.to_string())?;
        sink.set_output("quant_application", &self.quant_application)?;
        sink.set_output("environment_name", &self.environment_name)?;
        sink.set_output("is_production", &self.is_production.to_string())?;
        sink.set_output("stripped_endpoint", &self.stripped_endpoint)?;
        sink.set_output("image_suffix", &self.image_suffix)?;
        sink.set_output("image_suffix_clean", &self.image_suffix_clean)
    }
}

/// `https://host/path` becomes `host/path`.
pub fn strip_scheme(endpoint: &str) -> &str {
    endpoint
        .strip_prefix("https://")
        .or_else(|| endpoint.strip_prefix("http://"))
        .unwrap_or(endpoint)
}
