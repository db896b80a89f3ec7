use crate::git_ref::{RefDescriptor, RefKind};
use thiserror::Error;

const PRODUCTION_ENVIRONMENT: &str = "production";
const DEVELOP_BRANCH: &str = "develop";
const LATEST_SUFFIX: &str = "-latest";

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("application name could not be derived from repository '{0}'; set quant_application")]
    ApplicationName(String),

    #[error("application name could not be derived: repository is unknown; set quant_application")]
    NoRepository,
}

/// User supplied values that replace the default derivations.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub application_name: Option<String>,
    /// Replaces the whole production branch set with this single branch.
    pub master_branch_name: Option<String>,
    /// Replaces the derived environment name. Also disables branch based
    /// production detection; only tags are production when this is set.
    pub environment_name: Option<String>,
}

impl Overrides {
    /// Branches considered production, given the configured defaults.
    pub fn production_branches<'a>(&'a self, defaults: &'a [String]) -> Vec<&'a str> {
        match &self.master_branch_name {
            Some(branch) => vec![branch.as_str()],
            None => defaults.iter().map(String::as_str).collect(),
        }
    }

    /// The override if present, otherwise the last segment of an `owner/repo` identifier.
    pub fn application_name(&self, repository: Option<&str>) -> Result<String, Error> {
        if let Some(name) = &self.application_name {
            return Ok(name.clone());
        }
        let repository = repository.ok_or(Error::NoRepository)?;
        match repository.split_once('/') {
            Some((_, name)) if !name.is_empty() => Ok(name.to_string()),
            _ => Err(Error::ApplicationName(repository.to_string())),
        }
    }
}

/// Where this run deploys to, and how its image is tagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedTarget {
    pub application_name: String,
    pub environment_name: String,
    pub is_production: bool,
    /// Always starts with `-`.
    pub image_suffix: String,
}

impl ResolvedTarget {
    /// Resolve environment, production flag and image suffix for a ref.
    pub fn resolve(
        git_ref: &RefDescriptor,
        overrides: &Overrides,
        production_branches: &[&str],
        application_name: String,
    ) -> Self {
        let is_production = match (&overrides.environment_name, git_ref.kind) {
            (_, RefKind::Tag) => true,
            (Some(_), _) | (None, RefKind::PullRequest) => false,
            (None, RefKind::Branch) => production_branches.contains(&git_ref.name.as_str()),
        };

        let environment_name = match (&overrides.environment_name, git_ref.kind) {
            (Some(environment), _) => environment.clone(),
            (None, RefKind::Tag) => PRODUCTION_ENVIRONMENT.to_string(),
            (None, RefKind::PullRequest) => pr_name(git_ref),
            (None, RefKind::Branch) if is_production => PRODUCTION_ENVIRONMENT.to_string(),
            (None, RefKind::Branch) if git_ref.name == DEVELOP_BRANCH => DEVELOP_BRANCH.to_string(),
            (None, RefKind::Branch) => environment_slug(&git_ref.name),
        };

        let image_suffix = match (&overrides.environment_name, git_ref.kind) {
            (Some(environment), _) => format!("-{}", environment_slug(environment)),
            (None, RefKind::Tag) => format!("-{}", git_ref.name),
            (None, RefKind::PullRequest) => format!("-{}", pr_name(git_ref)),
            (None, RefKind::Branch) if is_production => LATEST_SUFFIX.to_string(),
            (None, RefKind::Branch) if git_ref.name == DEVELOP_BRANCH => format!("-{DEVELOP_BRANCH}"),
            (None, RefKind::Branch) => format!("-{}", image_tag_slug(&git_ref.name)),
        };

        Self {
            application_name,
            environment_name,
            is_production,
            image_suffix,
        }
    }

    /// The image suffix without its leading separator, usable as a bare tag.
    pub fn image_suffix_clean(&self) -> &str {
        self.image_suffix
            .strip_prefix('-')
            .unwrap_or(&self.image_suffix)
    }
}

fn pr_name(git_ref: &RefDescriptor) -> String {
    format!("pr-{}", git_ref.pr_id.as_deref().unwrap_or_default())
}

/// Lower-case, with everything outside `[a-z0-9]` replaced by `-`.
pub fn environment_slug(name: &str) -> String {
    name.chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

/// Lower-case, with everything outside `[a-z0-9.]` replaced by `-`.
/// Dots are valid in image tags, so they are kept.
pub fn image_tag_slug(name: &str) -> String {
    name.chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || c == '.' {
                c.to_ascii_lowercase()
            } else {
                '-'
            }
        })
        .collect()
}
