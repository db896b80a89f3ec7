use thiserror::Error;
use Error::*;

const TAG_PREFIX: &str = "refs/tags/";
const PULL_REQUEST_PREFIX: &str = "refs/pull/";
const BRANCH_PREFIX: &str = "refs/heads/";

#[derive(Error, Debug, PartialEq)]
pub enum Error {
    #[error("ref is empty")]
    Empty,

    #[error("tag name is empty in ref '{0}'")]
    EmptyTag(String),

    #[error("pull request number could not be read from ref '{0}'")]
    PullRequestId(String),

    #[error("unrecognized ref format: '{0}'")]
    Unrecognized(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefKind {
    Tag,
    PullRequest,
    Branch,
}

/// A classified version control reference, e.g. the value of `GITHUB_REF`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefDescriptor {
    pub raw_ref: String,
    pub kind: RefKind,
    /// Tag name, branch name, or `pr-<id>` for pull requests.
    pub name: String,
    /// Only set for pull requests.
    pub pr_id: Option<String>,
}

impl RefDescriptor {
    pub fn is_tag(&self) -> bool {
        self.kind == RefKind::Tag
    }

    pub fn is_pull_request(&self) -> bool {
        self.kind == RefKind::PullRequest
    }
}

/// Classify a raw ref as a tag, pull request or branch head.
///
/// Pull request refs look like `refs/pull/42/merge`; the numeric segment
/// directly after the prefix is the pull request id.
///
/// An empty branch name (`refs/heads/`) is accepted as-is, an empty tag name is not.
pub fn classify(raw_ref: &str) -> Result<RefDescriptor, Error> {
    if raw_ref.is_empty() {
        return Err(Empty);
    }

    let descriptor = |kind: RefKind, name: &str, pr_id: Option<String>| RefDescriptor {
        raw_ref: raw_ref.to_string(),
        kind,
        name: name.to_string(),
        pr_id,
    };

    if let Some(tag) = raw_ref.strip_prefix(TAG_PREFIX) {
        if tag.is_empty() {
            return Err(EmptyTag(raw_ref.to_string()));
        }
        return Ok(descriptor(RefKind::Tag, tag, None));
    }

    if let Some(rest) = raw_ref.strip_prefix(PULL_REQUEST_PREFIX) {
        let id = rest.split('/').next().unwrap_or_default();
        if id.is_empty() || !id.chars().all(|c| c.is_ascii_digit()) {
            return Err(PullRequestId(raw_ref.to_string()));
        }
        return Ok(descriptor(
            RefKind::PullRequest,
            &format!("pr-{id}"),
            Some(id.to_string()),
        ));
    }

    if let Some(branch) = raw_ref.strip_prefix(BRANCH_PREFIX) {
        return Ok(descriptor(RefKind::Branch, branch, None));
    }

    Err(Unrecognized(raw_ref.to_string()))
}
