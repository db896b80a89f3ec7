use std::collections::HashMap;

pub const GITHUB_REF: &str = "GITHUB_REF";
pub const GITHUB_REPOSITORY: &str = "GITHUB_REPOSITORY";
pub const GITHUB_EVENT_NAME: &str = "GITHUB_EVENT_NAME";
pub const GITHUB_OUTPUT: &str = "GITHUB_OUTPUT";

/// Read-only access to the runner environment.
pub trait Context {
    fn var(&self, name: &str) -> Option<String>;

    /// Like [Context::var], but unset and empty are the same.
    fn non_empty_var(&self, name: &str) -> Option<String> {
        self.var(name).filter(|value| !value.is_empty())
    }
}

/// The environment of the current process.
pub struct ProcessEnv;

impl Context for ProcessEnv {
    fn var(&self, name: &str) -> Option<String> {
        std::env::var(name).ok()
    }
}

impl Context for HashMap<String, String> {
    fn var(&self, name: &str) -> Option<String> {
        self.get(name).cloned()
    }
}
