//! Prepare a Quant Cloud deployment from a CI run.
//!
//! Works out which application and environment a ref deploys to, how its
//! container image is tagged, whether that target already exists, and logs
//! the container engine in to the Quant registry.
use thiserror::Error;

pub mod config;
pub mod context;
pub mod docker;
pub mod git_ref;
pub mod output;
pub mod pipeline;
pub mod quant;
pub mod target;
pub mod validate;

#[derive(Error, Debug)]
pub enum Error {
    #[error("configuration: {0}")]
    Config(#[from] config::Error),

    #[error("environment variable {0} is not set")]
    MissingEnvironment(&'static str),

    #[error("ref: {0}")]
    GitRef(#[from] git_ref::Error),

    #[error("{0}")]
    Target(#[from] target::Error),

    #[error("quant api client: {0}")]
    Quant(#[from] quant::Error),

    #[error(transparent)]
    Validate(#[from] validate::Error),

    #[error("registry credentials are unavailable; set skip_docker_login to continue without registry access")]
    CredentialsUnavailable,

    #[error("docker error: {0}")]
    Docker(#[from] docker::Error),

    #[error("output: {0}")]
    Output(#[from] output::Error),
}
