use std::io::{ErrorKind, Write};
use std::process::{ExitStatus, Stdio};
use log::debug;
use thiserror::Error;
use crate::docker::Error::IOError;
use crate::quant::RegistryCredentials;

#[derive(Error, Debug)]
pub enum Error {
    #[error("{engine} login failed with exit code {status}")]
    Login { engine: String, status: ExitStatus },

    #[error("could not run {engine}: {err}")]
    Spawn { engine: String, err: std::io::Error },

    #[error(transparent)]
    IOError(#[from] std::io::Error),
}

/// Log the container engine in to a registry.
///
/// The password goes through stdin and the engine's own output is discarded,
/// so credentials never reach argv or the job log.
pub fn login(engine: &str, credentials: &RegistryCredentials) -> Result<(), Error> {
    debug!("Logging in to registry {} with {engine}", credentials.endpoint);
    let mut child = std::process::Command::new(engine)
        .arg("login")
        .arg(&credentials.endpoint)
        .arg("--username")
        .arg(&credentials.username)
        .arg("--password-stdin")
        .stdin(Stdio::piped())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()
        .map_err(|err| Error::Spawn { engine: engine.to_string(), err })?;

    if let Some(mut stdin) = child.stdin.take() {
        match stdin.write_all(credentials.password.as_bytes()) {
            // The engine exited without reading; its exit status tells us why.
            Err(err) if err.kind() == ErrorKind::BrokenPipe => {}
            other => other.map_err(IOError)?,
        }
    }

    let status = child.wait()?;
    if status.success() {
        Ok(())
    } else {
        Err(Error::Login { engine: engine.to_string(), status })
    }
}
