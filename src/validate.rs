use crate::quant::{self, RegistryCredentials};
use log::{info, warn};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("unable to access organization '{organization}': {source}")]
    Organization {
        organization: String,
        source: quant::Error,
    },

    #[error("unable to look up application '{application}': {source}")]
    Application {
        application: String,
        source: quant::Error,
    },

    #[error("unable to look up environment '{environment}': {source}")]
    Environment {
        environment: String,
        source: quant::Error,
    },
}

/// Whether the deployment target already exists remotely.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ValidationState {
    pub application_exists: bool,
    pub environment_exists: bool,
}

#[derive(Debug)]
pub struct Validation {
    pub state: ValidationState,
    /// `None` when the registry credentials could not be retrieved.
    pub credentials: Option<RegistryCredentials>,
}

/// Validate organization access, then check which parts of the target exist.
///
/// Listing applications is the authoritative access check, so failing to
/// fetch registry credentials afterwards only warns. A missing application or
/// environment is recorded in [ValidationState], any other failure aborts.
pub async fn validate(
    client: &quant::Client,
    organization: &str,
    application: &str,
    environment: &str,
) -> Result<Validation, Error> {
    let applications = client
        .list_applications(organization)
        .await
        .map_err(|source| Error::Organization {
            organization: organization.to_string(),
            source,
        })?;
    info!("Organization '{organization}' is accessible ({} applications)", applications.len());

    let credentials = match client.registry_credentials(organization).await {
        Ok(credentials) => Some(credentials),
        Err(err) => {
            warn!("Could not retrieve registry credentials for '{organization}': {err}");
            None
        }
    };

    let application_exists = match client.get_application(organization, application).await {
        Ok(_) => true,
        Err(err) if err.is_not_found() => false,
        Err(source) => {
            return Err(Error::Application {
                application: application.to_string(),
                source,
            })
        }
    };

    let environment_exists = if !application_exists {
        info!("Application '{application}' does not exist yet");
        false
    } else {
        match client.get_environment(organization, application, environment).await {
            Ok(_) => true,
            Err(err) if err.is_not_found() => {
                info!("Environment '{environment}' does not exist yet");
                false
            }
            Err(source) => {
                return Err(Error::Environment {
                    environment: environment.to_string(),
                    source,
                })
            }
        }
    };

    Ok(Validation {
        state: ValidationState {
            application_exists,
            environment_exists,
        },
        credentials,
    })
}
