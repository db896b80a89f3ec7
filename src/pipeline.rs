use log::{debug, info};
use crate::config::Inputs;
use crate::context::{self, Context};
use crate::output::{OutputSink, Outputs};
use crate::target::ResolvedTarget;
use crate::Error::*;
use crate::{docker, git_ref, quant, validate, Error};

/// One run of the step: classify the ref, resolve the target, validate it
/// against Quant Cloud, log in to the registry and publish the outputs.
pub async fn run(
    ctx: &dyn Context,
    inputs: &Inputs,
    sink: &mut dyn OutputSink,
) -> Result<Outputs, Error> {
    let raw_ref = ctx
        .non_empty_var(context::GITHUB_REF)
        .ok_or(MissingEnvironment(context::GITHUB_REF))?;
    if let Some(event) = ctx.non_empty_var(context::GITHUB_EVENT_NAME) {
        info!("Triggered by {event} on {raw_ref}");
    }

    let git_ref = git_ref::classify(&raw_ref)?;
    debug!("Ref classified as {:?} '{}'", git_ref.kind, git_ref.name);

    let repository = ctx.non_empty_var(context::GITHUB_REPOSITORY);
    let application_name = inputs.overrides.application_name(repository.as_deref())?;
    let target = ResolvedTarget::resolve(
        &git_ref,
        &inputs.overrides,
        &inputs.overrides.production_branches(&inputs.production_branches),
        application_name,
    );
    info!("Application: {}", target.application_name);
    info!("Environment: {}", target.environment_name);
    info!("Production: {}", target.is_production);
    info!("Image suffix: {}", target.image_suffix);

    let client = quant::Client::new(&inputs.base_url, &inputs.api_key)?;
    let validation = validate::validate(
        &client,
        &inputs.organization,
        &target.application_name,
        &target.environment_name,
    )
    .await?;

    match (&validation.credentials, inputs.skip_docker_login) {
        (_, true) => info!("Skipping registry login"),
        (None, false) => return Err(CredentialsUnavailable),
        (Some(credentials), false) => {
            docker::login(&inputs.container_engine, credentials)?;
            info!("Logged in to {}", credentials.endpoint);
        }
    }

    let outputs = Outputs::new(
        &target,
        validation.state,
        validation.credentials.as_ref().map(|c| c.endpoint.as_str()),
    );
    outputs.publish(sink)?;
    Ok(outputs)
}
