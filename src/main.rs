/// Quant Cloud init
use clap::Parser;
use log::{error, info};
use quant_init::config::{self, Inputs, RawInputs};
use quant_init::context::{self, Context, ProcessEnv};
use quant_init::output::{GithubOutput, OutputSink, Stdout};
use quant_init::{pipeline, Error};

/// Resolve the Quant Cloud environment and image tag for this CI run,
/// and log in to the Quant container registry.
#[derive(Parser)]
#[command(version, about, long_about = None)]
struct Cli {
    /// Path to a quant.toml configuration file.
    #[arg(long)]
    config: Option<String>,

    #[command(flatten)]
    inputs: RawInputs,
}

#[tokio::main]
async fn main() {
    match run().await {
        Ok(_) => std::process::exit(0),
        Err(err) => {
            error!("fatal: {}", err);
            std::process::exit(1)
        }
    }
}

async fn run() -> Result<(), Error> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let args = Cli::parse();
    let cfg_file = config::File::discover(args.config.as_deref(), std::path::Path::new("."))?;
    let inputs = Inputs::new(args.inputs, cfg_file)?;

    info!("Quant Cloud init {}", env!("CARGO_PKG_VERSION"));

    let env = ProcessEnv;
    let mut sink: Box<dyn OutputSink> = match env.non_empty_var(context::GITHUB_OUTPUT) {
        Some(path) => Box::new(GithubOutput::new(path)),
        None => Box::new(Stdout),
    };

    pipeline::run(&env, &inputs, sink.as_mut()).await?;
    Ok(())
}
