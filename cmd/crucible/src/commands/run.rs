//! Run command implementation.

use crate::config::{Compare, Mode, RunArgs, Settings};
use crate::shell::{self, CommandOutput};
use anyhow::{bail, Context, Result};
use crucible_core::{Error, Experiment};
use crucible_publish::{JsonLinesPublisher, LinePublisher, TracingPublisher};
use std::io;
use tracing::{error, info};

type ShellExperiment = Experiment<'static, CommandOutput, io::Error>;

/// Runs the run command and returns the control's exit status.
pub async fn run(args: &RunArgs) -> Result<i32> {
    let settings = Settings::from_args(args)?;
    let output = execute(&settings).await?;
    if !output.success() {
        info!("Control exited with status {}", output.status);
    }

    print!("{}", output.stdout);
    eprint!("{}", output.stderr);

    Ok(output.status)
}

/// Runs the experiment described by `settings` and returns the control's
/// output.
pub async fn execute(settings: &Settings) -> Result<CommandOutput> {
    info!("Running experiment: {}", settings.name);
    info!("Control: {}", settings.control);
    info!("Candidate: {}", settings.candidate);

    let experiment = build(settings)?;
    let outcome = match settings.mode {
        Mode::Sequential => experiment.execute(),
        Mode::Concurrent => experiment.execute_async().await,
    };

    match outcome {
        Ok(output) => Ok(output),
        Err(Error::Control(e)) => Err(e)
            .with_context(|| format!("Failed to run control command: {}", settings.control)),
        Err(e @ Error::Mismatch { .. }) => {
            error!("{}", e);
            bail!("Experiment '{}' mismatched", settings.name)
        }
        Err(Error::Config(e)) => Err(e).with_context(|| "Invalid experiment"),
    }
}

fn build(settings: &Settings) -> Result<ShellExperiment> {
    let control = settings.control.clone();
    let candidate = settings.candidate.clone();

    let mut experiment = ShellExperiment::without_default(settings.name.as_str())?
        .test(move || shell::run(&control), move || shell::run(&candidate))?
        .with_result_comparer(comparer(settings.compare))
        .publish_with(TracingPublisher::new());

    if let Some(seed) = settings.seed {
        experiment = experiment.with_seed(seed);
    }
    if let Some(context) = &settings.context {
        experiment = experiment.with_context(context.clone());
    }
    if settings.raise_on_mismatch {
        experiment = experiment.raise_on_mismatch();
    }

    if let Some(path) = &settings.publish.log_file {
        let publisher = LinePublisher::append(path)
            .with_context(|| format!("Failed to open log file: {}", path.display()))?;
        experiment = experiment.publish_with(publisher);
    }
    if let Some(path) = &settings.publish.json_file {
        let publisher = JsonLinesPublisher::append(path)
            .with_context(|| format!("Failed to open JSON file: {}", path.display()))?;
        experiment = experiment.publish_with(publisher);
    }

    Ok(experiment)
}

fn comparer(compare: Compare) -> fn(&CommandOutput, &CommandOutput) -> bool {
    match compare {
        Compare::Stdout => |control, candidate| control.stdout == candidate.stdout,
        Compare::Status => |control, candidate| control.status == candidate.status,
        Compare::All => |control, candidate| control == candidate,
    }
}
