//! Init command implementation.

use anyhow::{Context, Result};
use std::fs;
use std::path::Path;
use tracing::info;

/// Example experiment written by `crucible init`.
pub const EXAMPLE_EXPERIMENT: &str = r"# Crucible experiment
#
# The control is the command you trust. Its output and exit status are
# always what `crucible run` returns. The candidate runs alongside it and
# only its comparison with the control is reported.

name: list-files

control: ls | sort
candidate: ls -1

# sequential (random order, see `seed`) or concurrent
mode: sequential

# stdout, status or all
compare: stdout

# Exit with an error when the commands disagree
raise_on_mismatch: false

# Fixes the sequential run order
# seed: 42

# Attached to every published result
context:
  owner: platform

publish:
  log_file: experiments.log
  # json_file: experiments.jsonl
";

/// Runs the init command.
pub fn run(path: &str) -> Result<()> {
    let project_path = Path::new(path);

    info!("Initializing Crucible experiment at: {}", project_path.display());

    fs::create_dir_all(project_path)
        .with_context(|| format!("Failed to create directory: {}", project_path.display()))?;

    let experiment_path = project_path.join("experiment.yaml");
    if experiment_path.exists() {
        info!("Skipped: {} (already exists)", experiment_path.display());
    } else {
        fs::write(&experiment_path, EXAMPLE_EXPERIMENT)
            .with_context(|| "Failed to create experiment.yaml")?;
        info!("Created: {}", experiment_path.display());
    }

    info!("");
    info!("Next steps:");
    info!("  1. Edit experiment.yaml with your control and candidate commands");
    info!("  2. Run 'crucible run --config experiment.yaml'");

    Ok(())
}
