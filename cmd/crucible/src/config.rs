//! Experiment file and command-line overrides.

use anyhow::{bail, Context, Result};
use clap::{Args, ValueEnum};
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::fs;
use std::path::{Path, PathBuf};

/// Default experiment name when neither the file nor the flags give one.
pub const DEFAULT_NAME: &str = "shell-experiment";

/// How the two commands are scheduled.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// One after the other, in random (or seeded) order.
    #[default]
    Sequential,
    /// Both at once on the blocking pool.
    Concurrent,
}

/// What has to agree for two command runs to match.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, ValueEnum)]
#[serde(rename_all = "snake_case")]
pub enum Compare {
    /// Standard output only.
    #[default]
    Stdout,
    /// Exit status only.
    Status,
    /// Exit status, standard output and standard error.
    All,
}

/// Where results are written, besides the log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PublishConfig {
    /// Pipe-delimited line file.
    pub log_file: Option<PathBuf>,
    /// JSON-lines file.
    pub json_file: Option<PathBuf>,
}

/// Contents of an `experiment.yaml` file.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ExperimentFile {
    /// Experiment name.
    pub name: Option<String>,
    /// Trusted command whose output is relayed.
    pub control: Option<String>,
    /// Command under test.
    pub candidate: Option<String>,
    /// Scheduling mode.
    pub mode: Mode,
    /// Comparison mode.
    pub compare: Compare,
    /// Fail when the commands disagree.
    pub raise_on_mismatch: bool,
    /// Seed for the sequential run order.
    pub seed: Option<u64>,
    /// Context attached to every published result.
    pub context: Option<Value>,
    /// Result destinations.
    pub publish: PublishConfig,
}

impl ExperimentFile {
    /// Loads an experiment file from YAML.
    pub fn load(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read experiment file: {}", path.display()))?;
        Self::parse(&content)
            .with_context(|| format!("Failed to parse experiment file: {}", path.display()))
    }

    /// Parses an experiment file from YAML text.
    pub fn parse(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }
}

/// Flags of `crucible run`. Each one overrides the experiment file.
#[derive(Debug, Clone, Default, Args)]
pub struct RunArgs {
    /// Path to an experiment file
    #[arg(short = 'f', long)]
    pub config: Option<PathBuf>,

    /// Experiment name
    #[arg(short, long)]
    pub name: Option<String>,

    /// Control command (its output is what you get)
    #[arg(long)]
    pub control: Option<String>,

    /// Candidate command
    #[arg(long)]
    pub candidate: Option<String>,

    /// Run both commands at the same time
    #[arg(long)]
    pub concurrent: bool,

    /// What must agree for a match
    #[arg(long, value_enum)]
    pub compare: Option<Compare>,

    /// Exit with an error when the commands disagree
    #[arg(long)]
    pub raise_on_mismatch: bool,

    /// Seed for the sequential run order
    #[arg(long)]
    pub seed: Option<u64>,

    /// JSON context attached to published results
    #[arg(long)]
    pub context: Option<String>,

    /// Append pipe-delimited results to this file
    #[arg(long)]
    pub log_file: Option<PathBuf>,

    /// Append JSON-lines results to this file
    #[arg(long)]
    pub json_file: Option<PathBuf>,
}

/// Fully resolved settings for one run.
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Experiment name.
    pub name: String,
    /// Control command.
    pub control: String,
    /// Candidate command.
    pub candidate: String,
    /// Scheduling mode.
    pub mode: Mode,
    /// Comparison mode.
    pub compare: Compare,
    /// Fail on mismatch.
    pub raise_on_mismatch: bool,
    /// Run-order seed.
    pub seed: Option<u64>,
    /// Published context.
    pub context: Option<Value>,
    /// Result destinations.
    pub publish: PublishConfig,
}

impl Settings {
    /// Loads the experiment file named by `args`, if any, and applies the
    /// flags over it.
    pub fn from_args(args: &RunArgs) -> Result<Self> {
        let file = match &args.config {
            Some(path) => ExperimentFile::load(path)?,
            None => ExperimentFile::default(),
        };
        Self::resolve(file, args)
    }

    /// Applies `args` over `file`.
    pub fn resolve(file: ExperimentFile, args: &RunArgs) -> Result<Self> {
        let Some(control) = args.control.clone().or(file.control) else {
            bail!("No control command given (use --control or set `control` in the experiment file)");
        };
        let Some(candidate) = args.candidate.clone().or(file.candidate) else {
            bail!("No candidate command given (use --candidate or set `candidate` in the experiment file)");
        };

        let context = match &args.context {
            Some(raw) => Some(
                serde_json::from_str(raw).with_context(|| format!("Invalid JSON context: {raw}"))?,
            ),
            None => file.context,
        };

        Ok(Self {
            name: args
                .name
                .clone()
                .or(file.name)
                .unwrap_or_else(|| DEFAULT_NAME.to_string()),
            control,
            candidate,
            mode: if args.concurrent {
                Mode::Concurrent
            } else {
                file.mode
            },
            compare: args.compare.unwrap_or(file.compare),
            raise_on_mismatch: args.raise_on_mismatch || file.raise_on_mismatch,
            seed: args.seed.or(file.seed),
            context,
            publish: PublishConfig {
                log_file: args.log_file.clone().or(file.publish.log_file),
                json_file: args.json_file.clone().or(file.publish.json_file),
            },
        })
    }
}
