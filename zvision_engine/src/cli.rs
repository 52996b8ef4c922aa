use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use clap::Parser;
use zvision_engine::{EngineConfig, Location};

#[derive(Parser, Debug)]
#[command(about = "Headless ZVision script engine driver", version)]
pub struct Args {
    /// Directory containing the extracted .scr files (overrides the config file)
    #[arg(long)]
    pub script_root: Option<PathBuf>,

    /// Optional JSON engine config
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Number of frames to run
    #[arg(long, default_value_t = 60)]
    pub frames: u32,

    /// Milliseconds that pass each frame
    #[arg(long, default_value_t = 16)]
    pub frame_ms: u32,

    /// Start location code such as `gary` or `tr1a@320`
    #[arg(long, value_name = "LOC")]
    pub start: Option<String>,

    /// Seed for the script random number generator
    #[arg(long)]
    pub seed: Option<u64>,

    /// Restore the state table from a saved file before the first frame
    #[arg(long)]
    pub load_state: Option<PathBuf>,

    /// Path to write the state table in the save layout after the run
    #[arg(long)]
    pub save_state: Option<PathBuf>,

    /// Path to write the state table and location as JSON after the run
    #[arg(long)]
    pub state_json: Option<PathBuf>,

    /// Path to write the audio event log as JSON
    #[arg(long)]
    pub audio_log_json: Option<PathBuf>,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long)]
    pub verbose: bool,
}

#[derive(Debug)]
pub struct RunArgs {
    pub config: EngineConfig,
    pub script_root: PathBuf,
    pub start: Location,
    pub frames: u32,
    pub frame_ms: u32,
    pub load_state: Option<PathBuf>,
    pub save_state: Option<PathBuf>,
    pub state_json: Option<PathBuf>,
    pub audio_log_json: Option<PathBuf>,
    pub verbose: bool,
}

pub fn parse() -> Result<RunArgs> {
    let args = Args::parse();
    args.into_run_args()
}

impl Args {
    fn into_run_args(self) -> Result<RunArgs> {
        let mut config =
            EngineConfig::from_json_file(self.config.as_deref()).context("loading engine config")?;
        if let Some(root) = self.script_root {
            config.script_root = Some(root);
        }
        if let Some(start) = self.start {
            config.start_location = start;
        }
        if self.seed.is_some() {
            config.rng_seed = self.seed;
        }

        let Some(script_root) = config.script_root.clone() else {
            bail!("no script directory given; pass --script-root or set script_root in the config");
        };
        let start = config.start_location()?;
        if self.frame_ms == 0 {
            bail!("--frame-ms must be greater than zero");
        }

        Ok(RunArgs {
            config,
            script_root,
            start,
            frames: self.frames,
            frame_ms: self.frame_ms,
            load_state: self.load_state,
            save_state: self.save_state,
            state_json: self.state_json,
            audio_log_json: self.audio_log_json,
            verbose: self.verbose,
        })
    }
}
