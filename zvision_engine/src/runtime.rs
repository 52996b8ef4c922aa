use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use log::info;
use serde::Serialize;
use zvision_engine::{
    DirectorySource, HeadlessCursor, HeadlessRenderer, RecordingAudioMixer, ScriptManager,
    Services, SideFx, StateTable,
};

use crate::cli::RunArgs;

#[derive(Serialize)]
struct StateDump<'a> {
    frames_run: u32,
    location: String,
    quit_requested: bool,
    state: &'a StateTable,
    side_effects: Vec<&'a SideFx>,
}

pub fn execute(args: RunArgs) -> Result<()> {
    let RunArgs {
        config,
        script_root,
        start,
        frames,
        frame_ms,
        load_state,
        save_state,
        state_json,
        audio_log_json,
        verbose: _,
    } = args;

    let source = DirectorySource::open(&script_root)
        .with_context(|| format!("opening script directory {}", script_root.display()))?;
    info!(
        "loaded script index from {} ({} files)",
        source.root().display(),
        source.len()
    );

    let recorder = RecordingAudioMixer::new();
    let services = Services::new(
        Box::new(HeadlessRenderer::new()),
        Box::new(recorder.clone()),
        Box::new(HeadlessCursor::new()),
    );
    let mut manager = ScriptManager::new(Box::new(source), services, &config);
    manager.initialize(start);

    if let Some(path) = load_state.as_ref() {
        let file =
            File::open(path).with_context(|| format!("opening saved state {}", path.display()))?;
        manager
            .deserialize_state(&mut BufReader::new(file))
            .with_context(|| format!("reading saved state {}", path.display()))?;
        info!("restored state table from {}", path.display());
    }

    let mut frames_run = 0;
    while frames_run < frames {
        manager
            .update(frame_ms)
            .with_context(|| format!("running frame {frames_run}"))?;
        frames_run += 1;
        if manager.quit_requested() {
            info!("scripts requested quit after {frames_run} frames");
            break;
        }
    }

    let location = manager.current_location();
    println!(
        "Ran {frames_run} frames; at {location}; {} state entries",
        manager.context().state().len()
    );

    if let Some(path) = save_state.as_ref() {
        let file =
            File::create(path).with_context(|| format!("creating {}", path.display()))?;
        let mut writer = BufWriter::new(file);
        manager
            .serialize_state(&mut writer)
            .with_context(|| format!("writing saved state to {}", path.display()))?;
        writer
            .flush()
            .with_context(|| format!("flushing {}", path.display()))?;
        println!("Saved state table to {}", path.display());
    }

    if let Some(path) = state_json.as_ref() {
        let context = manager.context();
        let dump = StateDump {
            frames_run,
            location: location.to_string(),
            quit_requested: manager.quit_requested(),
            state: context.state(),
            side_effects: context.side_fx().iter().collect(),
        };
        let json = serde_json::to_string_pretty(&dump).context("serializing state dump to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing state dump to {}", path.display()))?;
        println!("Saved state dump to {}", path.display());
    }

    if let Some(path) = audio_log_json.as_ref() {
        let json = serde_json::to_string_pretty(&recorder.events())
            .context("serializing audio event log to JSON")?;
        fs::write(path, &json)
            .with_context(|| format!("writing audio event log to {}", path.display()))?;
        println!("Saved audio event log to {}", path.display());
    }

    Ok(())
}
