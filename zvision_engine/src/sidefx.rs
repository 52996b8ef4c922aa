use std::f32::consts::PI;

use serde::Serialize;
use zvision_formats::node_type;

use crate::context::EngineContext;
use crate::location::keys;
use crate::services::{AudioHandle, AudioMixer};

/// What a node may touch while it ticks.
pub struct NodeEnv<'a> {
    pub audio: &'a mut dyn AudioMixer,
    pub background_width: u32,
    pub view_pos: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimerNode {
    remaining_ms: i64,
    unit_ms: u32,
}

impl TimerNode {
    pub fn new(units: i32, unit_ms: u32) -> Self {
        Self {
            remaining_ms: i64::from(units) * i64::from(unit_ms),
            unit_ms: unit_ms.max(1),
        }
    }

    pub fn remaining_ms(&self) -> i64 {
        self.remaining_ms
    }

    /// Whole timer units left, 0 once expired.
    pub fn remaining_units(&self) -> i32 {
        if self.remaining_ms <= 0 {
            return 0;
        }
        i32::try_from(self.remaining_ms / i64::from(self.unit_ms)).unwrap_or(i32::MAX)
    }

    fn process(&mut self, delta_ms: u32) -> bool {
        self.remaining_ms -= i64::from(delta_ms);
        self.remaining_ms <= 0
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MusicNode {
    handle: AudioHandle,
    file: String,
    volume: u8,
    looping: bool,
    pan_position: Option<i32>,
}

impl MusicNode {
    pub fn start(audio: &mut dyn AudioMixer, file: &str, looping: bool, volume: u8) -> Self {
        let handle = audio.play(file, looping, volume);
        Self {
            handle,
            file: file.to_string(),
            volume,
            looping,
            pan_position: None,
        }
    }

    pub fn handle(&self) -> AudioHandle {
        self.handle
    }

    pub fn volume(&self) -> u8 {
        self.volume
    }

    pub fn pan_position(&self) -> Option<i32> {
        self.pan_position
    }

    pub fn set_pan_track(&mut self, position: Option<i32>, env: &mut NodeEnv<'_>) {
        self.pan_position = position;
        self.set_volume(self.volume, env);
    }

    pub fn set_volume(&mut self, volume: u8, env: &mut NodeEnv<'_>) {
        self.volume = volume;
        if !env.audio.is_active(self.handle) {
            return;
        }
        match self.pan_position {
            Some(position) if env.background_width > 0 => {
                let (level, balance) = pan_levels(position, env.view_pos, env.background_width);
                env.audio.set_balance(self.handle, balance);
                env.audio
                    .set_volume(self.handle, (level * f32::from(volume)) as u8);
            }
            _ => {
                env.audio.set_balance(self.handle, 0);
                env.audio.set_volume(self.handle, volume);
            }
        }
    }

    fn process(&mut self, env: &mut NodeEnv<'_>) -> bool {
        if !env.audio.is_active(self.handle) {
            return true;
        }
        if self.pan_position.is_some() {
            self.set_volume(self.volume, env);
        }
        false
    }
}

/// Volume scale and stereo balance for a source at `position` on a
/// panorama `width` pixels wide, heard from `view_pos`.
fn pan_levels(position: i32, view_pos: i32, width: u32) -> (f32, i8) {
    let width = i64::from(width);
    let mut offset = i64::from(view_pos) - i64::from(position);
    if offset < -width / 2 {
        offset += width;
    } else if offset >= width / 2 {
        offset -= width;
    }
    let norm = offset as f32 / (width as f32 / 2.0);
    let distance = norm.abs();
    let level = if distance > 0.5 {
        (distance - 0.5) * 1.7
    } else {
        1.0
    };
    let balance = ((-norm * PI).sin() * 127.0) as i8;
    (level.clamp(0.0, 1.0), balance)
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PanTrackNode {
    music_slot: u32,
}

impl PanTrackNode {
    pub fn music_slot(&self) -> u32 {
        self.music_slot
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum SideFxNode {
    Timer(TimerNode),
    Music(MusicNode),
    PanTrack(PanTrackNode),
}

/// A running side effect and the state key it reports to.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SideFx {
    key: u32,
    node: SideFxNode,
}

impl SideFx {
    pub fn timer(key: u32, node: TimerNode) -> Self {
        Self {
            key,
            node: SideFxNode::Timer(node),
        }
    }

    pub fn music(key: u32, node: MusicNode) -> Self {
        Self {
            key,
            node: SideFxNode::Music(node),
        }
    }

    pub fn pan_track(key: u32, music_slot: u32) -> Self {
        Self {
            key,
            node: SideFxNode::PanTrack(PanTrackNode { music_slot }),
        }
    }

    pub fn key(&self) -> u32 {
        self.key
    }

    pub fn node(&self) -> &SideFxNode {
        &self.node
    }

    pub fn type_mask(&self) -> u32 {
        match self.node {
            SideFxNode::Timer(_) => node_type::TIMER,
            SideFxNode::Music(_) => node_type::AUDIO,
            SideFxNode::PanTrack(_) => node_type::PANTRACK,
        }
    }

    fn process(&mut self, delta_ms: u32, env: &mut NodeEnv<'_>) -> bool {
        match &mut self.node {
            SideFxNode::Timer(timer) => timer.process(delta_ms),
            SideFxNode::Music(music) => music.process(env),
            SideFxNode::PanTrack(_) => false,
        }
    }

    /// Runs once when the node leaves the arena, for whatever reason.
    pub(crate) fn teardown(self, ctx: &mut EngineContext) {
        match self.node {
            SideFxNode::Timer(timer) => {
                if self.key != keys::NOT_SET {
                    ctx.set_state_value(self.key, 2);
                    let units = timer.remaining_units();
                    if units > 0 {
                        ctx.set_state_value(self.key, units);
                    }
                }
            }
            SideFxNode::Music(music) => {
                ctx.services_mut().audio.stop(music.handle);
                if self.key != keys::NOT_SET {
                    ctx.set_state_value(self.key, 2);
                }
            }
            SideFxNode::PanTrack(pan) => ctx.set_music_pan_track(pan.music_slot, None),
        }
    }
}

/// Running side effects keyed by slot. Nodes outlive the scope that
/// started them.
#[derive(Debug, Default)]
pub struct SideFxArena {
    nodes: Vec<SideFx>,
}

impl SideFxArena {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, fx: SideFx) {
        self.nodes.push(fx);
    }

    pub fn get(&self, key: u32) -> Option<&SideFx> {
        self.nodes.iter().find(|fx| fx.key == key)
    }

    pub fn contains(&self, key: u32) -> bool {
        self.get(key).is_some()
    }

    pub fn music_mut(&mut self, key: u32) -> Option<&mut MusicNode> {
        self.nodes
            .iter_mut()
            .filter(|fx| fx.key == key)
            .find_map(|fx| match &mut fx.node {
                SideFxNode::Music(music) => Some(music),
                _ => None,
            })
    }

    pub fn iter(&self) -> impl Iterator<Item = &SideFx> {
        self.nodes.iter()
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    pub(crate) fn take(&mut self, key: u32) -> Option<SideFx> {
        let index = self.nodes.iter().position(|fx| fx.key == key)?;
        Some(self.nodes.remove(index))
    }

    pub(crate) fn take_types(&mut self, mask: u32) -> Vec<SideFx> {
        let (taken, kept): (Vec<SideFx>, Vec<SideFx>) = std::mem::take(&mut self.nodes)
            .into_iter()
            .partition(|fx| fx.type_mask() & mask != 0);
        self.nodes = kept;
        taken
    }

    /// Ticks every node and hands back the ones that finished, in order.
    pub(crate) fn process(&mut self, delta_ms: u32, env: &mut NodeEnv<'_>) -> Vec<SideFx> {
        let mut finished = Vec::new();
        let mut index = 0;
        while index < self.nodes.len() {
            if self.nodes[index].process(delta_ms, env) {
                finished.push(self.nodes.remove(index));
            } else {
                index += 1;
            }
        }
        finished
    }
}
