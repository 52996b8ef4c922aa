use std::{cell::RefCell, collections::BTreeSet, rc::Rc};

use serde::Serialize;

use crate::services::{AudioHandle, AudioMixer};

#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AudioEvent {
    Play {
        handle: AudioHandle,
        file: String,
        looping: bool,
        volume: u8,
    },
    Stop {
        handle: AudioHandle,
    },
    Volume {
        handle: AudioHandle,
        volume: u8,
    },
    Balance {
        handle: AudioHandle,
        balance: i8,
    },
}

#[derive(Debug, Default)]
struct MixerLog {
    events: Vec<AudioEvent>,
    active: BTreeSet<AudioHandle>,
    next_handle: AudioHandle,
}

/// Mixer that plays nothing and records every request. Streams stay active
/// until stopped or marked finished.
#[derive(Debug, Clone, Default)]
pub struct RecordingAudioMixer {
    log: Rc<RefCell<MixerLog>>,
}

impl RecordingAudioMixer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn events(&self) -> Vec<AudioEvent> {
        self.log.borrow().events.clone()
    }

    /// Simulates a non-looping stream reaching its end.
    pub fn finish(&self, handle: AudioHandle) {
        self.log.borrow_mut().active.remove(&handle);
    }

    pub fn active_handles(&self) -> Vec<AudioHandle> {
        self.log.borrow().active.iter().copied().collect()
    }
}

impl AudioMixer for RecordingAudioMixer {
    fn play(&mut self, file: &str, looping: bool, volume: u8) -> AudioHandle {
        let mut log = self.log.borrow_mut();
        log.next_handle += 1;
        let handle = log.next_handle;
        log.active.insert(handle);
        log.events.push(AudioEvent::Play {
            handle,
            file: file.to_string(),
            looping,
            volume,
        });
        handle
    }

    fn stop(&mut self, handle: AudioHandle) {
        let mut log = self.log.borrow_mut();
        log.active.remove(&handle);
        log.events.push(AudioEvent::Stop { handle });
    }

    fn is_active(&self, handle: AudioHandle) -> bool {
        self.log.borrow().active.contains(&handle)
    }

    fn set_volume(&mut self, handle: AudioHandle, volume: u8) {
        self.log
            .borrow_mut()
            .events
            .push(AudioEvent::Volume { handle, volume });
    }

    fn set_balance(&mut self, handle: AudioHandle, balance: i8) {
        self.log
            .borrow_mut()
            .events
            .push(AudioEvent::Balance { handle, balance });
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn recording_mixer_tracks_audio_events() {
        let recorder = RecordingAudioMixer::new();
        let mut mixer = recorder.clone();
        let intro = mixer.play("intro.raw", true, 200);
        let door = mixer.play("door.raw", false, 255);
        mixer.set_volume(intro, 100);
        mixer.set_balance(intro, -64);
        mixer.stop(intro);
        recorder.finish(door);

        assert!(!mixer.is_active(intro));
        assert!(!mixer.is_active(door));
        assert_eq!(
            recorder.events(),
            vec![
                AudioEvent::Play {
                    handle: 1,
                    file: "intro.raw".to_string(),
                    looping: true,
                    volume: 200,
                },
                AudioEvent::Play {
                    handle: 2,
                    file: "door.raw".to_string(),
                    looping: false,
                    volume: 255,
                },
                AudioEvent::Volume {
                    handle: 1,
                    volume: 100
                },
                AudioEvent::Balance {
                    handle: 1,
                    balance: -64
                },
                AudioEvent::Stop { handle: 1 },
            ]
        );
    }
}
