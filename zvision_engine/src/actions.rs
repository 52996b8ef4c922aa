use log::debug;
use zvision_formats::{flags, KillTarget, ResultAction};

use crate::context::EngineContext;

/// Runs one result action. Returns `false` when the remaining actions of
/// the rule must be skipped.
pub fn execute(action: &ResultAction, ctx: &mut EngineContext) -> bool {
    match action {
        ResultAction::Add { key, value } => {
            let current = ctx.state_value(*key);
            ctx.set_state_value(*key, current.wrapping_add(*value));
        }
        ResultAction::Assign { key, value } => {
            let value = value.resolve(|slot| ctx.state_value(slot));
            ctx.set_state_value(*key, value);
        }
        ResultAction::Attenuate { key, attenuation } => {
            let drop = (attenuation.unsigned_abs() >> 7).min(255) as u8;
            ctx.set_music_volume(*key, 255 - drop);
        }
        ResultAction::ChangeLocation { target } => ctx.request_location_change(*target),
        ResultAction::DisableControl { key } => ctx.set_state_flag(*key, flags::DISABLED),
        ResultAction::EnableControl { key } => ctx.unset_state_flag(*key, flags::DISABLED),
        ResultAction::Kill { target } => match target {
            KillTarget::Types(mask) => {
                ctx.remove_side_fx_types(*mask);
            }
            KillTarget::Key(key) => {
                ctx.remove_side_fx(*key);
            }
        },
        ResultAction::Music {
            slot,
            file,
            looping,
            volume,
            ..
        } => ctx.start_music(*slot, file, *looping, *volume),
        ResultAction::PanTrack {
            slot,
            music_slot,
            position,
        } => ctx.start_pan_track(*slot, *music_slot, *position),
        ResultAction::Random { slot, max } => {
            let max = max.resolve(|key| ctx.state_value(key));
            let value = ctx.random(max);
            ctx.set_state_value(*slot, value);
        }
        ResultAction::Quit => {
            ctx.request_quit();
            return false;
        }
        ResultAction::SetScreen { file } => {
            ctx.services_mut().renderer.set_background_image(file);
        }
        ResultAction::Stop { key } => {
            ctx.remove_side_fx(*key);
        }
        ResultAction::Timer { slot, duration } => {
            let units = duration.resolve(|key| ctx.state_value(key));
            ctx.start_timer(*slot, units);
        }
        ResultAction::Reserved { kind, args } => {
            debug!("reserved action {}({args}) has no effect", kind.keyword());
        }
        ResultAction::External { kind, args } => {
            debug!("action {}({args}) is handled outside the script engine", kind.keyword());
        }
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::audio_bridge::{AudioEvent, RecordingAudioMixer};
    use crate::location::{keys, Location, LocationKeys};
    use crate::services::{HeadlessCursor, HeadlessRenderer, Services};

    fn run(ctx: &mut EngineContext, line: &str) -> bool {
        let action = ResultAction::parse(line)
            .expect("parse action")
            .expect("action is not skipped");
        execute(&action, ctx)
    }

    fn context() -> (EngineContext, RecordingAudioMixer, HeadlessRenderer) {
        let mixer = RecordingAudioMixer::new();
        let renderer = HeadlessRenderer::new();
        let services = Services::new(
            Box::new(renderer.clone()),
            Box::new(mixer.clone()),
            Box::new(HeadlessCursor::new()),
        );
        (EngineContext::new(services, 100, Some(3)), mixer, renderer)
    }

    #[test]
    fn add_and_assign_update_state() {
        let (mut ctx, _, _) = context();
        assert!(run(&mut ctx, "action:add(10, 3)"));
        assert!(run(&mut ctx, "action:add(10, -1)"));
        assert_eq!(ctx.state_value(10), 2);

        ctx.set_state_value(21, 44);
        assert!(run(&mut ctx, "action:assign(20, [21])"));
        assert_eq!(ctx.state_value(20), 44);
        assert!(run(&mut ctx, "action:assign(20, 0)"));
        assert!(!ctx.state().contains(20));
    }

    #[test]
    fn quit_stops_the_action_list() {
        let (mut ctx, _, _) = context();
        assert!(!run(&mut ctx, "action:quit"));
        assert!(ctx.quit_requested());
    }

    #[test]
    fn control_flags_toggle_disabled() {
        let (mut ctx, _, _) = context();
        run(&mut ctx, "action:disable_control(300)");
        assert_eq!(ctx.state_flags(300), flags::DISABLED);
        run(&mut ctx, "action:enable_control(300)");
        assert_eq!(ctx.state_flags(300), 0);
    }

    #[test]
    fn change_location_records_a_pending_target() {
        let (mut ctx, _, _) = context();
        run(&mut ctx, "action:change_location(t, e, 1, a, 320)");
        assert_eq!(ctx.pending_location(), Location::new(b't', b'e', b'1', b'a', 320));

        let last = Location::new(b'g', b'a', b'r', b'y', 0);
        for (key, value) in LocationKeys::LAST.entries(&last) {
            ctx.set_state_value(key, value);
        }
        run(&mut ctx, "action:change_location(0, 0, 0, 0, 0)");
        assert_eq!(ctx.pending_location(), last);
    }

    #[test]
    fn music_attenuate_and_kill() {
        let (mut ctx, mixer, _) = context();
        run(&mut ctx, "action:music:13000(0 a000h2tc.raw 1 200)");
        run(&mut ctx, "action:music:13000(0 other.raw 1 200)");
        assert_eq!(ctx.state_value(13000), 1);
        run(&mut ctx, "action:attenuate(13000, 2560)");
        run(&mut ctx, "action:kill(audio)");
        assert_eq!(ctx.state_value(13000), 2);
        assert_eq!(
            mixer.events(),
            vec![
                AudioEvent::Play {
                    handle: 1,
                    file: "a000h2tc.raw".to_string(),
                    looping: true,
                    volume: 200,
                },
                AudioEvent::Balance {
                    handle: 1,
                    balance: 0
                },
                AudioEvent::Volume {
                    handle: 1,
                    volume: 235
                },
                AudioEvent::Stop { handle: 1 },
            ]
        );
    }

    #[test]
    fn universe_music_plays_like_music() {
        let (mut ctx, mixer, _) = context();
        run(&mut ctx, "action:universe_music:13001(0 wind.raw 0 120)");
        assert_eq!(ctx.state_value(13001), 1);
        assert_eq!(mixer.active_handles().len(), 1);
        assert!(ctx.side_fx().get(13001).is_some());
    }

    #[test]
    fn timers_resolve_key_durations_and_stop_early() {
        let (mut ctx, _, _) = context();
        ctx.set_state_value(90, 4);
        run(&mut ctx, "action:timer:3212([90])");
        assert_eq!(ctx.state_value(3212), 1);
        ctx.process_side_fx(100);
        run(&mut ctx, "action:stop(3212)");
        assert_eq!(ctx.state_value(3212), 3);
    }

    #[test]
    fn random_stays_within_its_bound() {
        let (mut ctx, _, _) = context();
        for _ in 0..32 {
            run(&mut ctx, "action:random:77(5)");
            assert!((0..=5).contains(&ctx.state_value(77)));
        }
    }

    #[test]
    fn set_screen_reaches_the_renderer() {
        let (mut ctx, _, renderer) = context();
        run(&mut ctx, "action:set_screen(tr1ga.tga)");
        assert_eq!(renderer.snapshot().background_image.as_deref(), Some("tr1ga.tga"));
    }

    #[test]
    fn external_and_reserved_actions_continue() {
        let (mut ctx, _, _) = context();
        assert!(run(&mut ctx, "action:animplay:300(foo.rlf 0 0 640 480 0 0 1)"));
        assert!(run(&mut ctx, "action:crossfade(1 2 3)"));
        assert!(ctx.state().is_empty());
        assert_eq!(ctx.state_value(keys::NOT_SET), 0);
    }
}
