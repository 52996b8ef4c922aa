use std::fs::{self, File};
use std::io::{BufReader, BufWriter, Write};

use anyhow::{Context, Result};
use tempfile::tempdir;
use zvision_formats::{
    flags, read_state_table, write_state_table, ControlKind, KillTarget, Location, ResultAction,
    ScrFile, ValueSlot, node_type,
};

const TE1A: &str = "\
# Temple entrance, node 1 view a
puzzle:13107 {
    criteria {
        [13101] = 1
        [13102] ! [13103]
    }
    results {
        action:assign(13110, [13101])
        action:change_location(t, e, 2, a, 0)
        background:music:13111(0 te1ae01c.raw 1 180)
        action:kill(timer)
    }
    flags {
        ONCE_PER_INST
    }
}

control:13200 push_toggle {
    flat_hotspot(130, 276, 246, 364)
    cursor(handpt)
    count_to(2)
}

control:13201 tilt {
    angle(20)
    linscale(0.7)
}
";

#[test]
fn scripts_parse_from_disk_with_crlf_and_latin1_bytes() -> Result<()> {
    let dir = tempdir().context("creating temporary directory")?;
    let path = dir.path().join("TE1A.SCR");
    let mut bytes = TE1A.replace('\n', "\r\n").into_bytes();
    bytes.extend_from_slice(b"# caf\xe9\r\n");
    fs::write(&path, &bytes)?;

    let file = ScrFile::from_bytes(&fs::read(&path)?);
    assert!(file.diagnostics.is_empty(), "{:?}", file.diagnostics);
    assert_eq!(file.puzzles.len(), 1);

    let puzzle = &file.puzzles[0];
    assert_eq!(puzzle.key, 13107);
    assert_eq!(puzzle.flags, flags::ONCE_PER_INST);
    assert_eq!(
        puzzle.referenced_keys().collect::<Vec<_>>(),
        vec![13107, 13101, 13102]
    );
    assert_eq!(
        puzzle.results,
        vec![
            ResultAction::Assign {
                key: 13110,
                value: ValueSlot::Key(13101),
            },
            ResultAction::ChangeLocation {
                target: Location::new(b't', b'e', b'2', b'a', 0),
            },
            ResultAction::Music {
                slot: 13111,
                kind: 0,
                file: "te1ae01c.raw".to_string(),
                looping: true,
                volume: 180,
                universe: false,
            },
            ResultAction::Kill {
                target: KillTarget::Types(node_type::TIMER),
            },
        ]
    );

    let kinds: Vec<ControlKind> = file.controls.iter().map(|control| control.kind).collect();
    assert_eq!(kinds, vec![ControlKind::PushToggle, ControlKind::Tilt]);
    assert!(file.controls[1].projection().is_some());

    let screen = ScrFile::from_bytes(b"puzzle:1 {\nresults {\naction:set_screen(caf\xe9.png)\n}\n}\n");
    assert_eq!(
        screen.puzzles[0].results,
        vec![ResultAction::SetScreen {
            file: "caf\u{e9}.png".to_string(),
        }]
    );
    Ok(())
}

#[test]
fn state_tables_round_trip_through_files() -> Result<()> {
    let dir = tempdir()?;
    let path = dir.path().join("save.bin");
    let entries = vec![(3, i32::from(b'g')), (4, i32::from(b'a')), (13110, -7)];

    let mut writer = BufWriter::new(File::create(&path)?);
    write_state_table(&mut writer, entries.clone())?;
    writer.flush()?;

    assert_eq!(fs::metadata(&path)?.len(), 4 + 8 * 3);
    let restored = read_state_table(&mut BufReader::new(File::open(&path)?))?;
    assert_eq!(restored, entries);
    Ok(())
}
