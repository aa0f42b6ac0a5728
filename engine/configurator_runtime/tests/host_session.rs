use std::io::{self, Cursor, Write};
use std::sync::{Arc, Mutex};

use configurator_runtime::protocol::{
    CLIENT_TO_HOST_CAP, HOST_TO_CLIENT_CAP, decode_host_envelope, encode_client_envelope,
    encode_host_envelope, read_frame, write_frame,
};
use configurator_runtime::session::FRAME_TOO_LARGE;
use configurator_runtime::view::render_view_model;
use configurator_runtime::vm_patch::ViewMirror;
use configurator_runtime::{
    ClientEnvelope, Editor, HostConfig, HostEnvelope, Intent, Project, Session, serve,
};
use serde_json::{Value, json};

#[derive(Clone, Default)]
struct SharedBuffer(Arc<Mutex<Vec<u8>>>);

impl SharedBuffer {
    fn bytes(&self) -> Vec<u8> {
        self.0.lock().expect("buffer lock").clone()
    }
}

impl Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        self.0.lock().expect("buffer lock").extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

fn ready(sid: &str) -> ClientEnvelope {
    ClientEnvelope::Ready {
        sid: sid.to_string(),
        capabilities: json!({}),
    }
}

fn intent(id: u64, name: &str, payload: Value) -> ClientEnvelope {
    ClientEnvelope::Intent {
        sid: "S1".to_string(),
        id,
        name: name.to_string(),
        payload,
    }
}

fn frames(envelopes: &[ClientEnvelope]) -> Vec<u8> {
    let mut input = Vec::new();
    for envelope in envelopes {
        let payload = encode_client_envelope(envelope).expect("encode");
        write_frame(&mut input, &payload, CLIENT_TO_HOST_CAP).expect("frame");
    }
    input
}

fn run_session(input: Vec<u8>) -> Vec<HostEnvelope> {
    let output = SharedBuffer::default();
    serve(Cursor::new(input), output.clone(), &HostConfig::default()).expect("serve");

    let mut cursor = Cursor::new(output.bytes());
    let mut envelopes = Vec::new();
    loop {
        match read_frame(&mut cursor, HOST_TO_CLIENT_CAP) {
            Ok(payload) => envelopes.push(decode_host_envelope(&payload).expect("decode")),
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => break,
            Err(err) => panic!("bad output frame: {err}"),
        }
    }
    envelopes
}

#[test]
fn edit_session_keeps_mirror_in_step() {
    let envelopes = run_session(frames(&[
        ready("S1"),
        intent(1, "window.add", json!({})),
        intent(2, "window.update", json!({"patch": {"width": 120, "material": "Wood"}})),
        intent(3, "window.grid", json!({"columns": 3, "rows": 1})),
        intent(4, "section.select", json!({"index": 2})),
        intent(5, "section.update", json!({"section": 2, "patch": {"type": "TiltTurn"}})),
        intent(6, "installation.set", json!({"type": "Complex"})),
        intent(7, "window.remove", json!({"index": 0})),
        intent(8, "menu.toggle", json!({})),
    ]));
    assert_eq!(envelopes.len(), 9);

    let mut mirror = ViewMirror::default();
    for (expected_rev, envelope) in (1u64..).zip(&envelopes) {
        match envelope {
            HostEnvelope::Render { rev, .. } | HostEnvelope::Patch { rev, .. } => {
                assert_eq!(*rev, expected_rev);
            }
            other => panic!("unexpected envelope {other:?}"),
        }
        mirror.apply(envelope).expect("mirror apply");
    }

    assert_eq!(mirror.last_rev, Some(9));
    assert_eq!(mirror.last_ack, Some(8));

    let vm = &mirror.vm;
    let windows = vm["project"]["windows"].as_array().expect("windows");
    assert_eq!(windows.len(), 1);
    assert_eq!(windows[0]["width"], 120.0);
    assert_eq!(windows[0]["material"], "Wood");
    assert_eq!(windows[0]["sections"][2]["type"], "TiltTurn");
    assert_eq!(vm["project"]["installationType"]["type"], "Complex");
    assert_eq!(vm["selection"]["window"], 0);
    assert_eq!(vm["selection"]["menuOpen"], true);
    assert_eq!(vm["canRemoveWindow"], false);
    assert_eq!(vm["pricing"]["totalDisplay"], "4056.00 zł");
}

#[test]
fn bad_frames_and_foreign_sids_yield_errors() {
    let mut input = frames(&[ready("S1")]);
    write_frame(&mut input, b"{ not json", CLIENT_TO_HOST_CAP).expect("frame");
    input.extend(frames(&[
        ClientEnvelope::Intent {
            sid: "S2".to_string(),
            id: 1,
            name: "window.add".to_string(),
            payload: json!({}),
        },
        intent(2, "window.explode", json!({})),
        intent(3, "window.add", json!({})),
    ]));

    let envelopes = run_session(input);
    assert_eq!(envelopes.len(), 5);

    let codes: Vec<Option<&str>> = envelopes
        .iter()
        .map(|envelope| match envelope {
            HostEnvelope::Error { code, rev, .. } => {
                assert_eq!(*rev, Some(1));
                Some(code.as_str())
            }
            _ => None,
        })
        .collect();
    assert_eq!(
        codes,
        vec![None, Some("decode_error"), Some("sid_mismatch"), Some("invalid_intent"), None]
    );
    assert!(matches!(
        envelopes[4],
        HostEnvelope::Patch { rev: 2, ack: Some(3), .. }
    ));
}

#[test]
fn save_emits_snapshot_that_restores_project() {
    let envelopes = run_session(frames(&[
        ready("S1"),
        intent(1, "window.add", json!({})),
        intent(2, "installation.set", json!({"arg": "Atypical"})),
        intent(3, "project.save", Value::Null),
    ]));

    let project = match envelopes.last() {
        Some(HostEnvelope::Snapshot { project, ack, .. }) => {
            assert_eq!(*ack, Some(3));
            project.clone()
        }
        other => panic!("expected snapshot, got {other:?}"),
    };

    let restored: configurator_runtime::Project =
        serde_json::from_value(project).expect("restore snapshot");
    assert_eq!(restored.window_count(), 2);
    assert_eq!(
        restored.installation_type(),
        configurator_runtime::InstallationClass::Atypical
    );
    assert!((restored.total_price() - 2.0 * 7875.0).abs() < 1e-6);

    // New ids continue past the restored ones.
    let grown = restored.add_window();
    let ids: Vec<_> = grown
        .windows()
        .iter()
        .flat_map(|window| std::iter::once(window.id).chain(window.sections.iter().map(|s| s.id)))
        .collect();
    let unique: std::collections::HashSet<_> = ids.iter().collect();
    assert_eq!(unique.len(), ids.len());
}

#[test]
fn empty_input_produces_no_output() {
    assert!(run_session(Vec::new()).is_empty());
}

fn error_code(envelope: &HostEnvelope) -> Option<(&str, Option<u64>)> {
    match envelope {
        HostEnvelope::Error { code, rev, .. } => Some((code.as_str(), *rev)),
        _ => None,
    }
}

#[test]
fn oversized_render_is_refused_without_ending_session() {
    let mut project = Project::new();
    for _ in 1..2200 {
        project = project.add_window();
    }
    let mut session = Session::with_editor("S1", Editor::from_project(project));

    let refused = session.handle(ready("S1"));
    assert_eq!(error_code(&refused), Some((FRAME_TOO_LARGE, None)));
    assert_eq!(session.last_rev(), None);

    let next = session.handle(intent(1, "window.remove", json!({"index": 0})));
    assert_eq!(error_code(&next), Some((FRAME_TOO_LARGE, None)));
    assert_eq!(session.editor().project().window_count(), 2199);
    assert_eq!(session.last_ack(), Some(1));
}

#[test]
fn refused_frame_keeps_revision_and_mirror_in_step() {
    let large = Editor::from_project(Project::new().resize_grid(0, 4, 4));

    // Cap the session at exactly the size of the 1x1 render it will send.
    let mut small = large.clone();
    small
        .apply(&Intent::ResizeGrid { window: None, columns: 1, rows: 1 })
        .expect("resize");
    let cap = {
        let mut reference = Session::with_editor("S1", small);
        encode_host_envelope(&reference.handle(ready("S1"))).expect("encode").len()
    };
    let mut session = Session::with_editor("S1", large).with_frame_cap(cap);

    let envelopes = vec![
        session.handle(ready("S1")),
        session.handle(intent(1, "window.grid", json!({"columns": 1, "rows": 1}))),
        session.handle(intent(2, "menu.toggle", json!({}))),
        session.handle(ready("S1")),
    ];

    assert_eq!(error_code(&envelopes[0]), Some((FRAME_TOO_LARGE, None)));
    assert!(matches!(envelopes[1], HostEnvelope::Render { rev: 1, .. }));
    assert!(matches!(envelopes[2], HostEnvelope::Patch { rev: 2, ack: Some(2), .. }));
    assert!(matches!(envelopes[3], HostEnvelope::Render { rev: 3, .. }));

    let mut mirror = ViewMirror::default();
    for envelope in &envelopes {
        mirror.apply(envelope).expect("mirror apply");
    }
    assert_eq!(mirror.last_rev, Some(3));
    assert_eq!(mirror.vm, render_view_model(session.editor()).expect("render"));
}
