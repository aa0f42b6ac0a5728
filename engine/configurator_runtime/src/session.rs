use serde_json::Value;

use crate::editor::{Editor, EditorEffect};
use crate::intent::Intent;
use crate::protocol::{ClientEnvelope, HOST_TO_CLIENT_CAP, HostEnvelope, error_envelope};
use crate::view::{project_snapshot, render_view_model};
use crate::vm_patch::diff_view_models;

pub const DECODE_ERROR: &str = "decode_error";
pub const SID_MISMATCH: &str = "sid_mismatch";
pub const INVALID_INTENT: &str = "invalid_intent";
pub const INTERNAL_ERROR: &str = "internal_error";
pub const FRAME_TOO_LARGE: &str = "frame_too_large";

/// Host side of one editing session.
///
/// Every inbound envelope yields exactly one outbound envelope. The view model
/// is rebuilt from the editor after each accepted intent and sent as a diff
/// against the last one the client received. An envelope that would not fit
/// in one outbound frame is replaced by a `frame_too_large` error and leaves
/// the revision and the client's view model where they were.
#[derive(Debug)]
pub struct Session {
    sid: String,
    frame_cap: usize,
    editor: Editor,
    last_rev: Option<u64>,
    last_ack: Option<u64>,
    last_vm: Option<Value>,
}

impl Session {
    pub fn new(sid: impl Into<String>) -> Self {
        Self::with_editor(sid, Editor::new())
    }

    pub fn with_editor(sid: impl Into<String>, editor: Editor) -> Self {
        Self {
            sid: sid.into(),
            frame_cap: HOST_TO_CLIENT_CAP,
            editor,
            last_rev: None,
            last_ack: None,
            last_vm: None,
        }
    }

    /// Lowers the outbound payload limit below the protocol cap.
    pub fn with_frame_cap(mut self, frame_cap: usize) -> Self {
        self.frame_cap = frame_cap.min(HOST_TO_CLIENT_CAP);
        self
    }

    pub fn sid(&self) -> &str {
        &self.sid
    }

    pub fn editor(&self) -> &Editor {
        &self.editor
    }

    pub fn last_rev(&self) -> Option<u64> {
        self.last_rev
    }

    pub fn last_ack(&self) -> Option<u64> {
        self.last_ack
    }

    pub fn handle(&mut self, envelope: ClientEnvelope) -> HostEnvelope {
        match envelope {
            ClientEnvelope::Ready { sid, .. } => {
                if sid != self.sid {
                    return self.sid_mismatch(&sid, "ready");
                }
                tracing::debug!(target: "configurator.session", sid = %sid, "client ready; sending full render");
                self.publish(None, true)
            }
            ClientEnvelope::Intent {
                sid,
                id,
                name,
                payload,
            } => {
                if sid != self.sid {
                    return self.sid_mismatch(&sid, "intent");
                }
                self.handle_intent(id, &name, &payload)
            }
        }
    }

    pub fn decode_failure(&self, err: &serde_json::Error) -> HostEnvelope {
        tracing::warn!(target: "configurator.session", error = %err, "undecodable client envelope");
        error_envelope(&self.sid, self.last_rev, DECODE_ERROR, err.to_string())
    }

    fn handle_intent(&mut self, id: u64, name: &str, payload: &Value) -> HostEnvelope {
        let applied = Intent::decode(name, payload).and_then(|intent| self.editor.apply(&intent));

        let effect = match applied {
            Ok(effect) => effect,
            Err(err) => {
                tracing::warn!(
                    target: "configurator.session",
                    intent_id = id,
                    intent = %name,
                    error = %err,
                    "intent rejected"
                );
                return error_envelope(&self.sid, self.last_rev, INVALID_INTENT, err.to_string());
            }
        };

        tracing::debug!(
            target: "configurator.session",
            intent_id = id,
            intent = %name,
            windows = self.editor.project().window_count(),
            total = self.editor.project().total_price(),
            "intent applied"
        );
        self.mark_ack(id);

        match effect {
            EditorEffect::Updated => self.publish(Some(id), false),
            EditorEffect::SaveRequested => match project_snapshot(self.editor.project()) {
                Ok(project) => {
                    tracing::info!(target: "configurator.session", intent_id = id, "project snapshot requested");
                    let envelope = HostEnvelope::Snapshot {
                        sid: self.sid.clone(),
                        ack: Some(id),
                        project,
                    };
                    self.undeliverable(&envelope).unwrap_or(envelope)
                }
                Err(err) => self.internal_error(&err),
            },
        }
    }

    fn publish(&mut self, ack: Option<u64>, full: bool) -> HostEnvelope {
        let vm = match render_view_model(&self.editor) {
            Ok(vm) => vm,
            Err(err) => return self.internal_error(&err),
        };
        let rev = self.last_rev.map_or(1, |last| last.wrapping_add(1));

        let envelope = match &self.last_vm {
            Some(previous) if !full => HostEnvelope::Patch {
                sid: self.sid.clone(),
                rev,
                ack,
                ops: diff_view_models(previous, &vm),
            },
            _ => HostEnvelope::Render {
                sid: self.sid.clone(),
                rev,
                vm: vm.clone(),
            },
        };
        if let Some(error) = self.undeliverable(&envelope) {
            return error;
        }

        self.last_rev = Some(rev);
        self.last_vm = Some(vm);
        envelope
    }

    /// Error to send instead of `envelope` when it cannot be framed.
    fn undeliverable(&self, envelope: &HostEnvelope) -> Option<HostEnvelope> {
        let size = match serde_json::to_vec(envelope) {
            Ok(payload) => payload.len(),
            Err(err) => return Some(self.internal_error(&err)),
        };
        if size <= self.frame_cap {
            return None;
        }

        tracing::warn!(
            target: "configurator.session",
            size,
            cap = self.frame_cap,
            windows = self.editor.project().window_count(),
            "outbound envelope too large"
        );
        Some(error_envelope(
            &self.sid,
            self.last_rev,
            FRAME_TOO_LARGE,
            format!("frame too large: {size} > {}", self.frame_cap),
        ))
    }

    fn mark_ack(&mut self, id: u64) {
        self.last_ack = Some(self.last_ack.map_or(id, |current| current.max(id)));
    }

    fn sid_mismatch(&self, sid: &str, kind: &str) -> HostEnvelope {
        tracing::warn!(
            target: "configurator.session",
            expected = %self.sid,
            received = %sid,
            "sid mismatch for {kind} envelope"
        );
        error_envelope(
            &self.sid,
            self.last_rev,
            SID_MISMATCH,
            format!("sid mismatch for {kind} envelope: expected {}, got {sid}", self.sid),
        )
    }

    fn internal_error(&self, err: &serde_json::Error) -> HostEnvelope {
        tracing::error!(target: "configurator.session", error = %err, "failed to build view model");
        error_envelope(&self.sid, self.last_rev, INTERNAL_ERROR, err.to_string())
    }
}
