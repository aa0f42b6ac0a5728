//! JSON-pointer patches over view models: producing them on the host side and
//! replaying them on the client side.

use serde_json::{Map, Value};
use thiserror::Error;

use crate::error::PatchError;
use crate::protocol::{HostEnvelope, PatchOp};

/// Ops that turn `old` into `new`.
///
/// Objects are diffed per key and arrays per index; array shrinkage is emitted
/// as removals from the tail so every path stays valid while ops apply in order.
pub fn diff_view_models(old: &Value, new: &Value) -> Vec<PatchOp> {
    let mut ops = Vec::new();
    diff_into(&mut String::new(), old, new, &mut ops);
    ops
}

fn diff_into(path: &mut String, old: &Value, new: &Value, ops: &mut Vec<PatchOp>) {
    match (old, new) {
        (Value::Object(old_map), Value::Object(new_map)) => {
            for key in old_map.keys().filter(|key| !new_map.contains_key(*key)) {
                ops.push(PatchOp::Remove {
                    path: child_path(path, key),
                });
            }
            for (key, new_value) in new_map {
                match old_map.get(key) {
                    Some(old_value) => {
                        let len = path.len();
                        push_token(path, key);
                        diff_into(path, old_value, new_value, ops);
                        path.truncate(len);
                    }
                    None => ops.push(PatchOp::Add {
                        path: child_path(path, key),
                        value: new_value.clone(),
                    }),
                }
            }
        }
        (Value::Array(old_items), Value::Array(new_items)) => {
            for (index, (old_item, new_item)) in old_items.iter().zip(new_items).enumerate() {
                let len = path.len();
                push_token(path, &index.to_string());
                diff_into(path, old_item, new_item, ops);
                path.truncate(len);
            }
            for index in (new_items.len()..old_items.len()).rev() {
                ops.push(PatchOp::Remove {
                    path: child_path(path, &index.to_string()),
                });
            }
            for (index, item) in new_items.iter().enumerate().skip(old_items.len()) {
                ops.push(PatchOp::Add {
                    path: child_path(path, &index.to_string()),
                    value: item.clone(),
                });
            }
        }
        _ if old != new => ops.push(PatchOp::Replace {
            path: path.clone(),
            value: new.clone(),
        }),
        _ => {}
    }
}

fn push_token(path: &mut String, token: &str) {
    path.push('/');
    for ch in token.chars() {
        match ch {
            '~' => path.push_str("~0"),
            '/' => path.push_str("~1"),
            other => path.push(other),
        }
    }
}

fn child_path(parent: &str, token: &str) -> String {
    let mut path = parent.to_string();
    push_token(&mut path, token);
    path
}

pub fn apply_patch_ops(vm: &mut Value, ops: &[PatchOp]) -> Result<(), PatchError> {
    for op in ops {
        match op {
            PatchOp::Replace { path, value } => set_path(vm, path, value.clone(), true)?,
            PatchOp::Add { path, value } => set_path(vm, path, value.clone(), false)?,
            PatchOp::Remove { path } => remove_path(vm, path)?,
        }
    }

    Ok(())
}

fn set_path(root: &mut Value, path: &str, value: Value, replace_only: bool) -> Result<(), PatchError> {
    let tokens = parse_pointer(path)?;

    let Some((last, parents)) = tokens.split_last() else {
        *root = value;
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        current = descend_or_create(current, token, path)?;
    }

    match current {
        Value::Object(map) => {
            if replace_only && !map.contains_key(last) {
                return Err(PatchError::MissingPath {
                    path: path.to_string(),
                });
            }

            map.insert(last.clone(), value);
            Ok(())
        }
        Value::Array(items) => {
            let max = if replace_only {
                items.len().saturating_sub(1)
            } else {
                items.len()
            };
            let index = parse_index(last, max, path)?;

            if index == items.len() {
                items.push(value);
            } else if replace_only {
                items[index] = value;
            } else {
                items.insert(index, value);
            }

            Ok(())
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn remove_path(root: &mut Value, path: &str) -> Result<(), PatchError> {
    let tokens = parse_pointer(path)?;

    let Some((last, parents)) = tokens.split_last() else {
        *root = Value::Object(Map::new());
        return Ok(());
    };

    let mut current = root;
    for token in parents {
        current = descend_existing(current, token).ok_or_else(|| PatchError::MissingPath {
            path: path.to_string(),
        })?;
    }

    match current {
        Value::Object(map) => match map.remove(last) {
            Some(_) => Ok(()),
            None => Err(PatchError::MissingPath {
                path: path.to_string(),
            }),
        },
        Value::Array(items) => {
            let index = parse_index(last, items.len().saturating_sub(1), path)?;

            if index < items.len() {
                items.remove(index);
                Ok(())
            } else {
                Err(PatchError::IndexOutOfBounds {
                    token: last.clone(),
                    path: path.to_string(),
                })
            }
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn parse_pointer(path: &str) -> Result<Vec<String>, PatchError> {
    if path.is_empty() {
        return Ok(vec![]);
    }

    if !path.starts_with('/') {
        return Err(PatchError::InvalidPointer {
            path: path.to_string(),
        });
    }

    path.split('/')
        .skip(1)
        .map(unescape_pointer_token)
        .collect()
}

fn unescape_pointer_token(token: &str) -> Result<String, PatchError> {
    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars();

    while let Some(ch) = chars.next() {
        if ch == '~' {
            match chars.next() {
                Some('0') => out.push('~'),
                Some('1') => out.push('/'),
                _ => {
                    return Err(PatchError::InvalidEscape {
                        token: token.to_string(),
                    });
                }
            }
        } else {
            out.push(ch);
        }
    }

    Ok(out)
}

fn descend_or_create<'a>(
    value: &'a mut Value,
    token: &str,
    path: &str,
) -> Result<&'a mut Value, PatchError> {
    match value {
        Value::Object(map) => Ok(map
            .entry(token.to_string())
            .or_insert_with(|| Value::Object(Map::new()))),
        Value::Array(items) => {
            let index = parse_index(token, items.len().saturating_sub(1), path)?;
            items
                .get_mut(index)
                .ok_or_else(|| PatchError::IndexOutOfBounds {
                    token: token.to_string(),
                    path: path.to_string(),
                })
        }
        _ => Err(PatchError::NotAContainer {
            path: path.to_string(),
        }),
    }
}

fn descend_existing<'a>(value: &'a mut Value, token: &str) -> Option<&'a mut Value> {
    match value {
        Value::Object(map) => map.get_mut(token),
        Value::Array(items) => token
            .parse::<usize>()
            .ok()
            .and_then(|index| items.get_mut(index)),
        _ => None,
    }
}

fn parse_index(token: &str, max_index: usize, path: &str) -> Result<usize, PatchError> {
    let index = token.parse::<usize>().map_err(|_| PatchError::InvalidIndex {
        token: token.to_string(),
        path: path.to_string(),
    })?;

    if index > max_index {
        Err(PatchError::IndexOutOfBounds {
            token: token.to_string(),
            path: path.to_string(),
        })
    } else {
        Ok(index)
    }
}

/// Client-side copy of the host's view model, kept in step by revision.
#[derive(Debug, Clone, Default)]
pub struct ViewMirror {
    pub vm: Value,
    pub last_rev: Option<u64>,
    pub last_ack: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum MirrorError {
    #[error("revision mismatch: rev={rev}, expected={expected:?}")]
    RevisionMismatch { rev: u64, expected: Option<u64> },

    #[error("patch apply failed: {0}")]
    Patch(#[from] PatchError),
}

impl ViewMirror {
    /// Applies a render or patch envelope; other envelopes are ignored.
    ///
    /// On any failure the mirror resets and waits for a fresh render.
    pub fn apply(&mut self, envelope: &HostEnvelope) -> Result<(), MirrorError> {
        let result = match envelope {
            HostEnvelope::Render { rev, vm, .. } => self.apply_render(*rev, vm),
            HostEnvelope::Patch { rev, ack, ops, .. } => self.apply_patch(*rev, *ack, ops),
            HostEnvelope::Error { .. } | HostEnvelope::Snapshot { .. } => Ok(()),
        };

        if result.is_err() {
            *self = Self::default();
        }
        result
    }

    fn apply_render(&mut self, rev: u64, vm: &Value) -> Result<(), MirrorError> {
        match self.last_rev {
            Some(last_rev) if rev != last_rev.wrapping_add(1) => {
                return Err(MirrorError::RevisionMismatch {
                    rev,
                    expected: Some(last_rev.wrapping_add(1)),
                });
            }
            _ => {}
        }

        self.vm = vm.clone();
        self.last_rev = Some(rev);
        Ok(())
    }

    fn apply_patch(&mut self, rev: u64, ack: Option<u64>, ops: &[PatchOp]) -> Result<(), MirrorError> {
        let expected = self.last_rev.map(|last_rev| last_rev.wrapping_add(1));
        if expected != Some(rev) {
            return Err(MirrorError::RevisionMismatch { rev, expected });
        }

        apply_patch_ops(&mut self.vm, ops)?;
        self.last_rev = Some(rev);
        if let Some(next_ack) = ack {
            self.last_ack = Some(self.last_ack.map_or(next_ack, |current| current.max(next_ack)));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn replayed(old: &Value, new: &Value) -> Value {
        let ops = diff_view_models(old, new);
        let mut vm = old.clone();
        apply_patch_ops(&mut vm, &ops).expect("apply diff");
        vm
    }

    #[test]
    fn identical_values_need_no_ops() {
        let vm = json!({"a": [1, 2, {"b": null}], "c": "x"});
        assert!(diff_view_models(&vm, &vm).is_empty());
    }

    #[test]
    fn scalar_change_is_a_single_replace() {
        let old = json!({"pricing": {"total": 5250.0}});
        let new = json!({"pricing": {"total": 7875.0}});
        assert_eq!(
            diff_view_models(&old, &new),
            vec![PatchOp::Replace {
                path: "/pricing/total".to_string(),
                value: json!(7875.0),
            }]
        );
    }

    #[test]
    fn array_growth_and_shrink_replay() {
        let old = json!({"windows": [{"id": 1}, {"id": 2}, {"id": 3}]});
        let shrunk = json!({"windows": [{"id": 1}]});
        let grown = json!({"windows": [{"id": 1}, {"id": 2}, {"id": 3}, {"id": 4}]});

        let ops = diff_view_models(&old, &shrunk);
        assert_eq!(ops[0].path(), "/windows/2");
        assert_eq!(ops[1].path(), "/windows/1");
        assert_eq!(replayed(&old, &shrunk), shrunk);
        assert_eq!(replayed(&old, &grown), grown);
    }

    #[test]
    fn keys_are_pointer_escaped() {
        let old = json!({});
        let new = json!({"a/b": 1, "c~d": 2});
        let ops = diff_view_models(&old, &new);
        let paths: Vec<&str> = ops.iter().map(PatchOp::path).collect();
        assert!(paths.contains(&"/a~1b"));
        assert!(paths.contains(&"/c~0d"));
        assert_eq!(replayed(&old, &new), new);
    }

    #[test]
    fn type_change_replaces_whole_value() {
        let old = json!({"section": null});
        let new = json!({"section": {"index": 2}});
        assert_eq!(replayed(&old, &new), new);

        let root_old = json!([1]);
        let root_new = json!("x");
        assert_eq!(
            diff_view_models(&root_old, &root_new),
            vec![PatchOp::Replace {
                path: String::new(),
                value: json!("x"),
            }]
        );
    }

    #[test]
    fn replace_requires_existing_key() {
        let mut vm = json!({"a": 1});
        let err = apply_patch_ops(
            &mut vm,
            &[PatchOp::Replace {
                path: "/b".to_string(),
                value: json!(2),
            }],
        )
        .expect_err("missing");
        assert_eq!(err, PatchError::MissingPath { path: "/b".to_string() });
    }

    #[test]
    fn invalid_pointers_are_rejected() {
        let mut vm = json!({"a": [1]});
        assert!(matches!(
            apply_patch_ops(&mut vm, &[PatchOp::Remove { path: "a".to_string() }]),
            Err(PatchError::InvalidPointer { .. })
        ));
        assert!(matches!(
            apply_patch_ops(&mut vm, &[PatchOp::Remove { path: "/a/x".to_string() }]),
            Err(PatchError::InvalidIndex { .. })
        ));
        assert!(matches!(
            apply_patch_ops(&mut vm, &[PatchOp::Remove { path: "/a/~2".to_string() }]),
            Err(PatchError::InvalidEscape { .. })
        ));
    }

    #[test]
    fn mirror_requires_monotonic_revisions() {
        let mut mirror = ViewMirror::default();
        let patch = HostEnvelope::Patch {
            sid: "S1".to_string(),
            rev: 1,
            ack: None,
            ops: Vec::new(),
        };
        assert_eq!(
            mirror.apply(&patch),
            Err(MirrorError::RevisionMismatch { rev: 1, expected: None })
        );

        let render = HostEnvelope::Render {
            sid: "S1".to_string(),
            rev: 1,
            vm: json!({"n": 1}),
        };
        mirror.apply(&render).expect("render");

        let next = HostEnvelope::Patch {
            sid: "S1".to_string(),
            rev: 2,
            ack: Some(5),
            ops: vec![PatchOp::Replace {
                path: "/n".to_string(),
                value: json!(2),
            }],
        };
        mirror.apply(&next).expect("patch");
        assert_eq!(mirror.vm, json!({"n": 2}));
        assert_eq!(mirror.last_ack, Some(5));

        let stale = HostEnvelope::Patch {
            sid: "S1".to_string(),
            rev: 2,
            ack: Some(3),
            ops: Vec::new(),
        };
        assert!(mirror.apply(&stale).is_err());
        assert_eq!(mirror.last_rev, None);
    }
}
