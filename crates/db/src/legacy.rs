//! One-time upgrade of older character documents.
//!
//! Records written before the typed model used free-form keys: images
//! named their viewing angle `angle`, animation frames used
//! `frame_index`/`path`/`gif_url`, and the identity descriptor and the
//! reference image lived in `metadata` (`character_dna`,
//! `master_reference_path`, `master_reference_direction`). Documents are rewritten into the current
//! shape here, at load time, so nothing past the repository ever sees
//! the old keys.

use std::str::FromStr;

use pixsynth_core::direction::{Direction, BASE_DIRECTION};
use serde_json::{json, Map, Value};

/// Rewrite legacy keys in place. Returns `true` if anything changed.
pub fn normalize_legacy_document(doc: &mut Value) -> bool {
    let Some(obj) = doc.as_object_mut() else {
        return false;
    };
    let mut changed = false;

    changed |= lift_character_dna(obj);
    changed |= lift_master_reference(obj);

    if let Some(Value::Array(images)) = obj.get_mut("images") {
        let before = images.len();
        for image in images.iter_mut() {
            if let Some(image) = image.as_object_mut() {
                changed |= rename_key(image, "angle", "direction");
                changed |= rename_key(image, "path", "pointer");
                changed |= image.remove("url").is_some();
            }
        }
        images.retain(|image| {
            let valid = image
                .get("direction")
                .and_then(Value::as_str)
                .is_some_and(|d| Direction::from_str(d).is_ok());
            if !valid {
                tracing::warn!(image = %image, "Dropping legacy image without a valid direction");
            }
            valid
        });
        changed |= images.len() != before;
    }

    if let Some(Value::Object(actions)) = obj.get_mut("animations") {
        for directions in actions.values_mut() {
            let Some(directions) = directions.as_object_mut() else {
                continue;
            };
            for frames in directions.values_mut() {
                let Some(frames) = frames.as_array_mut() else {
                    continue;
                };
                for frame in frames.iter_mut().filter_map(Value::as_object_mut) {
                    changed |= rename_key(frame, "frame_index", "index");
                    changed |= rename_key(frame, "path", "pointer");
                    changed |= rename_key(frame, "gif_path", "loop_pointer");
                    changed |= frame.remove("url").is_some();
                    changed |= frame.remove("gif_url").is_some();
                }
            }
        }
    }

    changed
}

/// Move `from` to `to` unless `to` is already present (then just drop
/// `from`).
fn rename_key(obj: &mut Map<String, Value>, from: &str, to: &str) -> bool {
    let Some(value) = obj.remove(from) else {
        return false;
    };
    obj.entry(to).or_insert(value);
    true
}

fn lift_character_dna(obj: &mut Map<String, Value>) -> bool {
    let has_descriptor = obj
        .get("identity_descriptor")
        .is_some_and(|v| !v.is_null());
    if has_descriptor {
        return false;
    }
    let dna = obj
        .get_mut("metadata")
        .and_then(Value::as_object_mut)
        .and_then(|m| m.remove("character_dna"));
    match dna {
        Some(dna) => {
            obj.insert("identity_descriptor".into(), dna);
            true
        }
        None => false,
    }
}

/// `metadata.master_reference_*` becomes `reference_image`. A missing or
/// unknown direction means south, the direction the reference was always
/// taken from.
fn lift_master_reference(obj: &mut Map<String, Value>) -> bool {
    let Some(metadata) = obj.get_mut("metadata").and_then(Value::as_object_mut) else {
        return false;
    };
    let path = metadata.remove("master_reference_path");
    let direction = metadata.remove("master_reference_direction");
    let Some(path) = path else {
        return direction.is_some();
    };

    let has_reference = obj.get("reference_image").is_some_and(|v| !v.is_null());
    match path.as_str().filter(|p| !p.is_empty()) {
        Some(pointer) if !has_reference => {
            let direction = direction
                .as_ref()
                .and_then(Value::as_str)
                .and_then(|d| Direction::from_str(d).ok())
                .unwrap_or(BASE_DIRECTION);
            obj.insert(
                "reference_image".into(),
                json!({"pointer": pointer, "direction": direction.as_str()}),
            );
        }
        Some(_) => {}
        None => {
            tracing::warn!(path = %path, "Dropping legacy master reference without a usable path");
        }
    }
    true
}
