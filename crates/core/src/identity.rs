//! Identity descriptor ("character DNA") construction.
//!
//! The descriptor is built once from the creation form and then reused
//! verbatim by every image, direction and animation call for the
//! character. Field order and truncation caps are fixed so rebuilding
//! from identical input always yields the identical string.

use crate::form::CharacterForm;

/// Maximum number of appearance characters carried into the descriptor.
pub const APPEARANCE_CAP: usize = 100;
/// Maximum number of special-feature characters carried into the descriptor.
pub const SPECIAL_FEATURES_CAP: usize = 80;

/// Archetype used when the form has neither a class nor a name.
const FALLBACK_ARCHETYPE: &str = "character";

/// Build the identity descriptor for a character.
///
/// Order: archetype (class, else name), appearance (capped), special
/// features (capped), body qualifiers inferred from the appearance text,
/// fixed style suffix naming the raster resolution.
pub fn build_identity_descriptor(form: &CharacterForm, image_size: u32) -> String {
    let mut parts: Vec<String> = Vec::with_capacity(6);

    let archetype = CharacterForm::non_empty(&form.character_class)
        .or_else(|| Some(form.name.as_str()).filter(|n| !n.trim().is_empty()))
        .unwrap_or(FALLBACK_ARCHETYPE);
    parts.push(archetype.to_string());

    if let Some(appearance) = CharacterForm::non_empty(&form.appearance) {
        parts.push(truncate_chars(appearance, APPEARANCE_CAP));
    }

    if let Some(special) = CharacterForm::non_empty(&form.special_features) {
        parts.push(truncate_chars(special, SPECIAL_FEATURES_CAP));
    }

    parts.extend(
        body_qualifiers(form.appearance.as_deref().unwrap_or_default())
            .into_iter()
            .map(str::to_string),
    );

    let mut descriptor = parts.join(", ");
    descriptor.push_str(&format!(
        ", consistent silhouette, compact proportions, retro pixel art {image_size}x{image_size}"
    ));
    descriptor
}

/// Infer body-size qualifiers from free-text appearance.
///
/// Always yields a build qualifier (`slim body`, `heavy body` or the
/// default `normal body`), optionally followed by a limb qualifier.
pub fn body_qualifiers(appearance: &str) -> Vec<&'static str> {
    let text = appearance.to_lowercase();
    let mut qualifiers = Vec::with_capacity(2);

    if text.contains("slim") || text.contains("thin") {
        qualifiers.push("slim body");
    } else if text.contains("fat") || text.contains("heavy") {
        qualifiers.push("heavy body");
    } else {
        qualifiers.push("normal body");
    }

    if text.contains("small") || text.contains("tiny") {
        qualifiers.push("small limbs");
    } else if text.contains("large") || text.contains("big") {
        qualifiers.push("large limbs");
    }

    qualifiers
}

/// Keep at most `cap` Unicode scalar values.
fn truncate_chars(s: &str, cap: usize) -> String {
    s.chars().take(cap).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ninja() -> CharacterForm {
        CharacterForm {
            name: "Kage".into(),
            character_class: Some("A masked pixel-art ninja".into()),
            appearance: Some("black hood, slim build, small hands".into()),
            special_features: Some("red scarf".into()),
            ..Default::default()
        }
    }

    #[test]
    fn golden_descriptor() {
        assert_eq!(
            build_identity_descriptor(&ninja(), 64),
            "A masked pixel-art ninja, black hood, slim build, small hands, red scarf, \
             slim body, small limbs, consistent silhouette, compact proportions, \
             retro pixel art 64x64"
        );
    }

    #[test]
    fn deterministic_for_identical_input() {
        let a = build_identity_descriptor(&ninja(), 64);
        let b = build_identity_descriptor(&ninja(), 64);
        assert_eq!(a, b);
    }

    #[test]
    fn name_used_when_class_missing() {
        let form = CharacterForm {
            name: "Bob".into(),
            ..Default::default()
        };
        assert_eq!(
            build_identity_descriptor(&form, 128),
            "Bob, normal body, consistent silhouette, compact proportions, retro pixel art 128x128"
        );
    }

    #[test]
    fn fallback_archetype_when_no_class_or_name() {
        let form = CharacterForm::default();
        assert!(build_identity_descriptor(&form, 64).starts_with("character, normal body"));
    }

    #[test]
    fn appearance_capped_at_100_chars() {
        let form = CharacterForm {
            name: "Bob".into(),
            appearance: Some("a".repeat(150)),
            ..Default::default()
        };
        let d = build_identity_descriptor(&form, 64);
        assert!(d.starts_with(&format!("Bob, {}, normal body", "a".repeat(100))));
    }

    #[test]
    fn special_features_capped_at_80_chars() {
        let form = CharacterForm {
            name: "Bob".into(),
            special_features: Some("z".repeat(90)),
            ..Default::default()
        };
        let d = build_identity_descriptor(&form, 64);
        assert!(d.contains(&format!("Bob, {}, normal body", "z".repeat(80))));
    }

    #[test]
    fn truncation_counts_characters_not_bytes() {
        let form = CharacterForm {
            name: "Bob".into(),
            appearance: Some("é".repeat(120)),
            ..Default::default()
        };
        let d = build_identity_descriptor(&form, 64);
        assert!(d.contains(&"é".repeat(100)));
        assert!(!d.contains(&"é".repeat(101)));
    }

    #[test]
    fn body_qualifier_keywords() {
        assert_eq!(body_qualifiers("Thin and tall"), vec!["slim body"]);
        assert_eq!(body_qualifiers("heavy armor"), vec!["heavy body"]);
        assert_eq!(
            body_qualifiers("big fists"),
            vec!["normal body", "large limbs"]
        );
        assert_eq!(
            body_qualifiers("tiny slim elf"),
            vec!["slim body", "small limbs"]
        );
        assert_eq!(body_qualifiers(""), vec!["normal body"]);
    }
}
