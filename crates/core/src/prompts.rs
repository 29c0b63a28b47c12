//! Text prompts sent to the generation providers.
//!
//! Every builder takes the persisted identity descriptor and places it
//! first, unchanged, so each downstream call sees the same identity text.

use crate::direction::Direction;
use crate::poses::ActionType;

/// Clause appended to reference-guided animation descriptions.
pub const REFERENCE_CONSTRAINT: &str = "Keep proportions, colors, silhouette, armor shape, \
hood shape, scarf length, and body size exactly the same as the reference. Do not change the \
character design. Character only, no effects, no particles, no motion lines, no extra \
elements, 8-bit pixel art, no background";

const CONSISTENCY_PHRASES: [&str; 20] = [
    "same character",
    "consistent character design",
    "identical appearance",
    "same color palette",
    "same proportions",
    "character only",
    "no effects",
    "no particles",
    "no motion lines",
    "no motion blur",
    "no trails",
    "no sparks",
    "no dust",
    "no smoke",
    "no extra elements",
    "no decorations",
    "no background objects",
    "8-bit pixel art style",
    "clean outline",
    "sharp edges",
];

/// Prompt for the south-facing base image.
pub fn base_image_prompt(descriptor: &str) -> String {
    format!("{descriptor}, side view, facing south, 8-bit pixel art, no background")
}

/// Description for a reference-guided frame sequence.
pub fn reference_animation_prompt(descriptor: &str, action: ActionType, direction: Direction) -> String {
    format!(
        "{descriptor}, {action} animation, facing {}, {REFERENCE_CONSTRAINT}",
        direction.facing_phrase()
    )
}

/// Description for one independently generated (prompt-only) frame.
pub fn prompt_only_frame_prompt(
    descriptor: &str,
    action: ActionType,
    direction: Direction,
    pose: &str,
    no_background: bool,
) -> String {
    let action_part = format!("{action} animation");
    let facing_part = format!("facing {}", direction.facing_phrase());

    let mut parts: Vec<&str> = vec![descriptor, &action_part, &facing_part, pose];
    parts.extend(CONSISTENCY_PHRASES.iter().copied());
    if no_background {
        parts.push("no background");
        parts.push("transparent background");
    } else {
        parts.push("simple background");
    }

    parts
        .into_iter()
        .filter(|p| !p.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

/// Instruction text for the backstory generator.
pub fn story_prompt(
    name: &str,
    character_class: Option<&str>,
    personality: Option<&str>,
    appearance: Option<&str>,
) -> String {
    let mut prompt = format!("Write a short backstory (about 100 words) for a character named {name}");
    if let Some(class) = character_class {
        prompt.push_str(&format!(", who is a {class}"));
    }
    if let Some(p) = personality {
        prompt.push_str(&format!(", with personality traits: {p}"));
    }
    if let Some(a) = appearance {
        prompt.push_str(&format!(", and appearance: {a}"));
    }
    prompt
}
