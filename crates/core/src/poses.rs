//! Animation action types and per-frame pose templates.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::direction::Direction;
use crate::error::CoreError;

/// Closed set of animation actions a character can be given.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ActionType {
    Walk,
    Run,
    Jump,
    Attack,
    Idle,
    Hit,
    Death,
}

pub const ALL_ACTIONS: [ActionType; 7] = [
    ActionType::Walk,
    ActionType::Run,
    ActionType::Jump,
    ActionType::Attack,
    ActionType::Idle,
    ActionType::Hit,
    ActionType::Death,
];

impl ActionType {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Walk => "walk",
            Self::Run => "run",
            Self::Jump => "jump",
            Self::Attack => "attack",
            Self::Idle => "idle",
            Self::Hit => "hit",
            Self::Death => "death",
        }
    }
}

impl fmt::Display for ActionType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ActionType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ALL_ACTIONS
            .iter()
            .copied()
            .find(|a| a.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid action type '{s}'. Must be one of: {}",
                    ALL_ACTIONS.map(ActionType::as_str).join(", ")
                ))
            })
    }
}

/// Which hand holds the weapon in attack frames.
///
/// Facing east keeps the weapon on the visible right side; facing west
/// mirrors it. Pure north/south views default to the right hand.
pub fn attack_hand(direction: Direction) -> &'static str {
    if direction.is_west_leaning() {
        "left hand"
    } else {
        "right hand"
    }
}

/// Pose phrase for every frame of a prompt-only animation.
///
/// Each action has a four-phase template. Longer sequences cycle through
/// it; shorter ones take its prefix.
pub fn frame_descriptions(action: ActionType, direction: Direction, frame_count: usize) -> Vec<String> {
    let template = pose_template(action, direction);
    (0..frame_count)
        .map(|i| template[i % template.len()].clone())
        .collect()
}

fn pose_template(action: ActionType, direction: Direction) -> Vec<String> {
    let fixed = |phases: [&str; 4]| phases.iter().map(|p| p.to_string()).collect();

    match action {
        ActionType::Walk => fixed([
            "left foot forward, right foot back, arms swinging naturally, character body movement only",
            "both feet on ground, mid-stride, balanced pose, character body only",
            "right foot forward, left foot back, arms swinging opposite, character body movement only",
            "both feet on ground, mid-stride, balanced pose, character body only",
        ]),
        ActionType::Run => fixed([
            "left foot forward, right foot extended back, arms pumping, character body movement only, no motion effects",
            "both feet off ground, mid-air, maximum stride, character body pose only, no motion lines",
            "right foot forward, left foot extended back, arms pumping, character body movement only, no motion effects",
            "both feet off ground, mid-air, maximum stride, character body pose only, no motion lines",
        ]),
        ActionType::Jump => fixed([
            "crouching pose, preparing to jump, knees bent, arms down, character body only",
            "rising pose, feet leaving ground, arms up, character body ascending, no particles",
            "peak pose, maximum height, arms extended up, character body mid-air, no effects",
            "landing pose, feet touching ground, knees bent, arms down, character body only",
        ]),
        ActionType::Attack => {
            let hand = attack_hand(direction);
            vec![
                format!("weapon in {hand} raised high above head, arm extended upward, preparing to strike, character body only, no effects"),
                format!("weapon in {hand} at mid-level, arm swinging forward, character body motion only, no motion lines"),
                format!("weapon in {hand} below waist, arm extended downward, character body impact pose, no sparks or effects"),
                format!("weapon in {hand} returning, arm pulling back, character body recovery pose, no effects"),
            ]
        }
        ActionType::Idle => fixed([
            "standing pose, neutral position, relaxed stance",
            "slight movement, breathing animation, subtle shift",
            "standing pose, neutral position, relaxed stance",
            "slight movement, breathing animation, subtle shift",
        ]),
        ActionType::Hit => fixed([
            "normal pose, before impact",
            "recoil pose, body pushed back, arms up in defense",
            "staggered pose, off-balance, recovering",
            "returning to normal pose, recovering from hit",
        ]),
        ActionType::Death => fixed([
            "normal pose, before falling",
            "falling backward, losing balance, arms flailing",
            "on ground, lying down, motionless",
            "final pose, completely still, death state",
        ]),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn attack_hand_follows_facing() {
        assert_eq!(attack_hand(Direction::East), "right hand");
        assert_eq!(attack_hand(Direction::NorthEast), "right hand");
        assert_eq!(attack_hand(Direction::SouthEast), "right hand");
        assert_eq!(attack_hand(Direction::West), "left hand");
        assert_eq!(attack_hand(Direction::NorthWest), "left hand");
        assert_eq!(attack_hand(Direction::SouthWest), "left hand");
        assert_eq!(attack_hand(Direction::North), "right hand");
        assert_eq!(attack_hand(Direction::South), "right hand");
    }

    #[test]
    fn attack_frames_name_the_hand() {
        let frames = frame_descriptions(ActionType::Attack, Direction::West, 4);
        assert!(frames.iter().all(|f| f.starts_with("weapon in left hand")));

        let frames = frame_descriptions(ActionType::Attack, Direction::East, 4);
        assert!(frames.iter().all(|f| f.starts_with("weapon in right hand")));
    }

    #[test]
    fn templates_cycle_when_longer() {
        let frames = frame_descriptions(ActionType::Hit, Direction::South, 6);
        assert_eq!(frames.len(), 6);
        assert_eq!(frames[4], frames[0]);
        assert_eq!(frames[5], "recoil pose, body pushed back, arms up in defense");
    }

    #[test]
    fn templates_truncate_when_shorter() {
        let frames = frame_descriptions(ActionType::Death, Direction::South, 2);
        assert_eq!(
            frames,
            vec![
                "normal pose, before falling".to_string(),
                "falling backward, losing balance, arms flailing".to_string(),
            ]
        );
    }

    #[test]
    fn action_parse_is_strict() {
        assert_eq!("walk".parse::<ActionType>().unwrap(), ActionType::Walk);
        assert!("Walk".parse::<ActionType>().is_err());
        assert!("dance".parse::<ActionType>().is_err());
    }
}
