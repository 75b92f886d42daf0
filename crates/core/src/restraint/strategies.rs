//! Catalog of non-restrictive alternatives offered before any restraint.

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum StrategyCategory {
    Distraction,
    Communication,
    Environmental,
}

impl StrategyCategory {
    pub const ALL: [StrategyCategory; 3] = [
        StrategyCategory::Distraction,
        StrategyCategory::Communication,
        StrategyCategory::Environmental,
    ];
}

/// A non-restrictive care strategy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize)]
pub struct Strategy {
    pub id: &'static str,
    pub category: StrategyCategory,
    pub title: &'static str,
    pub description: &'static str,
    pub examples: &'static [&'static str],
}

pub const STRATEGY_CATALOG: &[Strategy] = &[
    Strategy {
        id: "distraction-meaningful-activity",
        category: StrategyCategory::Distraction,
        title: "Meaningful activity",
        description: "Redirect attention towards a familiar, calming task the person enjoys.",
        examples: &[
            "Fold towels or sort objects together",
            "Look through a photo album",
            "Listen to favourite music",
        ],
    },
    Strategy {
        id: "distraction-sensory",
        category: StrategyCategory::Distraction,
        title: "Sensory comfort",
        description: "Offer soothing sensory input to lower arousal without medication.",
        examples: &[
            "Hand massage with lotion",
            "Offer a warm drink or snack",
            "Give a fidget blanket or soft object",
        ],
    },
    Strategy {
        id: "communication-validation",
        category: StrategyCategory::Communication,
        title: "Validation and reassurance",
        description: "Acknowledge the feeling behind the behaviour instead of correcting it.",
        examples: &[
            "Speak slowly at eye level using the person's name",
            "Name the emotion: \"You seem worried\"",
            "Avoid arguing about facts; reassure instead",
        ],
    },
    Strategy {
        id: "communication-needs-check",
        category: StrategyCategory::Communication,
        title: "Unmet needs check",
        description: "Look for pain, hunger, thirst, toileting or temperature as the trigger.",
        examples: &[
            "Ask about pain and check for non-verbal signs",
            "Offer toileting assistance",
            "Check whether the person is too hot or cold",
        ],
    },
    Strategy {
        id: "environmental-calm-space",
        category: StrategyCategory::Environmental,
        title: "Calm environment",
        description: "Reduce noise, glare and crowding that can trigger distress.",
        examples: &[
            "Turn off the television and lower voices",
            "Use soft, even lighting in the evening",
            "Move to a quieter room",
        ],
    },
    Strategy {
        id: "environmental-safe-mobility",
        category: StrategyCategory::Environmental,
        title: "Safe mobility set-up",
        description: "Make moving around safe rather than preventing movement.",
        examples: &[
            "Lower the bed and place a floor mat",
            "Clear walking paths and add night lights",
            "Keep walking aids and call bell within reach",
        ],
    },
];
