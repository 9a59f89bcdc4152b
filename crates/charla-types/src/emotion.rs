//! Emotion classification types and the emotion-to-expression table.

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Discrete emotion produced by sentiment classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Emotion {
    Excited,
    Happy,
    Neutral,
    Sad,
    Frustrated,
    Confused,
}

impl fmt::Display for Emotion {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Emotion::Excited => write!(f, "excited"),
            Emotion::Happy => write!(f, "happy"),
            Emotion::Neutral => write!(f, "neutral"),
            Emotion::Sad => write!(f, "sad"),
            Emotion::Frustrated => write!(f, "frustrated"),
            Emotion::Confused => write!(f, "confused"),
        }
    }
}

impl FromStr for Emotion {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "excited" => Ok(Emotion::Excited),
            "happy" => Ok(Emotion::Happy),
            "neutral" => Ok(Emotion::Neutral),
            "sad" => Ok(Emotion::Sad),
            "frustrated" => Ok(Emotion::Frustrated),
            "confused" => Ok(Emotion::Confused),
            other => Err(format!("invalid emotion: '{other}'")),
        }
    }
}

impl Default for Emotion {
    fn default() -> Self {
        Emotion::Neutral
    }
}

/// Classification result relayed on the emotion channel.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EmotionSignal {
    pub emotion: Emotion,
    pub intensity: f32,
}

impl EmotionSignal {
    /// The neutral default used whenever classification cannot run.
    pub fn neutral() -> Self {
        Self {
            emotion: Emotion::Neutral,
            intensity: 0.0,
        }
    }
}

/// Static emotion-to-renderer-expression table.
///
/// The renderer consumes these as `vrm_animation` commands.
pub fn expression_for(emotion: Emotion) -> &'static str {
    match emotion {
        Emotion::Excited => "expression_sparkle",
        Emotion::Happy => "expression_smile",
        Emotion::Neutral => "expression_idle",
        Emotion::Sad => "expression_sad",
        Emotion::Frustrated => "expression_frown",
        Emotion::Confused => "expression_tilt",
    }
}
