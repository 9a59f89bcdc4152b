//! Emotion classification with keyword overrides.

use charla_types::emotion::{Emotion, EmotionSignal};
use tracing::debug;

use super::sentiment::sentiment_score;

/// Keyword override table. A hit decides the emotion outright, before
/// the numeric score is consulted.
const OVERRIDES: &[(&str, Emotion)] = &[
    ("can't wait", Emotion::Excited),
    ("so excited", Emotion::Excited),
    ("emocionado", Emotion::Excited),
    ("emocionada", Emotion::Excited),
    ("yay", Emotion::Excited),
    ("i give up", Emotion::Frustrated),
    ("me rindo", Emotion::Frustrated),
    ("so hard", Emotion::Frustrated),
    ("don't understand", Emotion::Confused),
    ("no entiendo", Emotion::Confused),
    ("confused", Emotion::Confused),
    ("miss", Emotion::Sad),
    ("extraño", Emotion::Sad),
    ("lonely", Emotion::Sad),
];

const OVERRIDE_INTENSITY: f32 = 0.8;

/// Classify raw text into an emotion signal.
///
/// Never fails: degenerate input yields the neutral default with a
/// diagnostic log. Intensity is the override constant for keyword hits
/// or the absolute sentiment score otherwise.
pub fn classify(text: &str) -> EmotionSignal {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        debug!("emotion classification skipped: empty input");
        return EmotionSignal::neutral();
    }

    let lowered = trimmed.to_lowercase();
    for (keyword, emotion) in OVERRIDES {
        if lowered.contains(keyword) {
            return EmotionSignal {
                emotion: *emotion,
                intensity: OVERRIDE_INTENSITY,
            };
        }
    }

    let score = sentiment_score(trimmed);
    let emotion = if score > 0.75 {
        Emotion::Excited
    } else if score > 0.2 {
        Emotion::Happy
    } else if score < -0.5 {
        Emotion::Sad
    } else if score < -0.2 {
        // Mildly negative plus a question reads as confusion rather
        // than frustration.
        if lowered.contains('?') || lowered.contains('¿') {
            Emotion::Confused
        } else {
            Emotion::Frustrated
        }
    } else {
        Emotion::Neutral
    };

    if emotion == Emotion::Neutral && score != 0.0 {
        debug!(score, "sentiment below emotion thresholds");
    }

    EmotionSignal {
        emotion,
        intensity: score.abs(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_is_neutral() {
        assert_eq!(classify(""), EmotionSignal::neutral());
        assert_eq!(classify("   "), EmotionSignal::neutral());
    }

    #[test]
    fn keyword_override_beats_score() {
        // "i give up" with positive words around it still reads frustrated.
        let signal = classify("this is great but honestly I give up");
        assert_eq!(signal.emotion, Emotion::Frustrated);
        assert_eq!(signal.intensity, OVERRIDE_INTENSITY);
    }

    #[test]
    fn strong_positive_score_is_excited() {
        let signal = classify("amazing wonderful fantastic");
        assert_eq!(signal.emotion, Emotion::Excited);
        assert!(signal.intensity > 0.75);
    }

    #[test]
    fn mild_positive_is_happy() {
        let signal = classify("the lesson was good");
        assert_eq!(signal.emotion, Emotion::Happy);
    }

    #[test]
    fn strong_negative_is_sad() {
        let signal = classify("awful horrible bad");
        assert_eq!(signal.emotion, Emotion::Sad);
    }

    #[test]
    fn mild_negative_question_is_confused() {
        let signal = classify("why is this so confusing and wrong?");
        assert_eq!(signal.emotion, Emotion::Confused);
    }

    #[test]
    fn mild_negative_statement_is_frustrated() {
        let signal = classify("this grammar is hard and confusing today");
        assert_eq!(signal.emotion, Emotion::Frustrated);
    }

    #[test]
    fn plain_text_is_neutral() {
        let signal = classify("fui al mercado esta mañana");
        assert_eq!(signal.emotion, Emotion::Neutral);
    }

    #[test]
    fn spanish_overrides_apply() {
        assert_eq!(classify("no entiendo nada de esto").emotion, Emotion::Confused);
        assert_eq!(classify("estoy muy emocionada").emotion, Emotion::Excited);
    }
}
