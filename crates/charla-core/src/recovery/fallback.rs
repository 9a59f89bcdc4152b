//! In-character fallback reply synthesis.

use charla_types::emotion::Emotion;

use super::persona::persona_for;

/// A synthesized in-character reply substituted for failed generation.
#[derive(Debug, Clone)]
pub struct FallbackReply {
    pub text: String,
    pub emotion: Emotion,
    pub animation: String,
}

const QUESTION_WORDS: &[&str] = &[
    "what", "why", "how", "when", "where", "who", "which", "qué", "que", "por qué", "cómo",
    "como", "cuándo", "cuando", "dónde", "donde", "quién", "quien", "cuál", "cual",
];

/// Whether the user's last input reads as a question.
///
/// Punctuation first (`?` or the Spanish opening `¿`), then a leading
/// interrogative word in English or Spanish.
fn looks_like_question(text: &str) -> bool {
    let trimmed = text.trim();
    if trimmed.contains('?') || trimmed.contains('¿') {
        return true;
    }
    let lowered = trimmed.to_lowercase();
    QUESTION_WORDS
        .iter()
        .any(|w| lowered.starts_with(w) && lowered.chars().nth(w.chars().count()).is_none_or(|c| !c.is_alphanumeric()))
}

/// Synthesize an encouraging in-character reply for a failed exchange.
///
/// Infallible: the persona table always resolves and the reply is
/// fully scripted, so the escalation path in the orchestrator only
/// triggers when *emitting* the reply fails.
pub fn fallback_reply(character_id: &str, last_user_text: &str) -> FallbackReply {
    let persona = persona_for(character_id);
    let text = if looks_like_question(last_user_text) {
        persona.fallback_question
    } else {
        persona.fallback_statement
    };
    FallbackReply {
        text: text.to_string(),
        emotion: persona.fallback_emotion,
        animation: persona.fallback_animation.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn question_mark_selects_question_reply() {
        let reply = fallback_reply("sofia", "¿Cómo se dice 'dog'?");
        assert!(reply.text.contains("pregunta"));
        assert_eq!(reply.animation, "gesture_nod");
    }

    #[test]
    fn spanish_opening_mark_counts_as_question() {
        let reply = fallback_reply("diego", "¿Dónde está la biblioteca");
        assert!(reply.text.contains("buena"));
    }

    #[test]
    fn interrogative_keyword_without_punctuation() {
        let reply = fallback_reply("lupe", "how do I conjugate ser");
        assert!(reply.text.contains("pregunta"));
    }

    #[test]
    fn statement_selects_statement_reply() {
        let reply = fallback_reply("sofia", "Hoy fui al mercado con mi familia");
        assert!(reply.text.contains("interesante"));
        assert_eq!(reply.emotion, Emotion::Happy);
    }

    #[test]
    fn keyword_must_be_a_whole_leading_word() {
        // "whoever" starts with "who" but is not an interrogative here.
        let reply = fallback_reply("generic", "whoever said that was right");
        assert_eq!(reply.text, fallback_reply("generic", "a plain statement").text);
    }

    #[test]
    fn unknown_character_synthesizes_neutral_reply() {
        let reply = fallback_reply("mystery", "tell me things");
        assert_eq!(reply.emotion, Emotion::Neutral);
        assert!(!reply.text.is_empty());
    }
}
