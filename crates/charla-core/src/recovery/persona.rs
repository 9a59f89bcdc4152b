//! Scripted character personas.
//!
//! Every apology and fallback line ships pre-written, in character, so
//! a generation failure never leaks raw error text to the user. An
//! unknown character id falls back to a persona-neutral voice.

use charla_types::emotion::Emotion;
use charla_types::error::ErrorCategory;

/// A scripted character: per-category apologies plus two canned
/// fallback replies (one for questions, one for statements).
pub struct Persona {
    pub id: &'static str,
    pub name: &'static str,
    unclear: &'static str,
    inappropriate: &'static str,
    off_topic: &'static str,
    connectivity: &'static str,
    generation: &'static str,
    language: &'static str,
    pub fallback_question: &'static str,
    pub fallback_statement: &'static str,
    pub fallback_emotion: Emotion,
    pub fallback_animation: &'static str,
}

impl Persona {
    /// Scripted apology for a classified failure category.
    pub fn message_for(&self, category: ErrorCategory) -> &'static str {
        match category {
            ErrorCategory::UnclearInput => self.unclear,
            ErrorCategory::InappropriateContent => self.inappropriate,
            ErrorCategory::OffTopic => self.off_topic,
            ErrorCategory::ConnectivityIssue => self.connectivity,
            ErrorCategory::LanguageDetectionFailure => self.language,
            ErrorCategory::GenerationFailure | ErrorCategory::Unknown => self.generation,
        }
    }
}

static SOFIA: Persona = Persona {
    id: "sofia",
    name: "Sofía",
    unclear: "¿Perdón? No te entendí bien. ¿Puedes decirlo otra vez con unas palabras más?",
    inappropriate: "Prefiero que hablemos de otra cosa. ¡Cuéntame algo de tu día!",
    off_topic: "Eso no es lo mío, ¡pero el español sí! ¿Seguimos practicando?",
    connectivity: "¡Uy! Mi conexión está fallando un poquito. Dame un segundo e inténtalo de nuevo.",
    generation: "Perdona, me quedé en blanco. ¿Me lo repites, por favor?",
    language: "No logré reconocer el idioma esta vez. ¿Lo intentamos de nuevo?",
    fallback_question: "¡Buena pregunta! Dame un momento... mientras tanto, ¿cómo lo dirías tú?",
    fallback_statement: "¡Qué interesante! Cuéntame más mientras ordeno mis ideas.",
    fallback_emotion: Emotion::Happy,
    fallback_animation: "gesture_nod",
};

static DIEGO: Persona = Persona {
    id: "diego",
    name: "Diego",
    unclear: "Hmm, no capté eso. ¿Puedes escribir un poco más?",
    inappropriate: "Mejor cambiemos de tema, ¿va? Hablemos de algo chido.",
    off_topic: "De eso no sé nada, compa. Pero de español, ¡lo que quieras!",
    connectivity: "Se me cortó la señal un momento. Mándalo otra vez, porfa.",
    generation: "Órale, se me fue la onda. ¿Me lo repites?",
    language: "No pude identificar el idioma. Intentémoslo de nuevo.",
    fallback_question: "¡Esa está buena! Déjame pensarla... ¿tú qué crees?",
    fallback_statement: "Suena bien, sigue contándome.",
    fallback_emotion: Emotion::Happy,
    fallback_animation: "gesture_nod",
};

static LUPE: Persona = Persona {
    id: "lupe",
    name: "Lupe",
    unclear: "Disculpa, mi amor, no te entendí. ¿Me lo dices con más palabritas?",
    inappropriate: "Ay no, de eso no hablamos aquí. Mejor cuéntame otra cosa.",
    off_topic: "Eso se me escapa, corazón. ¡Volvamos a nuestro español!",
    connectivity: "Parece que la línea anda lenta hoy. Inténtalo otra vez, ¿sí?",
    generation: "Ay, perdóname, se me fue el hilo. Repítemelo, por favor.",
    language: "No reconocí bien el idioma esta vez. Probemos de nuevo.",
    fallback_question: "¡Qué buena pregunta! Piénsala conmigo: ¿tú cómo la responderías?",
    fallback_statement: "Muy bien dicho. Sigue, te escucho.",
    fallback_emotion: Emotion::Happy,
    fallback_animation: "gesture_nod",
};

static GENERIC: Persona = Persona {
    id: "generic",
    name: "Tutor",
    unclear: "I didn't quite catch that. Could you say it with a few more words?",
    inappropriate: "Let's talk about something else. What would you like to practice?",
    off_topic: "That's outside what I can help with, but I'm happy to keep practicing!",
    connectivity: "I'm having a little connection trouble. Please try again in a moment.",
    generation: "Sorry, I lost my train of thought. Could you repeat that?",
    language: "I couldn't recognize the language that time. Let's try again.",
    fallback_question: "Good question! Give me a moment... how would you answer it?",
    fallback_statement: "That sounds great, tell me more.",
    fallback_emotion: Emotion::Neutral,
    fallback_animation: "gesture_nod",
};

/// Look up a persona by character id; unknown ids get the neutral voice.
pub fn persona_for(character_id: &str) -> &'static Persona {
    match character_id {
        "sofia" => &SOFIA,
        "diego" => &DIEGO,
        "lupe" => &LUPE,
        _ => &GENERIC,
    }
}

/// Scripted apology for a character and failure category.
pub fn scripted_message(character_id: &str, category: ErrorCategory) -> &'static str {
    persona_for(character_id).message_for(category)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn known_personas_resolve_by_id() {
        assert_eq!(persona_for("sofia").name, "Sofía");
        assert_eq!(persona_for("diego").name, "Diego");
        assert_eq!(persona_for("lupe").name, "Lupe");
    }

    #[test]
    fn unknown_character_gets_neutral_voice() {
        let persona = persona_for("some-future-character");
        assert_eq!(persona.id, "generic");
        assert!(scripted_message("some-future-character", ErrorCategory::GenerationFailure)
            .contains("train of thought"));
    }

    #[test]
    fn every_category_has_a_message_for_every_persona() {
        for id in ["sofia", "diego", "lupe", "nope"] {
            for category in [
                ErrorCategory::UnclearInput,
                ErrorCategory::InappropriateContent,
                ErrorCategory::OffTopic,
                ErrorCategory::ConnectivityIssue,
                ErrorCategory::GenerationFailure,
                ErrorCategory::LanguageDetectionFailure,
                ErrorCategory::Unknown,
            ] {
                assert!(!scripted_message(id, category).is_empty());
            }
        }
    }

    #[test]
    fn scripted_messages_never_carry_error_jargon() {
        for id in ["sofia", "diego", "lupe", "nope"] {
            let msg = scripted_message(id, ErrorCategory::ConnectivityIssue).to_lowercase();
            assert!(!msg.contains("error"));
            assert!(!msg.contains("exception"));
        }
    }
}
