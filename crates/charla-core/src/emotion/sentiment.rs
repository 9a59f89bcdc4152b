//! Lexicon-based sentiment scoring.
//!
//! Score = (positive hits − negative hits) / word count, clamped to
//! [−1, 1]. Coarse by design; the keyword override table in dispatch
//! handles the cases that matter most.

const POSITIVE: &[&str] = &[
    "love", "great", "awesome", "amazing", "wonderful", "fantastic", "good", "happy", "fun",
    "excellent", "perfect", "thanks", "thank", "genial", "increíble", "maravilloso", "bueno",
    "feliz", "divertido", "excelente", "perfecto", "gracias", "bien",
];

const NEGATIVE: &[&str] = &[
    "hate", "terrible", "awful", "horrible", "bad", "sad", "angry", "frustrating", "boring",
    "difficult", "hard", "confusing", "wrong", "odio", "terrible", "horrible", "malo", "triste",
    "enojado", "frustrante", "aburrido", "difícil", "confuso", "mal",
];

/// Score text sentiment in [−1, 1]. Empty input scores 0.
pub fn sentiment_score(text: &str) -> f32 {
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric() && c != 'í' && c != 'é' && c != 'á' && c != 'ó' && c != 'ú' && c != 'ñ')
        .filter(|w| !w.is_empty())
        .collect();
    if words.is_empty() {
        return 0.0;
    }

    let mut score = 0i32;
    for word in &words {
        let lowered = word.to_lowercase();
        if POSITIVE.contains(&lowered.as_str()) {
            score += 1;
        } else if NEGATIVE.contains(&lowered.as_str()) {
            score -= 1;
        }
    }

    (score as f32 / words.len() as f32).clamp(-1.0, 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_text_scores_zero() {
        assert_eq!(sentiment_score(""), 0.0);
        assert_eq!(sentiment_score("   !!! "), 0.0);
    }

    #[test]
    fn positive_words_raise_the_score() {
        assert!(sentiment_score("this is great") > 0.0);
        assert!(sentiment_score("amazing wonderful fantastic") > 0.75);
    }

    #[test]
    fn negative_words_lower_the_score() {
        assert!(sentiment_score("this is terrible") < 0.0);
        assert!(sentiment_score("awful horrible bad") < -0.5);
    }

    #[test]
    fn spanish_lexicon_entries_count() {
        assert!(sentiment_score("qué genial") > 0.0);
        assert!(sentiment_score("muy difícil") < 0.0);
    }

    #[test]
    fn mixed_sentiment_roughly_cancels() {
        let score = sentiment_score("good but bad");
        assert!(score.abs() < 0.2);
    }
}
