//! Greedy phrase segmentation.

use kclip_models::TimedWord;

/// Character budget per displayed phrase.
pub const DEFAULT_MAX_CHARS: usize = 25;

/// Group consecutive words into display phrases.
///
/// A word joins the current phrase unless the phrase length (word lengths
/// plus one separating space each) would exceed `max_chars`. A word longer
/// than the budget still forms its own phrase.
///
/// # Examples
/// ```
/// use kclip_models::TimedWord;
/// use kclip_subtitle::segment_phrases;
///
/// let words = vec![
///     TimedWord::new("I", 0.0, 0.3),
///     TimedWord::new("will", 0.3, 0.6),
///     TimedWord::new("succeed", 0.6, 1.4),
/// ];
/// assert_eq!(segment_phrases(&words, 25).len(), 1);
/// ```
pub fn segment_phrases(words: &[TimedWord], max_chars: usize) -> Vec<&[TimedWord]> {
    let mut phrases = Vec::new();
    let mut phrase_start = 0;
    // Length of the open phrase including one trailing separator per word
    let mut current_len = 0;

    for (i, word) in words.iter().enumerate() {
        let len = word.char_len();
        if i > phrase_start && current_len + len > max_chars {
            phrases.push(&words[phrase_start..i]);
            phrase_start = i;
            current_len = 0;
        }
        current_len += len + 1;
    }

    if phrase_start < words.len() {
        phrases.push(&words[phrase_start..]);
    }
    phrases
}

#[cfg(test)]
mod tests {
    use super::*;

    fn words(texts: &[&str]) -> Vec<TimedWord> {
        texts
            .iter()
            .enumerate()
            .map(|(i, t)| TimedWord::new(*t, i as f64, i as f64 + 1.0))
            .collect()
    }

    fn texts(phrase: &[TimedWord]) -> Vec<&str> {
        phrase.iter().map(|w| w.text.as_str()).collect()
    }

    fn phrase_len(phrase: &[TimedWord]) -> usize {
        phrase.iter().map(TimedWord::char_len).sum::<usize>() + phrase.len() - 1
    }

    #[test]
    fn test_empty_input() {
        assert!(segment_phrases(&[], DEFAULT_MAX_CHARS).is_empty());
    }

    #[test]
    fn test_short_sentence_is_one_phrase() {
        let w = words(&["I", "will", "succeed"]);
        let phrases = segment_phrases(&w, 25);
        assert_eq!(phrases.len(), 1);
        assert_eq!(texts(phrases[0]), vec!["I", "will", "succeed"]);
    }

    #[test]
    fn test_breaks_when_budget_exceeded() {
        // "aaaa bbbb" = 9, adding " cccc" would make 14 > 10
        let w = words(&["aaaa", "bbbb", "cccc"]);
        let phrases = segment_phrases(&w, 10);
        assert_eq!(phrases.len(), 2);
        assert_eq!(texts(phrases[0]), vec!["aaaa", "bbbb"]);
        assert_eq!(texts(phrases[1]), vec!["cccc"]);
    }

    #[test]
    fn test_exact_fit_stays_together() {
        // "aaaa bbbbb" = 10 chars
        let w = words(&["aaaa", "bbbbb"]);
        assert_eq!(segment_phrases(&w, 10).len(), 1);
    }

    #[test]
    fn test_oversized_word_gets_own_phrase() {
        let w = words(&["hi", "incomprehensibilities", "yo"]);
        let phrases = segment_phrases(&w, 10);
        assert_eq!(phrases.len(), 3);
        assert_eq!(texts(phrases[1]), vec!["incomprehensibilities"]);
    }

    #[test]
    fn test_counts_characters_not_bytes() {
        // 5 chars each, 10 bytes each
        let w = words(&["ééééé", "ééééé"]);
        assert_eq!(segment_phrases(&w, 11).len(), 1);
    }

    #[test]
    fn test_concatenation_preserves_words_and_budget() {
        let sentence = "the quick brown fox jumps over the lazy dog while \
                        extraordinarily verbose narrators keep talking about it";
        let w = words(&sentence.split_whitespace().collect::<Vec<_>>());

        for max_chars in [5, 10, 15, 25, 40] {
            let phrases = segment_phrases(&w, max_chars);
            let flattened: Vec<&str> = phrases.iter().flat_map(|p| texts(p)).collect();
            assert_eq!(flattened, sentence.split_whitespace().collect::<Vec<_>>());

            for phrase in &phrases {
                assert!(!phrase.is_empty());
                assert!(phrase.len() == 1 || phrase_len(phrase) <= max_chars);
            }
        }
    }
}
