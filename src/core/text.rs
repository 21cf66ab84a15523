/// Input normalisation and phrase extraction shared by the script and
/// memory components.

/// Substituted for `{{input}}` when the user sent nothing usable.
pub const BLANK_INPUT_PHRASE: &str = "the blank you sent";

/// Number of trailing tokens kept by [`focus_phrase`].
const FOCUS_TOKENS: usize = 4;
/// Inputs with at most this many tokens are kept whole by [`extract_fragment`].
const FRAGMENT_WHOLE_MAX: usize = 3;
/// Number of trailing tokens kept by [`extract_fragment`] for longer inputs.
const FRAGMENT_TOKENS: usize = 5;

/// Lowercased, trimmed form used for all keyword matching. Typographic
/// apostrophes are folded to `'` so "don’t" matches "don't".
pub fn normalize(text: &str) -> String {
    text.trim().to_lowercase().replace('\u{2019}', "'")
}

/// True if any non-empty keyword occurs as a substring of `normalized`.
pub fn contains_any<S: AsRef<str>>(normalized: &str, keywords: &[S]) -> bool {
    keywords.iter().any(|k| {
        let k = k.as_ref();
        !k.is_empty() && normalized.contains(&k.to_lowercase())
    })
}

/// Trim, collapse every run of line breaks into one space, and drop a
/// single trailing ASCII punctuation mark.
pub fn clean_phrase(text: &str) -> String {
    let mut collapsed = String::with_capacity(text.len());
    let mut in_break = false;
    for c in text.trim().chars() {
        if c == '\r' || c == '\n' {
            if !in_break {
                collapsed.push(' ');
                in_break = true;
            }
        } else {
            collapsed.push(c);
            in_break = false;
        }
    }

    if collapsed.ends_with(|c: char| c.is_ascii_punctuation()) {
        collapsed.pop();
    }
    collapsed.trim_end().to_string()
}

/// The phrase Echo quotes back for `{{input}}`: the whole cleaned input if
/// it is at most four words, otherwise its last four words.
pub fn focus_phrase(text: &str) -> String {
    let cleaned = clean_phrase(text);
    if cleaned.is_empty() {
        return BLANK_INPUT_PHRASE.to_string();
    }
    last_tokens_or_whole(&cleaned, FOCUS_TOKENS, FOCUS_TOKENS)
}

/// A short snippet of user input kept for later continuity lines.
/// Returns `None` when nothing is left after cleaning.
pub fn extract_fragment(text: &str) -> Option<String> {
    let cleaned = clean_phrase(text);
    if cleaned.is_empty() {
        return None;
    }
    Some(last_tokens_or_whole(
        &cleaned,
        FRAGMENT_WHOLE_MAX,
        FRAGMENT_TOKENS,
    ))
}

fn last_tokens_or_whole(cleaned: &str, whole_max: usize, keep: usize) -> String {
    let tokens: Vec<&str> = cleaned.split_whitespace().collect();
    if tokens.len() <= whole_max {
        return cleaned.to_string();
    }
    let start = tokens.len().saturating_sub(keep);
    tokens[start..].join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn normalize_trims_and_lowercases() {
        assert_eq!(normalize("  Do You DREAM?  "), "do you dream?");
        assert_eq!(normalize("I don\u{2019}t"), "i don't");
    }

    #[test]
    fn contains_any_skips_empty_keywords() {
        assert!(contains_any("i had a dream", &["memory", "dream"]));
        assert!(!contains_any("nothing here", &["", "memory"]));
        assert!(contains_any("echo chamber", &["ECHO"]));
    }

    #[test]
    fn clean_phrase_collapses_breaks_and_punctuation() {
        assert_eq!(clean_phrase("  hello\r\n\nthere!  "), "hello there");
        assert_eq!(clean_phrase("why?"), "why");
        // only one trailing mark is removed
        assert_eq!(clean_phrase("wait..."), "wait..");
        assert_eq!(clean_phrase("?"), "");
    }

    #[test]
    fn focus_phrase_short_input_kept_whole() {
        assert_eq!(focus_phrase("who am i?"), "who am i");
        assert_eq!(focus_phrase("one  two three four"), "one  two three four");
    }

    #[test]
    fn focus_phrase_long_input_keeps_last_four() {
        assert_eq!(
            focus_phrase("I keep thinking about the old train station."),
            "the old train station"
        );
    }

    #[test]
    fn focus_phrase_blank() {
        assert_eq!(focus_phrase("   "), BLANK_INPUT_PHRASE);
        assert_eq!(focus_phrase("!"), BLANK_INPUT_PHRASE);
    }

    #[test]
    fn fragment_extraction() {
        assert_eq!(extract_fragment("hi there."), Some("hi there".to_string()));
        assert_eq!(
            extract_fragment("I never told anyone about the blue book"),
            Some("anyone about the blue book".to_string())
        );
        assert_eq!(
            extract_fragment("four words right here"),
            Some("four words right here".to_string())
        );
        assert_eq!(extract_fragment("  \n "), None);
    }
}
