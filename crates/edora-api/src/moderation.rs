//! Flagged-word scanning for post titles and bodies.

/// Returns the flag reason for the first entry of `words` found in the
/// title or content, matching case-insensitively against whitespace-normalized
/// text. An entry must not run into neighbouring letters or digits, so `spam`
/// skips "spammer" while `c++` and `f*ck` match as written.
pub fn scan<S: AsRef<str>>(words: &[S], title: &str, content: &str) -> Option<String> {
    let text = normalize(&format!("{} {}", title, content));

    words.iter().map(AsRef::as_ref).find_map(|entry| {
        let needle = normalize(entry);
        if needle.is_empty() {
            return None;
        }
        contains_bounded(&text, &needle).then(|| format!("Contains flagged word: {}", entry))
    })
}

fn normalize(s: &str) -> String {
    s.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase()
}

/// Some occurrence of `needle` in `text` is not glued to an alphanumeric
/// neighbour on a side where the needle itself starts or ends alphanumeric.
fn contains_bounded(text: &str, needle: &str) -> bool {
    let starts_word = needle.chars().next().is_some_and(char::is_alphanumeric);
    let ends_word = needle.chars().next_back().is_some_and(char::is_alphanumeric);

    text.match_indices(needle).any(|(i, m)| {
        let before = text[..i].chars().next_back();
        let after = text[i + m.len()..].chars().next();
        let open = !starts_word || !before.is_some_and(char::is_alphanumeric);
        let close = !ends_word || !after.is_some_and(char::is_alphanumeric);
        open && close
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn whole_words_only() {
        let words = ["spam"];
        assert_eq!(
            scan(&words, "Buy SPAM now", "").as_deref(),
            Some("Contains flagged word: spam")
        );
        assert_eq!(scan(&words, "spam!", "").as_deref(), Some("Contains flagged word: spam"));
        assert!(scan(&words, "spammer", "antispam").is_none());
    }

    #[test]
    fn phrases_ignore_spacing() {
        let words = ["free money"];
        assert!(scan(&words, "title", "get FREE\n   money here").is_some());
        assert!(scan(&words, "free", "money").is_some());
        assert!(scan(&words, "freemoney", "").is_none());
    }

    #[test]
    fn first_match_in_list_order_wins() {
        let words = vec!["alpha".to_string(), "beta".to_string()];
        assert_eq!(
            scan(&words, "beta alpha", "").as_deref(),
            Some("Contains flagged word: alpha")
        );
        assert!(scan::<&str>(&[], "anything", "at all").is_none());
    }

    #[test]
    fn entries_with_punctuation_match() {
        let words = ["f*ck", "c++", "e-mail"];
        assert_eq!(
            scan(&words, "", "what the F*CK").as_deref(),
            Some("Contains flagged word: f*ck")
        );
        assert!(scan(&words, "Learning C++ today", "").is_some());
        assert!(scan(&words, "", "send me an e-mail.").is_some());

        assert!(scan(&words, "", "f ck").is_none());
        assert!(scan(&words, "abc++", "").is_none());
        assert!(scan(&words, "", "e-mails").is_none());
    }
}
