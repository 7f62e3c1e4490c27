use {
    once_cell::sync::Lazy,
    regex::Regex,
    emotion_trends_core::entity::{CleanedRecord, Record},
};

static HASHTAG: Lazy<Regex> = Lazy::new(|| Regex::new(r"#([A-Za-z0-9_]+)").unwrap());
static CONTRACTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"n['’]t").unwrap());
static URL: Lazy<Regex> = Lazy::new(|| Regex::new(r"https?://\S+|www\.\S+").unwrap());
static MENTION: Lazy<Regex> = Lazy::new(|| Regex::new(r"\S*@\S*\s?").unwrap());
static NON_ASCII: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\x00-\x7F]+").unwrap());
static WHITESPACE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());
static SYMBOLS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^\w\s]").unwrap());
static DIGITS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+").unwrap());

/// Cleans raw post text. Exclude terms are removed as plain substrings in lower, upper and title case.
pub struct TextNormalizer {
    exclude_terms: Vec<String>,
}

impl Default for TextNormalizer {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl TextNormalizer {
    pub fn new(exclude_terms: Vec<String>) -> Self {
        Self {
            exclude_terms: exclude_terms.into_iter().filter(|term| !term.is_empty()).collect(),
        }
    }

    pub fn clean(&self, record: &Record) -> CleanedRecord {
        let (content_cleaned, hashtags) = normalize(&record.content, &self.exclude_terms);
        record.cleaned(content_cleaned, hashtags)
    }
}

/// Returns the cleaned text (ASCII letters and single spaces only) and the hashtags found
/// in the text, deduplicated in order of first appearance.
pub fn normalize(raw_text: &str, exclude_terms: &[String]) -> (String, Vec<String>) {
    let text = strip_terms(demojize(raw_text), exclude_terms);

    // before symbol removal, which drops the '#' marker
    let hashtags = extract_hashtags(&text);

    let text = CONTRACTION.replace_all(&text, " not");
    let text = URL.replace_all(&text, "");
    let text = MENTION.replace_all(&text, "");
    let text = NON_ASCII.replace_all(&text, "");
    let text = WHITESPACE.replace_all(&text, " ");
    let text = text.replace('_', " ");
    let text = SYMBOLS.replace_all(&text, " ");
    let text = DIGITS.replace_all(&text, " ");

    // removing "amp" (the leftover of "&amp;") or collapsing spaces can form a new excluded term, and vice versa
    let mut text = text.into_owned();
    loop {
        let mut next = strip_terms(text.clone(), exclude_terms);
        while next.contains("amp") {
            next = next.replace("amp", "");
        }
        let next = WHITESPACE.replace_all(&next, " ").into_owned();

        if next == text {
            break;
        }
        text = next;
    }

    (text.trim().to_owned(), hashtags)
}

/// Substring removal of every case variant, repeated until none is left.
fn strip_terms(mut text: String, exclude_terms: &[String]) -> String {
    loop {
        let mut stripped = text.clone();
        for term in exclude_terms.iter().filter(|term| !term.is_empty()) {
            stripped = stripped
                .replace(&term.to_lowercase(), "")
                .replace(&term.to_uppercase(), "")
                .replace(&title_case(term), "");
        }

        if stripped == text {
            return text;
        }
        text = stripped;
    }
}

fn extract_hashtags(text: &str) -> Vec<String> {
    let mut hashtags: Vec<String> = Vec::new();
    for captures in HASHTAG.captures_iter(text) {
        let hashtag = &captures[1];
        if !hashtags.iter().any(|v| v == hashtag) {
            hashtags.push(hashtag.to_owned());
        }
    }
    hashtags
}

/// Uppercases the first letter of every run of letters and lowercases the rest.
pub(crate) fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut previous_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if previous_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            previous_is_letter = true;
        } else {
            result.push(c);
            previous_is_letter = false;
        }
    }

    result
}

#[cfg(feature = "emoji")]
fn demojize(text: &str) -> String {
    use unicode_segmentation::UnicodeSegmentation;

    let mut result = String::with_capacity(text.len());
    for grapheme in text.graphemes(true) {
        if grapheme.is_ascii() {
            result.push_str(grapheme);
            continue;
        }

        let emoji = emojis::get(grapheme).or_else(|| emojis::get(grapheme.trim_end_matches('\u{fe0f}')));
        match emoji {
            Some(emoji) => {
                result.push(':');
                result.push_str(&emoji.name().replace(' ', "_"));
                result.push(':');
            },
            None => result.push_str(grapheme),
        }
    }
    result
}

#[cfg(not(feature = "emoji"))]
fn demojize(text: &str) -> String {
    text.to_owned()
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        proptest::prelude::*,
    };

    fn clean(text: &str) -> String {
        normalize(text, &[]).0
    }

    #[test]
    fn hashtags_are_extracted_before_symbols_are_stripped() {
        let (cleaned, hashtags) = normalize("check #this out #NOW", &[]);

        assert_eq!(hashtags, vec!["this", "NOW"]);
        assert_eq!(cleaned, "check this out NOW");
    }

    #[test]
    fn repeated_hashtags_keep_first_appearance_order() {
        let (_, hashtags) = normalize("#b #a #b #A", &[]);

        assert_eq!(hashtags, vec!["b", "a", "A"]);
    }

    #[test]
    fn urls_mentions_and_digits_are_removed() {
        assert_eq!(
            clean("@alice see https://t.co/xyz and www.example.org now 2024 hello@world ok"),
            "see and now ok"
        );
    }

    #[test]
    fn contractions_expand_for_both_apostrophes() {
        assert_eq!(clean("I don't know"), "I do not know");
        assert_eq!(clean("it isn’t fair"), "it is not fair");
    }

    #[test]
    fn non_ascii_and_punctuation_are_dropped() {
        assert_eq!(clean("Café   au   lait!!! (really?)\n\tyes_no"), "Caf au lait really yes no");
    }

    #[test]
    fn amp_is_stripped_even_inside_words() {
        assert_eq!(clean("rock &amp; roll"), "rock roll");
        assert_eq!(clean("an example"), "an exle");
    }

    #[test]
    fn exclude_terms_are_removed_in_every_case_variant() {
        let (cleaned, _) = normalize("Bitcoin bitcoin BITCOIN rises, bitcoiners cheer", &["bitcoin".to_owned()]);

        assert_eq!(cleaned, "rises ers cheer");
    }

    #[test]
    fn nested_exclude_terms_are_removed_in_one_pass() {
        let exclude = vec!["bitcoin".to_owned()];

        assert_eq!(normalize("bbitcoinitcoin rally", &exclude).0, "rally");
        assert_eq!(normalize("bitampcoin rally", &exclude).0, "rally");
        assert_eq!(normalize("good  morning sun", &["good morning".to_owned()]).0, "sun");
    }

    #[test]
    fn exclude_terms_apply_before_hashtag_extraction() {
        let (_, hashtags) = normalize("#Crypto #news", &["crypto".to_owned()]);

        assert_eq!(hashtags, vec!["news"]);
    }

    #[test]
    fn empty_input_yields_empty_output() {
        assert_eq!(normalize("", &[]), (String::new(), Vec::new()));
        assert_eq!(normalize("!!! 123 ...", &[]), (String::new(), Vec::new()));
    }

    #[test]
    fn title_case_matches_word_boundaries() {
        assert_eq!(title_case("new york"), "New York");
        assert_eq!(title_case("mcDONALD's"), "Mcdonald'S");
    }

    #[cfg(feature = "emoji")]
    #[test]
    fn emoji_are_replaced_with_their_names() {
        assert_eq!(clean("so happy 😀"), "so happy grinning face");
    }

    #[test]
    fn text_normalizer_keeps_the_original_record() {
        use emotion_trends_core::entity::Record;

        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(9, 0, 0).unwrap();
        let record = Record::new(date, "Good morning #sunrise");
        let cleaned = TextNormalizer::new(vec!["morning".to_owned()]).clean(&record);

        assert_eq!(cleaned.record, record);
        assert_eq!(cleaned.content_cleaned, "Good sunrise");
        assert_eq!(cleaned.hashtags, vec!["sunrise"]);
    }

    proptest! {
        #[test]
        fn cleaned_text_only_contains_ascii_words_and_spaces(text in "\\PC{0,80}") {
            let cleaned = clean(&text);
            prop_assert!(cleaned.chars().all(|c| c.is_ascii_alphanumeric() || c == ' '), "unexpected characters in {:?}", cleaned);
        }

        #[test]
        fn normalization_is_idempotent(text in "[a-zA-Z0-9#@:/._' ’&😀é\t\n-]{0,80}") {
            let once = clean(&text);
            prop_assert_eq!(clean(&once), once.clone());
        }

        #[test]
        fn normalization_with_exclude_terms_is_idempotent(
            text in "[a-zA-Z0-9#&;' ]{0,60}",
            terms in prop::collection::vec("[a-cA-C]{1,3}( [a-c])?", 0..3),
        ) {
            let once = normalize(&text, &terms).0;
            prop_assert_eq!(normalize(&once, &terms).0, once.clone());
        }

        #[test]
        fn cleaned_text_has_no_hashtag_markers(text in "[a-z #]{0,40}") {
            let cleaned = clean(&text);
            prop_assert!(!cleaned.contains('#'));
            prop_assert!(!cleaned.contains("  "));
        }
    }
}
