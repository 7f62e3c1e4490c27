use {
    unicode_segmentation::UnicodeSegmentation,
    emotion_trends_core::entity::{CleanedRecord, TokenizedRecord},
    crate::{
        lemmatization::Lemmatizer,
        normalization::title_case,
        stopwords::Stopwords,
    },
};

pub struct Tokenizer {
    stopwords: Stopwords,
    lemmatizer: Box<dyn Lemmatizer>,
    exclude_terms: Vec<String>,
}

impl Tokenizer {
    pub fn new(stopwords: Stopwords, lemmatizer: Box<dyn Lemmatizer>, exclude_terms: Vec<String>) -> Self {
        Self {
            stopwords,
            lemmatizer,
            exclude_terms,
        }
    }

    pub fn tokenize(&self, cleaned_text: &str, remove_stopwords: bool, lemmatize: bool) -> Vec<String> {
        let text = cleaned_text.to_lowercase();

        text.unicode_words()
            .filter(|token| !is_excluded(token, &self.exclude_terms))
            .filter(|token| !remove_stopwords || !self.stopwords.contains(token))
            .map(|token| if lemmatize {
                self.lemmatizer.lemmatize(token)
            } else {
                token.to_owned()
            })
            .collect()
    }

    /// Produces both token variants: lemmatized without stopwords for trend counting,
    /// and plain tokens with stopwords kept for the classifier.
    pub fn tokenize_record(&self, record: &CleanedRecord) -> TokenizedRecord {
        let content_preprocessed = self.tokenize(&record.content_cleaned, true, true);
        let content_preprocessed_with_stopwords = self.tokenize(&record.content_cleaned, false, false);

        record.tokenized(content_preprocessed, content_preprocessed_with_stopwords)
    }
}

fn is_excluded(token: &str, exclude_terms: &[String]) -> bool {
    exclude_terms.iter().any(|term| {
        token == term.to_lowercase() || token == term.to_uppercase() || token == title_case(term)
    })
}

#[cfg(test)]
mod tests {
    use {
        super::*,
        crate::lemmatization::{Lexicon, WordNetLemmatizer},
    };

    struct UppercaseLemmatizer;

    impl Lemmatizer for UppercaseLemmatizer {
        fn lemmatize(&self, token: &str) -> String {
            token.to_uppercase()
        }
    }

    fn tokenizer(exclude_terms: &[&str]) -> Tokenizer {
        Tokenizer::new(
            Stopwords::english(),
            Box::new(WordNetLemmatizer::new(Lexicon::builtin().unwrap())),
            exclude_terms.iter().map(|v| v.to_string()).collect(),
        )
    }

    #[test]
    fn plain_tokens_are_lowercased_and_keep_stopwords() {
        assert_eq!(
            tokenizer(&[]).tokenize("I am so Happy today", false, false),
            vec!["i", "am", "so", "happy", "today"]
        );
    }

    #[test]
    fn stopwords_are_removed_before_lemmatization() {
        assert_eq!(
            tokenizer(&[]).tokenize("The cats were running to their children", true, true),
            vec!["cat", "run", "child"]
        );
    }

    #[test]
    fn lemmatization_can_run_without_stopword_removal() {
        let tokenizer = Tokenizer::new(Stopwords::english(), Box::new(UppercaseLemmatizer), Vec::new());

        assert_eq!(tokenizer.tokenize("the cat", false, true), vec!["THE", "CAT"]);
    }

    #[test]
    fn exclude_terms_drop_whole_tokens_only() {
        assert_eq!(
            tokenizer(&["Bitcoin"]).tokenize("bitcoin bitcoiners love BITCOIN", false, false),
            vec!["bitcoiners", "love"]
        );
    }

    #[test]
    fn empty_text_has_no_tokens() {
        assert!(tokenizer(&[]).tokenize("", true, true).is_empty());
    }

    #[test]
    fn record_gets_both_token_variants() {
        use emotion_trends_core::entity::Record;

        let date = chrono::NaiveDate::from_ymd_opt(2024, 1, 1).unwrap().and_hms_opt(0, 0, 0).unwrap();
        let cleaned = Record::new(date, "raw").cleaned("I am so happy today joy".to_owned(), vec!["joy".to_owned()]);

        let tokenized = tokenizer(&[]).tokenize_record(&cleaned);

        assert_eq!(tokenized.content_preprocessed, vec!["happy", "today", "joy"]);
        assert_eq!(tokenized.content_preprocessed_with_stopwords, vec!["i", "am", "so", "happy", "today", "joy"]);
        assert_eq!(tokenized.cleaned, cleaned);
    }
}
