use {
    std::{collections::HashMap, fs, path::Path},
    ndarray::Array2,
    serde::Deserialize,
    crate::classifier::ClassifierError,
};

/// Word-to-index encoder fitted together with the model. Index 0 is reserved for padding.
#[derive(Debug, Clone)]
pub struct VocabularyEncoder {
    word_index: HashMap<String, u32>,
    oov_index: Option<u32>,
    num_words: Option<u32>,
    lower: bool,
}

#[derive(Deserialize)]
#[serde(untagged)]
enum EncoderFile {
    // `Tokenizer.to_json()` output, with the word index nested as a JSON string
    Keras { config: KerasTokenizerConfig },
    Plain(PlainEncoder),
}

#[derive(Deserialize)]
struct KerasTokenizerConfig {
    word_index: String,
    oov_token: Option<String>,
    num_words: Option<u32>,
    #[serde(default = "default_lower")]
    lower: bool,
}

#[derive(Deserialize)]
struct PlainEncoder {
    word_index: HashMap<String, u32>,
    oov_token: Option<String>,
    num_words: Option<u32>,
    #[serde(default = "default_lower")]
    lower: bool,
}

fn default_lower() -> bool {
    true
}

impl VocabularyEncoder {
    pub fn new(word_index: HashMap<String, u32>, oov_token: Option<&str>, num_words: Option<u32>) -> Result<Self, ClassifierError> {
        Self::build(word_index, oov_token, num_words, true)
    }

    fn build(word_index: HashMap<String, u32>, oov_token: Option<&str>, num_words: Option<u32>, lower: bool) -> Result<Self, ClassifierError> {
        if let Some((word, _)) = word_index.iter().find(|(_, index)| **index == 0) {
            return Err(ClassifierError::InvalidEncoder(format!("word {:?} uses the padding index 0", word)));
        }

        let oov_index = match oov_token {
            Some(token) => Some(*word_index.get(token).ok_or_else(|| {
                ClassifierError::InvalidEncoder(format!("oov token {:?} is missing from the word index", token))
            })?),
            None => None,
        };

        Ok(Self {
            word_index,
            oov_index,
            // 0 means no limit, as in the Keras tokenizer
            num_words: num_words.filter(|limit| *limit > 0),
            lower,
        })
    }

    pub fn from_json(text: &str) -> Result<Self, ClassifierError> {
        let file: EncoderFile = serde_json::from_str(text).map_err(|source| ClassifierError::Parse { artifact: "encoder", source })?;

        match file {
            EncoderFile::Keras { config } => {
                let word_index: HashMap<String, u32> = serde_json::from_str(&config.word_index)
                    .map_err(|source| ClassifierError::Parse { artifact: "encoder word index", source })?;
                Self::build(word_index, config.oov_token.as_deref(), config.num_words, config.lower)
            },
            EncoderFile::Plain(plain) => Self::build(plain.word_index, plain.oov_token.as_deref(), plain.num_words, plain.lower),
        }
    }

    pub fn load(path: &Path) -> Result<Self, ClassifierError> {
        let text = fs::read_to_string(path).map_err(|source| ClassifierError::Io { path: path.to_owned(), source })?;
        Self::from_json(&text)
    }

    pub fn vocabulary_size(&self) -> usize {
        self.word_index.len()
    }

    /// Highest index `encode` can produce.
    pub fn max_index(&self) -> Option<u32> {
        self.word_index.values()
            .copied()
            .filter(|index| self.num_words.map(|limit| *index < limit).unwrap_or(true))
            .chain(self.oov_index)
            .max()
    }

    /// Unknown tokens, and tokens outside the `num_words` most frequent ones, become the
    /// out-of-vocabulary index, or are dropped when the encoder was fitted without one.
    pub fn encode(&self, tokens: &[String]) -> Vec<u32> {
        tokens.iter()
            .filter_map(|token| {
                let index = if self.lower {
                    self.word_index.get(&token.to_lowercase())
                } else {
                    self.word_index.get(token)
                };

                match index {
                    Some(index) if self.num_words.map(|limit| *index < limit).unwrap_or(true) => Some(*index),
                    _ => self.oov_index,
                }
            })
            .collect()
    }
}

/// Fixed-width batch: sequences longer than `max_len` keep their last `max_len` entries,
/// shorter ones are left-padded with zeros.
pub fn pad_sequences(sequences: &[Vec<u32>], max_len: usize) -> Array2<i64> {
    let mut padded = Array2::zeros((sequences.len(), max_len));

    for (row, sequence) in sequences.iter().enumerate() {
        let kept = &sequence[sequence.len().saturating_sub(max_len)..];
        let offset = max_len - kept.len();
        for (column, index) in kept.iter().enumerate() {
            padded[[row, offset + column]] = *index as i64;
        }
    }

    padded
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(values: &[&str]) -> Vec<String> {
        values.iter().map(|v| v.to_string()).collect()
    }

    fn word_index(words: &[(&str, u32)]) -> HashMap<String, u32> {
        words.iter().map(|(word, index)| (word.to_string(), *index)).collect()
    }

    #[test]
    fn unknown_tokens_map_to_the_oov_slot() {
        let encoder = VocabularyEncoder::new(word_index(&[("<OOV>", 1), ("happy", 2), ("day", 3)]), Some("<OOV>"), None).unwrap();

        assert_eq!(encoder.encode(&tokens(&["happy", "weird", "Day"])), vec![2, 1, 3]);
    }

    #[test]
    fn unknown_tokens_are_dropped_without_oov_token() {
        let encoder = VocabularyEncoder::new(word_index(&[("happy", 1)]), None, None).unwrap();

        assert_eq!(encoder.encode(&tokens(&["so", "happy"])), vec![1]);
    }

    #[test]
    fn rare_words_beyond_num_words_are_out_of_vocabulary() {
        let encoder = VocabularyEncoder::new(word_index(&[("<OOV>", 1), ("the", 2), ("rare", 9)]), Some("<OOV>"), Some(5)).unwrap();

        assert_eq!(encoder.encode(&tokens(&["the", "rare"])), vec![2, 1]);
    }

    #[test]
    fn zero_num_words_means_no_limit() {
        let encoder = VocabularyEncoder::new(word_index(&[("<OOV>", 1), ("the", 2), ("rare", 9)]), Some("<OOV>"), Some(0)).unwrap();

        assert_eq!(encoder.encode(&tokens(&["the", "rare", "weird"])), vec![2, 9, 1]);
        assert_eq!(encoder.max_index(), Some(9));
    }

    #[test]
    fn max_index_respects_num_words() {
        let encoder = VocabularyEncoder::new(word_index(&[("<OOV>", 1), ("the", 2), ("rare", 9)]), Some("<OOV>"), Some(5)).unwrap();

        assert_eq!(encoder.max_index(), Some(2));
        assert_eq!(VocabularyEncoder::new(HashMap::new(), None, None).unwrap().max_index(), None);
    }

    #[test]
    fn keras_tokenizer_json_is_supported() {
        let json = r#"{"class_name": "Tokenizer", "config": {"num_words": null, "oov_token": "<OOV>", "lower": true, "word_index": "{\"<OOV>\": 1, \"happy\": 2}"}}"#;
        let encoder = VocabularyEncoder::from_json(json).unwrap();

        assert_eq!(encoder.vocabulary_size(), 2);
        assert_eq!(encoder.encode(&tokens(&["happy", "sad"])), vec![2, 1]);
    }

    #[test]
    fn invalid_encoders_are_rejected() {
        assert!(matches!(
            VocabularyEncoder::new(word_index(&[("happy", 1)]), Some("<OOV>"), None),
            Err(ClassifierError::InvalidEncoder(_))
        ));
        assert!(matches!(
            VocabularyEncoder::new(word_index(&[("pad", 0)]), None, None),
            Err(ClassifierError::InvalidEncoder(_))
        ));
        assert!(matches!(VocabularyEncoder::from_json("[1, 2]"), Err(ClassifierError::Parse { .. })));
    }

    #[test]
    fn sequences_are_padded_and_truncated_at_the_front() {
        let padded = pad_sequences(&[vec![1, 2], vec![3, 4, 5, 6], vec![]], 3);

        assert_eq!(padded.shape(), &[3, 3]);
        assert_eq!(padded.row(0).to_vec(), vec![0, 1, 2]);
        assert_eq!(padded.row(1).to_vec(), vec![4, 5, 6]);
        assert_eq!(padded.row(2).to_vec(), vec![0, 0, 0]);
    }
}
