use {
    std::{fs::read_to_string, path::PathBuf},
    tracing::warn,
    serde::Deserialize,
};

#[derive(Deserialize, Debug)]
pub struct Config {
    pub paths: Option<PathsConfig>,
    #[serde(default)]
    pub preprocessing: PreprocessingConfig,
    #[serde(default)]
    pub trends: TrendsConfig,
    #[serde(default)]
    pub classifier: ClassifierConfig,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PathsConfig {
    raw_data: Option<PathBuf>,
    preprocessed_data: Option<PathBuf>,
    emotion_counts: Option<PathBuf>,
    model: Option<PathBuf>,
    encoder: Option<PathBuf>,
    wordnet: Option<PathBuf>,
    lexicon: Option<PathBuf>,
    lemma_exceptions: Option<PathBuf>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct PreprocessingConfig {
    #[serde(default)]
    pub exclude_terms: Vec<String>,
}

#[derive(Deserialize, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TrendSource {
    Hashtags,
    Words,
}

#[derive(Deserialize, Clone, Debug)]
pub struct TrendsConfig {
    source: Option<TrendSource>,
    top_k: Option<usize>,
    min_occurrences: Option<usize>,
}

#[derive(Deserialize, Clone, Debug)]
pub struct ClassifierConfig {
    // property of the trained model, not a general constant
    max_sequence_length: Option<usize>,
    batch_size: Option<usize>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            paths: None,
            preprocessing: PreprocessingConfig::default(),
            trends: TrendsConfig::default(),
            classifier: ClassifierConfig::default(),
        }
    }
}

impl Default for PathsConfig {
    fn default() -> Self {
        Self {
            raw_data: None,
            preprocessed_data: None,
            emotion_counts: None,
            model: None,
            encoder: None,
            wordnet: None,
            lexicon: None,
            lemma_exceptions: None,
        }
    }
}

impl Default for PreprocessingConfig {
    fn default() -> Self {
        Self {
            exclude_terms: Vec::new(),
        }
    }
}

impl Default for TrendsConfig {
    fn default() -> Self {
        Self {
            source: None,
            top_k: None,
            min_occurrences: None,
        }
    }
}

impl Default for ClassifierConfig {
    fn default() -> Self {
        Self {
            max_sequence_length: None,
            batch_size: None,
        }
    }
}

impl Config {
    pub fn load() -> Self {
        read_to_string("./config.toml")
            .or_else(|_| read_to_string("/config/config.toml"))
            .map_err(|err| err.to_string())
            .and_then(|v| Self::parse(&v))
            .unwrap_or_else(|err| {
                warn!("failed to read config: {}", err);
                Config::default()
            })
    }

    pub fn parse(text: &str) -> Result<Self, String> {
        toml::from_str(text).map_err(|err| err.to_string())
    }

    pub fn paths(&self) -> PathsConfig {
        self.paths.as_ref().cloned().unwrap_or_default()
    }

    pub fn preprocessing(&self) -> &PreprocessingConfig {
        &self.preprocessing
    }

    pub fn trends(&self) -> &TrendsConfig {
        &self.trends
    }

    pub fn classifier(&self) -> &ClassifierConfig {
        &self.classifier
    }
}

impl PathsConfig {
    pub fn raw_data(&self) -> PathBuf {
        self.raw_data.as_ref().cloned().unwrap_or_else(|| PathBuf::from("data/raw"))
    }

    pub fn preprocessed_data(&self) -> PathBuf {
        self.preprocessed_data.as_ref().cloned().unwrap_or_else(|| PathBuf::from("data/preprocessed"))
    }

    pub fn emotion_counts(&self) -> PathBuf {
        self.emotion_counts.as_ref().cloned().unwrap_or_else(|| PathBuf::from("data/emotion_counts"))
    }

    pub fn model(&self) -> PathBuf {
        self.model.as_ref().cloned().unwrap_or_else(|| PathBuf::from("models/emotion_model.json"))
    }

    pub fn encoder(&self) -> PathBuf {
        self.encoder.as_ref().cloned().unwrap_or_else(|| PathBuf::from("models/tokenizer.json"))
    }

    /// WordNet `dict` directory with the `index.*` and `*.exc` files, e.g. `nltk_data/corpora/wordnet`.
    pub fn wordnet(&self) -> PathBuf {
        self.wordnet.as_ref().cloned().unwrap_or_else(|| PathBuf::from("models/wordnet"))
    }

    pub fn lexicon(&self) -> Option<&PathBuf> {
        self.lexicon.as_ref()
    }

    pub fn lemma_exceptions(&self) -> Option<&PathBuf> {
        self.lemma_exceptions.as_ref()
    }
}

impl TrendsConfig {
    pub fn source(&self) -> TrendSource {
        self.source.unwrap_or(TrendSource::Hashtags)
    }

    pub fn top_k(&self) -> usize {
        self.top_k.unwrap_or(20)
    }

    pub fn min_occurrences(&self) -> usize {
        self.min_occurrences.unwrap_or(2)
    }
}

impl ClassifierConfig {
    pub fn max_sequence_length(&self) -> usize {
        self.max_sequence_length.unwrap_or(231)
    }

    pub fn batch_size(&self) -> usize {
        self.batch_size.unwrap_or(32).max(1)
    }
}
