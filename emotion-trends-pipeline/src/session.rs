use {
    tracing::info,
    anyhow::{Context, Result},
    emotion_trends_core::{
        config::Config,
        entity::DayBuckets,
    },
    crate::{
        aggregation::{Aggregator, PipelineError, PipelineOutput},
        classifier::{Classify, EmotionClassifier},
        lemmatization::Lemmatizer,
        normalization::TextNormalizer,
        stopwords::Stopwords,
        tokenization::Tokenizer,
        trends::TrendCounter,
    },
};

/// Everything that is loaded once per run and shared read-only between days.
pub struct Session {
    normalizer: TextNormalizer,
    tokenizer: Tokenizer,
    classifier: Box<dyn Classify>,
    trends: TrendCounter,
}

impl Session {
    pub fn new(normalizer: TextNormalizer, tokenizer: Tokenizer, classifier: Box<dyn Classify>, trends: TrendCounter) -> Self {
        Self {
            normalizer,
            tokenizer,
            classifier,
            trends,
        }
    }

    pub fn load(config: &Config) -> Result<Self> {
        let paths = config.paths();
        let exclude_terms = config.preprocessing().exclude_terms.clone();

        let classifier = EmotionClassifier::load(&paths, config.classifier())
            .context("failed to load emotion classifier")?;

        Ok(Self::new(
            TextNormalizer::new(exclude_terms.clone()),
            Tokenizer::new(Stopwords::english(), load_lemmatizer(config)?, exclude_terms),
            Box::new(classifier),
            TrendCounter::from_config(config.trends()),
        ))
    }

    pub fn run(&self, buckets: &DayBuckets) -> Result<PipelineOutput, PipelineError> {
        Aggregator::new(&self.normalizer, &self.tokenizer, self.classifier.as_ref(), &self.trends).run(buckets)
    }
}

#[cfg(feature = "nltk")]
fn load_lemmatizer(_config: &Config) -> Result<Box<dyn Lemmatizer>> {
    info!("using nltk lemmatizer");
    Ok(Box::new(crate::lemmatization::NltkLemmatizer::new()?))
}

#[cfg(not(feature = "nltk"))]
fn load_lemmatizer(config: &Config) -> Result<Box<dyn Lemmatizer>> {
    use crate::lemmatization::{Lexicon, WordNetLemmatizer};

    let paths = config.paths();

    let wordnet = paths.wordnet();

    let lexicon = match paths.lexicon() {
        Some(lexicon) => Lexicon::from_files(lexicon, paths.lemma_exceptions().map(|v| v.as_path()))
            .with_context(|| format!("failed to load lexicon from {}", lexicon.display()))?,
        None if wordnet.is_dir() => Lexicon::from_wordnet(&wordnet)
            .with_context(|| format!("failed to load wordnet dictionary from {}", wordnet.display()))?,
        None => {
            tracing::warn!("no wordnet dictionary at {}, falling back to the builtin lexicon", wordnet.display());
            Lexicon::builtin().context("failed to load builtin lexicon")?
        },
    };
    info!("loaded lexicon with {} lemmas", lexicon.len());

    Ok(Box::new(WordNetLemmatizer::new(lexicon)))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_model_artifacts_are_fatal() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::parse(&format!(
            "[paths]\nmodel = \"{0}/model.json\"\nencoder = \"{0}/tokenizer.json\"\n",
            dir.path().display()
        )).unwrap();

        let err = Session::load(&config).err().unwrap();

        assert!(err.to_string().contains("failed to load emotion classifier"));
    }

    #[cfg(not(feature = "nltk"))]
    #[test]
    fn wordnet_dictionary_is_used_when_installed() {
        let config = Config::parse(&format!(
            "[paths]\nwordnet = \"{}/tests/fixtures/wordnet\"\n",
            env!("CARGO_MANIFEST_DIR")
        )).unwrap();

        let lemmatizer = load_lemmatizer(&config).unwrap();

        assert_eq!(lemmatizer.lemmatize("walked"), "walk");
        assert_eq!(lemmatizer.lemmatize("hours"), "hour");
    }

    #[cfg(not(feature = "nltk"))]
    #[test]
    fn builtin_lexicon_is_the_fallback() {
        let dir = tempfile::tempdir().unwrap();
        let config = Config::parse(&format!("[paths]\nwordnet = \"{}/missing\"\n", dir.path().display())).unwrap();

        let lemmatizer = load_lemmatizer(&config).unwrap();

        assert_eq!(lemmatizer.lemmatize("cats"), "cat");
    }
}
