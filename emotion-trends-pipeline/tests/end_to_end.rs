use {
    std::{collections::HashMap, fs, path::Path},
    chrono::NaiveDate,
    ndarray::{Array2, ArrayView2},
    emotion_trends_core::{
        config::{Config, TrendSource},
        entity::{DayBucket, DayBuckets, DayKey, EmotionLabel, Record},
        storage::Storage,
    },
    emotion_trends_pipeline::{
        classifier::{ClassifierError, EmotionClassifier},
        data_loading::{load_day_buckets, save_results},
        encoder::VocabularyEncoder,
        lemmatization::{Lexicon, WordNetLemmatizer},
        model::SequenceModel,
        normalization::TextNormalizer,
        session::Session,
        stopwords::Stopwords,
        tokenization::Tokenizer,
        trends::TrendCounter,
    },
};

const HAPPY: i64 = 2;

/// Happiness when the row contains "happy", no emotion otherwise.
struct StubModel;

impl SequenceModel for StubModel {
    fn num_classes(&self) -> usize {
        7
    }

    fn predict(&self, inputs: ArrayView2<'_, i64>) -> Result<Array2<f32>, ClassifierError> {
        let mut scores = Array2::<f32>::zeros((inputs.nrows(), 7));
        for (row, tokens) in inputs.rows().into_iter().enumerate() {
            let label = if tokens.iter().any(|index| *index == HAPPY) { EmotionLabel::Happiness } else { EmotionLabel::NoEmotion };
            scores[[row, label.index()]] = 1.0;
        }
        Ok(scores)
    }
}

fn day(value: &str) -> DayKey {
    value.parse().unwrap()
}

fn bucket(value: &str, contents: &[&str]) -> DayBucket {
    let date = NaiveDate::parse_from_str(value, "%Y-%m-%d").unwrap().and_hms_opt(9, 30, 0).unwrap();
    DayBucket::new(day(value), contents.iter().map(|content| Record::new(date, *content)).collect())
}

fn scenario() -> DayBuckets {
    DayBuckets::try_from(vec![
        bucket("2024-01-01", &["I am so happy today! #joy", "nothing special"]),
        bucket("2024-01-02", &[]),
    ]).unwrap()
}

fn stub_session() -> Session {
    let word_index: HashMap<String, u32> = [("<OOV>".to_owned(), 1), ("happy".to_owned(), HAPPY as u32)].into_iter().collect();
    let encoder = VocabularyEncoder::new(word_index, Some("<OOV>"), None).unwrap();

    Session::new(
        TextNormalizer::default(),
        Tokenizer::new(Stopwords::english(), Box::new(WordNetLemmatizer::new(Lexicon::builtin().unwrap())), Vec::new()),
        Box::new(EmotionClassifier::new(Box::new(StubModel), encoder, 231, 32)),
        TrendCounter::new(TrendSource::Hashtags, 20, 1),
    )
}

#[test]
fn daily_emotions_and_trending_hashtags() {
    let output = stub_session().run(&scenario()).unwrap();

    assert_eq!(output.series.len(), 2);

    let first = output.series.get(&day("2024-01-01")).unwrap();
    assert_eq!(first.counts().get(EmotionLabel::Happiness), 1);
    assert_eq!(first.counts().get(EmotionLabel::NoEmotion), 1);
    assert_eq!(first.counts().total(), 2);
    assert!(first.top_terms().iter().any(|(term, _)| term == "joy"));

    let second = output.series.get(&day("2024-01-02")).unwrap();
    assert_eq!(second.counts().total(), 0);
    assert!(EmotionLabel::ALL.iter().all(|label| second.counts().get(*label) == 0));
    assert!(second.top_terms().is_empty());

    let labeled = &output.labeled[&day("2024-01-01")];
    assert_eq!(labeled[0].tokenized.cleaned.hashtags, vec!["joy"]);
    assert_eq!(labeled[0].tokenized.content_preprocessed_with_stopwords, vec!["i", "am", "so", "happy", "today", "joy"]);
    assert_eq!(labeled[0].tokenized.content_preprocessed, vec!["happy", "today", "joy"]);
    assert!(output.labeled[&day("2024-01-02")].is_empty());
}

fn write(path: &Path, contents: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, contents).unwrap();
}

#[test]
fn full_run_from_raw_files_to_emotion_counts_table() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    // "happy" points along the second embedding axis, which the dense layer maps to happiness
    write(&root.join("models/emotion_model.json"), r#"{
        "embedding": [[0.0, 0.0], [1.0, 0.0], [0.0, 1.0]],
        "dense_weights": [[1.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0], [0.0, 0.0, 0.0, 0.0, 10.0, 0.0, 0.0]],
        "dense_bias": [0.0, 0.0, 0.0, 0.0, 0.0, 0.0, 0.0]
    }"#);
    write(&root.join("models/tokenizer.json"), r#"{"word_index": {"<OOV>": 1, "happy": 2}, "oov_token": "<OOV>"}"#);

    let config = Config::parse(&format!(
        r#"
[paths]
raw_data = "{0}/raw"
preprocessed_data = "{0}/preprocessed"
emotion_counts = "{0}/emotion_counts"
model = "{0}/models/emotion_model.json"
encoder = "{0}/models/tokenizer.json"
wordnet = "{1}/tests/fixtures/wordnet"

[trends]
source = "hashtags"
min_occurrences = 1
"#,
        root.display(),
        env!("CARGO_MANIFEST_DIR"),
    )).unwrap();

    write(&root.join("raw/2024-01-01.csv"), "date,content\n2024-01-01 09:30:00,I am so happy today! #joy\n2024-01-01 18:05:00,nothing special\n");
    write(&root.join("raw/2024-01-02.csv"), "date,content\n");
    write(&root.join("emotion_counts/stale.csv"), "left over from a previous run\n");

    let storage = Storage::new(&config.paths());
    let session = Session::load(&config).unwrap();
    let buckets = load_day_buckets(&storage).unwrap();
    assert_eq!(buckets.len(), 2);

    let output = session.run(&buckets).unwrap();
    let emotion_counts = save_results(&storage, &output).unwrap();

    assert!(!root.join("emotion_counts/stale.csv").exists());
    assert_eq!(
        fs::read_to_string(emotion_counts).unwrap(),
        "Date,no emotion,anger,fear,happiness,sadness,surprise,hashtags\n\
         2024-01-01,1,0,0,1,0,0,joy\n\
         2024-01-02,0,0,0,0,0,0,\n"
    );

    let preprocessed = fs::read_to_string(root.join("preprocessed/2024-01-01.csv")).unwrap();
    assert!(preprocessed.starts_with("date,content,content_cleaned,hashtags,content_preprocessed,content_preprocessed_with_stopwords,predicted_labels\n"));
    assert!(preprocessed.contains("I am so happy today joy"));
    assert!(root.join("preprocessed/2024-01-02.csv").exists());
}
