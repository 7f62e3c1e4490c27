use {
    std::{io, path::PathBuf},
    tracing::debug,
    thiserror::Error,
    emotion_trends_core::{
        config::{ClassifierConfig, PathsConfig},
        entity::{EmotionLabel, EntityError},
    },
    crate::{
        encoder::{pad_sequences, VocabularyEncoder},
        model::{EmbeddingBagModel, SequenceModel},
    },
};

#[derive(Error, Debug)]
pub enum ClassifierError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
    #[error("failed to parse {artifact} artifact: {source}")]
    Parse {
        artifact: &'static str,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid model artifact: {0}")]
    InvalidModel(String),
    #[error("invalid encoder artifact: {0}")]
    InvalidEncoder(String),
    #[error("token index {0} is outside of the model vocabulary")]
    IndexOutOfRange(i64),
    #[error("encoder produces indices up to {encoder_max}, model vocabulary has {model_vocabulary} entries")]
    VocabularyMismatch { encoder_max: u32, model_vocabulary: usize },
    #[error("model returned {actual} predictions for {expected} inputs")]
    BatchMismatch { expected: usize, actual: usize },
    #[error(transparent)]
    Label(#[from] EntityError),
}

/// Assigns one emotion label per token sequence.
pub trait Classify: Send + Sync {
    fn classify(&self, token_sequences: &[&[String]]) -> Result<Vec<EmotionLabel>, ClassifierError>;
}

/// Encoder and model loaded once per session and used read-only afterwards.
pub struct EmotionClassifier {
    model: Box<dyn SequenceModel>,
    encoder: VocabularyEncoder,
    max_sequence_length: usize,
    batch_size: usize,
}

impl EmotionClassifier {
    pub fn new(model: Box<dyn SequenceModel>, encoder: VocabularyEncoder, max_sequence_length: usize, batch_size: usize) -> Self {
        Self {
            model,
            encoder,
            max_sequence_length,
            batch_size: batch_size.max(1),
        }
    }

    pub fn load(paths: &PathsConfig, config: &ClassifierConfig) -> Result<Self, ClassifierError> {
        let encoder = VocabularyEncoder::load(&paths.encoder())?;
        let model = EmbeddingBagModel::load(&paths.model())?;
        check_vocabulary(&encoder, &model)?;

        Ok(Self::new(Box::new(model), encoder, config.max_sequence_length(), config.batch_size()))
    }

    fn classify_batch(&self, batch: &[&[String]]) -> Result<Vec<EmotionLabel>, ClassifierError> {
        let sequences: Vec<Vec<u32>> = batch.iter().map(|tokens| self.encoder.encode(tokens)).collect();
        let inputs = pad_sequences(&sequences, self.max_sequence_length);

        let scores = self.model.predict(inputs.view())?;
        if scores.nrows() != batch.len() {
            return Err(ClassifierError::BatchMismatch { expected: batch.len(), actual: scores.nrows() });
        }

        scores.rows()
            .into_iter()
            .map(|row| EmotionLabel::from_index(argmax(row.iter().copied())).map_err(ClassifierError::from))
            .collect()
    }
}

impl Classify for EmotionClassifier {
    fn classify(&self, token_sequences: &[&[String]]) -> Result<Vec<EmotionLabel>, ClassifierError> {
        let mut labels = Vec::with_capacity(token_sequences.len());

        for batch in token_sequences.chunks(self.batch_size) {
            debug!("classifying batch of {} sequences", batch.len());
            labels.extend(self.classify_batch(batch)?);
        }

        Ok(labels)
    }
}

fn check_vocabulary(encoder: &VocabularyEncoder, model: &dyn SequenceModel) -> Result<(), ClassifierError> {
    match (encoder.max_index(), model.vocabulary_size()) {
        (Some(encoder_max), Some(model_vocabulary)) if encoder_max as usize >= model_vocabulary => {
            Err(ClassifierError::VocabularyMismatch { encoder_max, model_vocabulary })
        },
        _ => Ok(()),
    }
}

/// Index of the first maximum.
fn argmax(values: impl Iterator<Item = f32>) -> usize {
    let mut best_index = 0;
    let mut best_value = f32::NEG_INFINITY;

    for (index, value) in values.enumerate() {
        if value > best_value {
            best_index = index;
            best_value = value;
        }
    }

    best_index
}
