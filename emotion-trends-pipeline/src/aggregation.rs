use {
    std::collections::BTreeMap,
    tracing::{info, debug},
    thiserror::Error,
    emotion_trends_core::entity::{
        CleanedRecord,
        DayBuckets,
        DayKey,
        DaySummary,
        EmotionCounts,
        EmotionLabel,
        EmotionTimeSeries,
        LabeledRecord,
        TokenizedRecord,
    },
    crate::{
        classifier::{Classify, ClassifierError},
        normalization::TextNormalizer,
        progress::Progress,
        tokenization::Tokenizer,
        trends::TrendCounter,
    },
};

#[derive(Error, Debug)]
pub enum PipelineError {
    #[error("classification failed for {day}: {source}")]
    Classification {
        day: DayKey,
        #[source]
        source: ClassifierError,
    },
    #[error("no labels were produced for {0}")]
    MissingLabels(DayKey),
    #[error("{day}: {labels} labels for {records} records")]
    LabelCountMismatch { day: DayKey, labels: usize, records: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Idle,
    Cleaning,
    Tokenizing,
    Classifying,
    Summarizing,
    Done,
}

pub struct PipelineOutput {
    pub series: EmotionTimeSeries,
    pub labeled: BTreeMap<DayKey, Vec<LabeledRecord>>,
}

/// Runs every phase over all days before moving on to the next one.
pub struct Aggregator<'a> {
    normalizer: &'a TextNormalizer,
    tokenizer: &'a Tokenizer,
    classifier: &'a dyn Classify,
    trends: &'a TrendCounter,
    phase: Phase,
}

impl<'a> Aggregator<'a> {
    pub fn new(normalizer: &'a TextNormalizer, tokenizer: &'a Tokenizer, classifier: &'a dyn Classify, trends: &'a TrendCounter) -> Self {
        Self {
            normalizer,
            tokenizer,
            classifier,
            trends,
            phase: Phase::Idle,
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn run(&mut self, buckets: &DayBuckets) -> Result<PipelineOutput, PipelineError> {
        info!("aggregating {} records over {} days", buckets.total_records(), buckets.len());

        self.enter(Phase::Cleaning);
        let cleaned: BTreeMap<DayKey, Vec<CleanedRecord>> = buckets.iter()
            .map(|bucket| (bucket.day(), bucket.records().iter().map(|record| self.normalizer.clean(record)).collect()))
            .collect();

        self.enter(Phase::Tokenizing);
        let mut progress = Progress::new("tokenizing records".to_owned());
        let mut tokenized: BTreeMap<DayKey, Vec<TokenizedRecord>> = BTreeMap::new();
        for (day, records) in &cleaned {
            tokenized.insert(*day, records.iter().map(|record| self.tokenizer.tokenize_record(record)).collect());
            progress.update_by(records.len() as u64);
        }
        progress.finish();

        self.enter(Phase::Classifying);
        let mut progress = Progress::new("classifying records".to_owned());
        let mut labels: BTreeMap<DayKey, Vec<EmotionLabel>> = BTreeMap::new();
        for (day, records) in &tokenized {
            let sequences: Vec<&[String]> = records.iter()
                .map(|record| record.content_preprocessed_with_stopwords.as_slice())
                .collect();

            let day_labels = self.classifier.classify(&sequences)
                .map_err(|source| PipelineError::Classification { day: *day, source })?;
            debug!("classified {} records for {}", day_labels.len(), day);

            labels.insert(*day, day_labels);
            progress.update_by(records.len() as u64);
        }
        progress.finish();

        self.enter(Phase::Summarizing);
        let mut summaries = Vec::with_capacity(buckets.len());
        let mut labeled = BTreeMap::new();
        for day in buckets.days() {
            let records = tokenized.get(&day).map(Vec::as_slice).unwrap_or_default();
            let day_labels = labels.get(&day).ok_or(PipelineError::MissingLabels(day))?;
            if day_labels.len() != records.len() {
                return Err(PipelineError::LabelCountMismatch { day, labels: day_labels.len(), records: records.len() });
            }

            summaries.push(DaySummary::builder()
                .day(day)
                .counts(EmotionCounts::from_labels(day_labels))
                .top_terms(self.trends.top_terms_for_records(records))
                .build());

            labeled.insert(day, records.iter().zip(day_labels).map(|(record, label)| record.labeled(*label)).collect());
        }

        self.enter(Phase::Done);
        Ok(PipelineOutput {
            series: EmotionTimeSeries::new(summaries),
            labeled,
        })
    }

    fn enter(&mut self, phase: Phase) {
        debug!("pipeline phase {:?} -> {:?}", self.phase, phase);
        self.phase = phase;
    }
}
