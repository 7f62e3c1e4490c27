use {
    std::{collections::BTreeMap, fmt, str::FromStr},
    typed_builder::TypedBuilder,
    serde::{Serialize, Deserialize},
    chrono::{NaiveDate, NaiveDateTime},
    thiserror::Error,
};

#[derive(Error, Debug, PartialEq, Eq)]
pub enum EntityError {
    #[error("invalid day key {0:?}, expected YYYY-MM-DD")]
    InvalidDay(String),
    #[error("day {0} is already present")]
    DuplicateDay(DayKey),
    #[error("label index {0} is outside of the emotion label space")]
    UnknownLabel(usize),
}

/// Calendar day used to partition records, formatted as `YYYY-MM-DD`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct DayKey(NaiveDate);

impl DayKey {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }
}

impl FromStr for DayKey {
    type Err = EntityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
            .map(Self)
            .map_err(|_| EntityError::InvalidDay(s.to_owned()))
    }
}

impl TryFrom<String> for DayKey {
    type Error = EntityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<DayKey> for String {
    fn from(day: DayKey) -> Self {
        day.to_string()
    }
}

impl fmt::Display for DayKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%Y-%m-%d"))
    }
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct Record {
    #[serde(with = "timestamp")]
    pub date: NaiveDateTime,
    pub content: String,
}

impl Record {
    pub fn new(date: NaiveDateTime, content: impl Into<String>) -> Self {
        Self {
            date,
            content: content.into(),
        }
    }

    pub fn cleaned(&self, content_cleaned: String, hashtags: Vec<String>) -> CleanedRecord {
        CleanedRecord {
            record: self.clone(),
            content_cleaned,
            hashtags,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct DayBucket {
    day: DayKey,
    records: Vec<Record>,
}

impl DayBucket {
    pub fn new(day: DayKey, records: Vec<Record>) -> Self {
        Self { day, records }
    }

    pub fn day(&self) -> DayKey {
        self.day
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

/// Day buckets keyed by unique day, always iterated in ascending day order.
#[derive(Clone, Debug, Default)]
pub struct DayBuckets {
    buckets: BTreeMap<DayKey, DayBucket>,
}

impl DayBuckets {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, bucket: DayBucket) -> Result<(), EntityError> {
        let day = bucket.day();
        if self.buckets.contains_key(&day) {
            return Err(EntityError::DuplicateDay(day));
        }
        self.buckets.insert(day, bucket);
        Ok(())
    }

    pub fn get(&self, day: &DayKey) -> Option<&DayBucket> {
        self.buckets.get(day)
    }

    pub fn days(&self) -> impl Iterator<Item = DayKey> + '_ {
        self.buckets.keys().copied()
    }

    pub fn iter(&self) -> impl Iterator<Item = &DayBucket> {
        self.buckets.values()
    }

    pub fn len(&self) -> usize {
        self.buckets.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buckets.is_empty()
    }

    pub fn total_records(&self) -> usize {
        self.buckets.values().map(|bucket| bucket.records.len()).sum()
    }
}

impl TryFrom<Vec<DayBucket>> for DayBuckets {
    type Error = EntityError;

    fn try_from(buckets: Vec<DayBucket>) -> Result<Self, Self::Error> {
        let mut result = Self::new();
        for bucket in buckets {
            result.insert(bucket)?;
        }
        Ok(result)
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct CleanedRecord {
    pub record: Record,
    pub content_cleaned: String,
    // case-sensitive, deduplicated, order of first appearance
    pub hashtags: Vec<String>,
}

impl CleanedRecord {
    pub fn tokenized(&self, content_preprocessed: Vec<String>, content_preprocessed_with_stopwords: Vec<String>) -> TokenizedRecord {
        TokenizedRecord {
            cleaned: self.clone(),
            content_preprocessed,
            content_preprocessed_with_stopwords,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct TokenizedRecord {
    pub cleaned: CleanedRecord,
    /// Stopwords removed and lemmatized. Feeds trend counting.
    pub content_preprocessed: Vec<String>,
    /// Stopwords retained, not lemmatized. Feeds the classifier.
    pub content_preprocessed_with_stopwords: Vec<String>,
}

impl TokenizedRecord {
    pub fn labeled(&self, emotion_label: EmotionLabel) -> LabeledRecord {
        LabeledRecord {
            tokenized: self.clone(),
            emotion_label,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct LabeledRecord {
    pub tokenized: TokenizedRecord,
    pub emotion_label: EmotionLabel,
}

/// Label space of the emotion model. The index of each variant is the class index of the model output.
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "usize", into = "usize")]
pub enum EmotionLabel {
    NoEmotion = 0,
    Anger = 1,
    // valid output of the model, never reported in emotion counts
    Disgust = 2,
    Fear = 3,
    Happiness = 4,
    Sadness = 5,
    Surprise = 6,
}

impl EmotionLabel {
    pub const ALL: [EmotionLabel; 7] = [
        EmotionLabel::NoEmotion,
        EmotionLabel::Anger,
        EmotionLabel::Disgust,
        EmotionLabel::Fear,
        EmotionLabel::Happiness,
        EmotionLabel::Sadness,
        EmotionLabel::Surprise,
    ];

    pub const REPORTED: [EmotionLabel; 6] = [
        EmotionLabel::NoEmotion,
        EmotionLabel::Anger,
        EmotionLabel::Fear,
        EmotionLabel::Happiness,
        EmotionLabel::Sadness,
        EmotionLabel::Surprise,
    ];

    pub fn from_index(index: usize) -> Result<Self, EntityError> {
        Self::ALL.get(index).copied().ok_or(EntityError::UnknownLabel(index))
    }

    pub fn index(&self) -> usize {
        *self as usize
    }

    pub fn name(&self) -> &'static str {
        match self {
            EmotionLabel::NoEmotion => "no emotion",
            EmotionLabel::Anger => "anger",
            EmotionLabel::Disgust => "disgust",
            EmotionLabel::Fear => "fear",
            EmotionLabel::Happiness => "happiness",
            EmotionLabel::Sadness => "sadness",
            EmotionLabel::Surprise => "surprise",
        }
    }
}

impl TryFrom<usize> for EmotionLabel {
    type Error = EntityError;

    fn try_from(index: usize) -> Result<Self, Self::Error> {
        Self::from_index(index)
    }
}

impl From<EmotionLabel> for usize {
    fn from(label: EmotionLabel) -> Self {
        label.index()
    }
}

impl fmt::Display for EmotionLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct EmotionCounts([usize; 7]);

impl EmotionCounts {
    pub fn from_labels<'a>(labels: impl IntoIterator<Item = &'a EmotionLabel>) -> Self {
        let mut counts = Self::default();
        for label in labels {
            counts.increment(*label);
        }
        counts
    }

    pub fn increment(&mut self, label: EmotionLabel) {
        self.0[label.index()] += 1;
    }

    pub fn get(&self, label: EmotionLabel) -> usize {
        self.0[label.index()]
    }

    pub fn total(&self) -> usize {
        self.0.iter().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (EmotionLabel, usize)> + '_ {
        EmotionLabel::ALL.iter().map(|label| (*label, self.get(*label)))
    }
}

#[derive(TypedBuilder, Clone, Debug, PartialEq)]
pub struct DaySummary {
    day: DayKey,
    #[builder(default)]
    counts: EmotionCounts,
    #[builder(default)]
    top_terms: Vec<(String, usize)>,
}

impl DaySummary {
    pub fn day(&self) -> DayKey {
        self.day
    }

    pub fn counts(&self) -> &EmotionCounts {
        &self.counts
    }

    pub fn top_terms(&self) -> &[(String, usize)] {
        &self.top_terms
    }
}

/// Per-day summaries in ascending day order.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct EmotionTimeSeries {
    summaries: Vec<DaySummary>,
}

impl EmotionTimeSeries {
    pub fn new(mut summaries: Vec<DaySummary>) -> Self {
        summaries.sort_by_key(|summary| summary.day());
        Self { summaries }
    }

    pub fn summaries(&self) -> &[DaySummary] {
        &self.summaries
    }

    pub fn get(&self, day: &DayKey) -> Option<&DaySummary> {
        self.summaries
            .binary_search_by_key(day, |summary| summary.day())
            .ok()
            .map(|index| &self.summaries[index])
    }

    pub fn len(&self) -> usize {
        self.summaries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.summaries.is_empty()
    }
}

pub(crate) mod timestamp {
    use {
        chrono::{DateTime, NaiveDate, NaiveDateTime},
        serde::{Deserialize, Deserializer, Serializer, de::Error},
    };

    const FORMAT: &str = "%Y-%m-%d %H:%M:%S";

    pub fn serialize<S: Serializer>(value: &NaiveDateTime, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(&value.format(FORMAT).to_string())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<NaiveDateTime, D::Error> {
        let value = String::deserialize(deserializer)?;
        parse(&value).ok_or_else(|| D::Error::custom(format!("unsupported timestamp: {}", value)))
    }

    /// Scraped timestamps come with or without an offset; offsets are folded into UTC.
    pub fn parse(value: &str) -> Option<NaiveDateTime> {
        let value = value.trim();

        DateTime::parse_from_rfc3339(value)
            .or_else(|_| DateTime::parse_from_str(value, "%Y-%m-%d %H:%M:%S%:z"))
            .map(|v| v.naive_utc())
            .ok()
            .or_else(|| NaiveDateTime::parse_from_str(value, FORMAT).ok())
            .or_else(|| NaiveDateTime::parse_from_str(value, "%Y-%m-%dT%H:%M:%S").ok())
            .or_else(|| NaiveDate::parse_from_str(value, "%Y-%m-%d").ok().and_then(|v| v.and_hms_opt(0, 0, 0)))
    }
}
