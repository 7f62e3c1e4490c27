use {
    std::{fs, path::{Path, PathBuf}},
    tracing::{info, warn},
    serde::Serialize,
    anyhow::{anyhow, Context, Result},
    crate::{
        config::PathsConfig,
        entity::{DayBucket, DayKey, EmotionLabel, EmotionTimeSeries, LabeledRecord, Record},
    },
};

pub const EMOTION_COUNTS_FILE: &str = "emotion_counts.csv";

/// Per-day CSV tables on the local filesystem. Derived tables are overwritten on every run.
pub struct Storage {
    raw_data: PathBuf,
    preprocessed_data: PathBuf,
    emotion_counts: PathBuf,
}

#[derive(Serialize)]
struct PreprocessedRow {
    #[serde(with = "crate::entity::timestamp")]
    date: chrono::NaiveDateTime,
    content: String,
    content_cleaned: String,
    hashtags: String,
    content_preprocessed: String,
    content_preprocessed_with_stopwords: String,
    predicted_labels: usize,
}

impl Storage {
    pub fn new(config: &PathsConfig) -> Self {
        Self {
            raw_data: config.raw_data(),
            preprocessed_data: config.preprocessed_data(),
            emotion_counts: config.emotion_counts(),
        }
    }

    pub fn raw_data(&self) -> &Path {
        &self.raw_data
    }

    /// Day files in the raw data directory, ascending by day. Files not named after a day are skipped.
    pub fn list_raw_days(&self) -> Result<Vec<(DayKey, PathBuf)>> {
        let mut days = Vec::new();

        for entry in fs::read_dir(&self.raw_data).with_context(|| format!("failed to list {}", self.raw_data.display()))? {
            let path = entry?.path();
            if path.extension().and_then(|v| v.to_str()) != Some("csv") {
                continue;
            }

            let stem = path.file_stem().and_then(|v| v.to_str()).unwrap_or_default();
            match stem.parse::<DayKey>() {
                Ok(day) => days.push((day, path)),
                Err(err) => warn!("skipping raw data file {}: {}", path.display(), err),
            }
        }

        days.sort_by_key(|(day, _)| *day);
        Ok(days)
    }

    pub fn read_raw_day(&self, day: DayKey, path: &Path) -> Result<DayBucket> {
        let mut reader = csv::Reader::from_path(path).with_context(|| format!("failed to open {}", path.display()))?;
        let records = reader.deserialize::<Record>()
            .collect::<Result<Vec<_>, _>>()
            .with_context(|| format!("failed to parse {}", path.display()))?;

        Ok(DayBucket::new(day, records))
    }

    pub fn write_preprocessed_day(&self, day: DayKey, records: &[LabeledRecord]) -> Result<()> {
        fs::create_dir_all(&self.preprocessed_data)?;
        let path = day_file(&self.preprocessed_data, day);
        let mut writer = csv::Writer::from_path(&path)?;

        if records.is_empty() {
            writer.write_record([
                "date",
                "content",
                "content_cleaned",
                "hashtags",
                "content_preprocessed",
                "content_preprocessed_with_stopwords",
                "predicted_labels",
            ])?;
        }
        for record in records {
            writer.serialize(PreprocessedRow::from_labeled(record)?)?;
        }

        writer.flush()?;
        Ok(())
    }

    pub fn write_emotion_counts(&self, series: &EmotionTimeSeries) -> Result<PathBuf> {
        fs::create_dir_all(&self.emotion_counts)?;
        let path = self.emotion_counts.join(EMOTION_COUNTS_FILE);
        let mut writer = csv::Writer::from_path(&path)?;

        let mut header = vec!["Date".to_owned()];
        header.extend(EmotionLabel::REPORTED.iter().map(|label| label.name().to_owned()));
        header.push("hashtags".to_owned());
        writer.write_record(&header)?;

        for summary in series.summaries() {
            let mut row = vec![summary.day().to_string()];
            row.extend(EmotionLabel::REPORTED.iter().map(|label| summary.counts().get(*label).to_string()));
            row.push(summary.top_terms().iter().map(|(term, _)| term.as_str()).collect::<Vec<_>>().join(","));
            writer.write_record(&row)?;
        }

        writer.flush()?;
        info!("wrote emotion counts for {} days to {}", series.len(), path.display());
        Ok(path)
    }

    pub fn clear_derived(&self) -> Result<()> {
        clear_directory(&self.preprocessed_data)?;
        clear_directory(&self.emotion_counts)
    }
}

impl PreprocessedRow {
    fn from_labeled(record: &LabeledRecord) -> Result<Self> {
        let tokenized = &record.tokenized;
        let cleaned = &tokenized.cleaned;

        Ok(Self {
            date: cleaned.record.date,
            content: cleaned.record.content.clone(),
            content_cleaned: cleaned.content_cleaned.clone(),
            hashtags: serde_json::to_string(&cleaned.hashtags)?,
            content_preprocessed: serde_json::to_string(&tokenized.content_preprocessed)?,
            content_preprocessed_with_stopwords: serde_json::to_string(&tokenized.content_preprocessed_with_stopwords)?,
            predicted_labels: record.emotion_label.index(),
        })
    }
}

fn day_file(dir: &Path, day: DayKey) -> PathBuf {
    dir.join(format!("{}.csv", day))
}

/// Removes every file in the directory, keeping the directory itself. A missing directory is not an error.
pub fn clear_directory(path: &Path) -> Result<()> {
    if !path.exists() {
        return Ok(());
    }
    if !path.is_dir() {
        return Err(anyhow!("{} is not a directory", path.display()));
    }

    for entry in fs::read_dir(path)? {
        let entry_path = entry?.path();
        if entry_path.is_file() {
            fs::remove_file(&entry_path).with_context(|| format!("failed to remove {}", entry_path.display()))?;
        }
    }

    Ok(())
}
