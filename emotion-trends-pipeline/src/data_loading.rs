use {
    std::path::PathBuf,
    indicatif::ProgressBar,
    tracing::info,
    anyhow::Result,
    emotion_trends_core::{
        entity::DayBuckets,
        storage::Storage,
    },
    crate::aggregation::PipelineOutput,
};

pub fn load_day_buckets(storage: &Storage) -> Result<DayBuckets> {
    let days = storage.list_raw_days()?;
    info!("loading {} day files from {}", days.len(), storage.raw_data().display());

    let pb = ProgressBar::new(days.len() as u64);
    let mut buckets = DayBuckets::new();

    for (day, path) in days {
        buckets.insert(storage.read_raw_day(day, &path)?)?;
        pb.inc(1);
    }

    pb.finish();
    info!("loaded {} records", buckets.total_records());

    Ok(buckets)
}

/// Replaces all derived tables with the ones from this run. Returns the emotion counts table path.
pub fn save_results(storage: &Storage, output: &PipelineOutput) -> Result<PathBuf> {
    storage.clear_derived()?;

    for (day, records) in &output.labeled {
        storage.write_preprocessed_day(*day, records)?;
    }

    let emotion_counts = storage.write_emotion_counts(&output.series)?;
    info!("saved {} days of emotion counts to {}", output.series.len(), emotion_counts.display());

    Ok(emotion_counts)
}
