use {
    std::sync::Arc,
    tracing::info,
    anyhow::{Context, Result},
    emotion_trends_core::{
        config::Config,
        storage::Storage,
    },
    emotion_trends_pipeline::{
        data_loading::{load_day_buckets, save_results},
        session::Session,
        utils::init_logging,
    },
};

#[tokio::main]
async fn main() -> Result<()> {
    init_logging();

    info!("emotion trends pipeline");

    let config = Arc::new(Config::load());
    let storage = Arc::new(Storage::new(&config.paths()));

    let session = {
        let config = config.clone();
        tokio::task::spawn_blocking(move || Session::load(&config)).await??
    };

    let emotion_counts = tokio::task::spawn_blocking(move || -> Result<_> {
        let buckets = load_day_buckets(&storage)?;
        let output = session.run(&buckets).context("pipeline run failed")?;
        save_results(&storage, &output)
    }).await??;

    info!("done, emotion counts written to {}", emotion_counts.display());

    Ok(())
}
