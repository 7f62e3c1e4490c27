use {
    tracing::Level,
    tracing_subscriber::{
        prelude::*,
        filter::{filter_fn, EnvFilter},
    },
};

pub fn init_logging() {
    tracing_subscriber::FmtSubscriber::builder()
        .with_max_level(Level::DEBUG)
        .finish()
        .with(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with(filter_fn(|metadata| {
            // the embedded interpreter is chatty at info level
            if metadata.target().starts_with("pyo3") {
                metadata.level() <= &Level::WARN
            } else {
                true
            }
        }))
        .init();
}
