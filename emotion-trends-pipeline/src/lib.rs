pub mod aggregation;
pub mod classifier;
pub mod data_loading;
pub mod encoder;
pub mod lemmatization;
pub mod model;
pub mod normalization;
pub mod progress;
pub mod session;
pub mod stopwords;
pub mod tokenization;
pub mod trends;
pub mod utils;
