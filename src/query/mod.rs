pub mod models;
pub mod sanitize;
pub mod summarizer;
pub mod synthesizer;
