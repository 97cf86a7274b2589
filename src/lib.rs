//! Ask questions about property listings in plain English.
//!
//! A question is translated to SQL by a language model, run against DuckDB, and the rows
//! are summarized by the model again. See [`pipeline::QueryPipeline`].

pub mod config;
pub mod context;
pub mod db;
pub mod ingest;
pub mod llm;
pub mod pipeline;
pub mod query;
pub mod util;
pub mod web;
