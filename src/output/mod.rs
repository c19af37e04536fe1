//! Output module for generating rankings and reports
//!
//! This module handles:
//! - Ranking developers and languages by stars
//! - Generating the summary, ranking and catalog markdown documents
//! - Recording the ranked developer list for the repository phase
//! - Summarizing the dataset

mod markdown;
mod rank;
pub mod stats;

pub use markdown::{
    escape_cell, homepage_link, language_link, render_documents, write_documents, Documents,
    RenderContext,
};
pub use rank::{assign_ranks, rank_developers, rank_languages, LanguageEntry, RankEntry};
pub use stats::{load_statistics, print_statistics, DatasetStatistics};

use crate::config::OutputConfig;
use crate::storage::Storage;
use crate::Result;
use chrono::NaiveDate;
use std::path::Path;
use thiserror::Error;

/// Errors that can occur during output operations
#[derive(Debug, Error)]
pub enum OutputError {
    #[error("Failed to read template {path}: {source}")]
    Template {
        path: String,
        source: std::io::Error,
    },

    #[error("Failed to write {path}: {source}")]
    Write {
        path: String,
        source: std::io::Error,
    },

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for output operations
pub type OutputResult<T> = std::result::Result<T, OutputError>;

/// What a document generation produced
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DocumentSummary {
    pub developers: usize,
    pub repositories: usize,
    pub languages: usize,
    pub ranked: usize,
}

/// Reads the summary template, or an empty template when none is configured
pub fn load_template(config: &OutputConfig) -> OutputResult<String> {
    match &config.template_path {
        Some(path) => std::fs::read_to_string(path).map_err(|source| OutputError::Template {
            path: path.clone(),
            source,
        }),
        None => Ok(String::new()),
    }
}

/// Generates every document from the persisted dataset
///
/// # Arguments
///
/// * `config` - Output configuration
/// * `storage` - Backend holding the dataset; receives the ranked developer list
/// * `date` - Date printed in the ranking headers
///
/// # Returns
///
/// * `Ok(DocumentSummary)` - Documents written
/// * `Err(MadeInError)` - Reading the dataset or writing a document failed
pub fn generate_documents(
    config: &OutputConfig,
    storage: &dyn Storage,
    date: NaiveDate,
) -> Result<DocumentSummary> {
    let developers = storage.read_developers()?;
    let repositories = storage.read_repositories()?;

    let context = RenderContext {
        homepage: config.homepage.trim_end_matches('/').to_string(),
        template: load_template(config)?,
        date,
        top_limit: config.top_limit,
        rank_limit: config.rank_limit,
        rank_style: config.rank_style,
    };

    let documents = render_documents(&repositories, developers.len(), &context);
    write_documents(
        &documents,
        Path::new(&config.readme_path),
        Path::new(&config.docs_dir),
    )?;
    storage.write_rankers(&documents.ranked_names)?;

    Ok(DocumentSummary {
        developers: developers.len(),
        repositories: repositories.len(),
        languages: documents.languages.len(),
        ranked: documents.ranked_names.len(),
    })
}
