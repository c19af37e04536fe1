//! Statistics over the persisted dataset
//!
//! This module provides functionality for summarizing the collected
//! developers and repositories.

use crate::config::RankStyle;
use crate::output::rank::{rank_developers, rank_languages, LanguageEntry, RankEntry};
use crate::state::Endpoint;
use crate::storage::Storage;
use crate::Result;

/// Rows shown in the top-N listings
const TOP_ENTRIES: usize = 10;

/// Dataset statistics summary
#[derive(Debug, Clone)]
pub struct DatasetStatistics {
    /// Number of known developers
    pub developers: usize,

    /// Number of collected repositories
    pub repositories: usize,

    /// Number of distinct languages
    pub languages: usize,

    /// Stars summed over every repository
    pub total_stars: u64,

    /// Developers owning at least one collected repository
    pub ranked_developers: usize,

    /// Best languages by stars
    pub top_languages: Vec<LanguageEntry>,

    /// Best developers by stars
    pub top_developers: Vec<RankEntry>,

    /// Whether an interrupted crawl left a checkpoint behind
    pub pending_checkpoint: bool,
}

/// Loads statistics from storage
///
/// # Arguments
///
/// * `storage` - The storage backend to read
/// * `style` - Rank numbering for the top listings
///
/// # Returns
///
/// * `Ok(DatasetStatistics)` - Successfully computed statistics
/// * `Err(MadeInError)` - Failed to read the dataset
pub fn load_statistics(storage: &dyn Storage, style: RankStyle) -> Result<DatasetStatistics> {
    let developers = storage.read_developers()?;
    let repositories = storage.read_repositories()?;
    let pending_checkpoint = storage.read_checkpoint(Endpoint::Users)?.is_some()
        || storage.read_checkpoint(Endpoint::Repositories)?.is_some();

    let languages = rank_languages(&repositories, style);
    let ranks = rank_developers(&repositories, style);

    Ok(DatasetStatistics {
        developers: developers.len(),
        repositories: repositories.len(),
        languages: languages.len(),
        total_stars: repositories.iter().map(|r| r.stars).sum(),
        ranked_developers: ranks.len(),
        top_languages: languages.into_iter().take(TOP_ENTRIES).collect(),
        top_developers: ranks.into_iter().take(TOP_ENTRIES).collect(),
        pending_checkpoint,
    })
}

/// Prints statistics to stdout in a formatted manner
///
/// # Arguments
///
/// * `stats` - The statistics to display
pub fn print_statistics(stats: &DatasetStatistics) {
    println!("=== Dataset Statistics ===\n");

    println!("Overview:");
    println!("  Developers: {}", stats.developers);
    println!("  Developers with repositories: {}", stats.ranked_developers);
    println!("  Repositories: {}", stats.repositories);
    println!("  Languages: {}", stats.languages);
    println!("  Total stars: {}", stats.total_stars);
    println!();

    if !stats.top_languages.is_empty() {
        println!("Top Languages:");
        for entry in &stats.top_languages {
            let share = if stats.total_stars > 0 {
                (entry.stars as f64 / stats.total_stars as f64) * 100.0
            } else {
                0.0
            };
            println!(
                "  {}. {}: {} stars in {} repositories ({:.1}%)",
                entry.rank, entry.language, entry.stars, entry.repositories, share
            );
        }
        println!();
    }

    if !stats.top_developers.is_empty() {
        println!("Top Developers:");
        for entry in &stats.top_developers {
            println!("  {}. {}: {} stars", entry.rank, entry.name, entry.stars);
        }
        println!();
    }

    if stats.pending_checkpoint {
        println!("An interrupted crawl can be continued with --resume");
    }
}
