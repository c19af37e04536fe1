//! Developer and language rankings
//!
//! Both rankings sum stars over repositories, order by stars descending with
//! ties broken by name ascending, and give equal totals equal rank numbers.

use crate::config::RankStyle;
use crate::storage::Repository;
use std::collections::BTreeMap;

/// One ranked developer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankEntry {
    pub rank: usize,
    pub name: String,
    pub stars: u64,
}

/// One ranked language
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LanguageEntry {
    pub rank: usize,
    pub language: String,
    pub stars: u64,
    pub repositories: usize,
}

/// Rank numbers for star totals already sorted in descending order
///
/// `Dense` numbers distinct totals consecutively ([50, 50, 30] gives [1, 1, 2]).
/// `Standard` gives each entry one more than the count of strictly better
/// entries ([50, 50, 30] gives [1, 1, 3]).
pub fn assign_ranks(sorted_stars: &[u64], style: RankStyle) -> Vec<usize> {
    let mut ranks = Vec::with_capacity(sorted_stars.len());
    let mut previous: Option<(u64, usize)> = None;

    for (index, &stars) in sorted_stars.iter().enumerate() {
        let rank = match previous {
            Some((prev_stars, prev_rank)) if prev_stars == stars => prev_rank,
            Some((_, prev_rank)) => match style {
                RankStyle::Dense => prev_rank + 1,
                RankStyle::Standard => index + 1,
            },
            None => 1,
        };
        previous = Some((stars, rank));
        ranks.push(rank);
    }

    ranks
}

/// Ranks repository owners by their summed stars
pub fn rank_developers(repositories: &[Repository], style: RankStyle) -> Vec<RankEntry> {
    let mut totals: BTreeMap<&str, u64> = BTreeMap::new();
    for repo in repositories {
        *totals.entry(repo.owner.login.as_str()).or_default() += repo.stars;
    }

    let mut sorted: Vec<(&str, u64)> = totals.into_iter().collect();
    sorted.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let stars: Vec<u64> = sorted.iter().map(|(_, stars)| *stars).collect();
    sorted
        .into_iter()
        .zip(assign_ranks(&stars, style))
        .map(|((name, stars), rank)| RankEntry {
            rank,
            name: name.to_string(),
            stars,
        })
        .collect()
}

/// Ranks languages by the summed stars of their repositories
pub fn rank_languages(repositories: &[Repository], style: RankStyle) -> Vec<LanguageEntry> {
    let mut totals: BTreeMap<&str, (u64, usize)> = BTreeMap::new();
    for repo in repositories {
        let entry = totals.entry(repo.language.as_str()).or_default();
        entry.0 += repo.stars;
        entry.1 += 1;
    }

    let mut sorted: Vec<(&str, (u64, usize))> = totals.into_iter().collect();
    sorted.sort_by(|a, b| (b.1).0.cmp(&(a.1).0).then_with(|| a.0.cmp(b.0)));

    let stars: Vec<u64> = sorted.iter().map(|(_, (stars, _))| *stars).collect();
    sorted
        .into_iter()
        .zip(assign_ranks(&stars, style))
        .map(|((language, (stars, repositories)), rank)| LanguageEntry {
            rank,
            language: language.to_string(),
            stars,
            repositories,
        })
        .collect()
}
