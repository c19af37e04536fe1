//! Markdown document generation
//!
//! This module renders the dataset into three kinds of documents:
//! - The summary (template text, top developers and the language table)
//! - The full developer ranking
//! - One repository catalog per language

use crate::config::RankStyle;
use crate::output::rank::{rank_developers, rank_languages, LanguageEntry, RankEntry};
use crate::output::{OutputError, OutputResult};
use crate::storage::Repository;
use chrono::NaiveDate;
use std::collections::BTreeMap;
use std::path::Path;

/// Settings shared by every rendered document
#[derive(Debug, Clone)]
pub struct RenderContext {
    /// Project homepage used for links between documents
    pub homepage: String,

    /// Text placed above the summary tables
    pub template: String,

    /// Date printed in the ranking headers
    pub date: NaiveDate,

    pub top_limit: usize,
    pub rank_limit: usize,
    pub rank_style: RankStyle,
}

/// Every rendered document, ready to be written
#[derive(Debug, Clone)]
pub struct Documents {
    /// Summary document contents
    pub readme: String,

    /// Full ranking document contents
    pub rankers: String,

    /// Catalog contents keyed by language
    pub languages: BTreeMap<String, String>,

    /// Names of the best-ranked developers, for the repository phase
    pub ranked_names: Vec<String>,
}

/// Renders all documents
///
/// # Arguments
///
/// * `repositories` - The repository dataset
/// * `developer_count` - Number of known developers, printed in the headers
/// * `context` - Links, limits and date
pub fn render_documents(
    repositories: &[Repository],
    developer_count: usize,
    context: &RenderContext,
) -> Documents {
    let ranks = rank_developers(repositories, context.rank_style);
    let languages = rank_languages(repositories, context.rank_style);
    let date = context.date.format("%Y/%m/%d").to_string();

    let mut readme = context.template.clone();
    readme.push_str(&format_top_developers(
        &ranks,
        developer_count,
        &date,
        context,
    ));
    readme.push_str(&format_language_table(&languages, &context.homepage));

    Documents {
        readme,
        rankers: format_rankers_document(&ranks, developer_count, &date, context.rank_limit),
        languages: format_language_documents(repositories),
        ranked_names: ranks
            .iter()
            .take(context.rank_limit * 2)
            .map(|entry| entry.name.clone())
            .collect(),
    }
}

fn format_rank_row(entry: &RankEntry) -> String {
    format!(
        "|{}|[{}](https://github.com/{})|{}|\n",
        entry.rank, entry.name, entry.name, entry.stars
    )
}

/// Summary ranking table followed by the link to the full ranking
pub fn format_top_developers(
    ranks: &[RankEntry],
    developer_count: usize,
    date: &str,
    context: &RenderContext,
) -> String {
    let mut md = format!(
        " \n## Top {} Developers out of {} ({})\n|Rank|Name|:star2:|\n|---|---|---|\n",
        context.top_limit, developer_count, date
    );

    for entry in ranks.iter().take(context.top_limit) {
        md.push_str(&format_rank_row(entry));
    }

    md.push_str(&format!(
        "\n-> [Top {}/ Developers out of {}]({}/blob/master/docs/rankers.md)\n",
        context.rank_limit, developer_count, context.homepage
    ));
    md
}

/// Full ranking document
pub fn format_rankers_document(
    ranks: &[RankEntry],
    developer_count: usize,
    date: &str,
    rank_limit: usize,
) -> String {
    let mut md = format!(
        "## Top {} Developers out of {} ({})\n\n|Rank|Name|:star2:|\n|---|---|---|\n",
        rank_limit, developer_count, date
    );

    for entry in ranks.iter().take(rank_limit) {
        md.push_str(&format_rank_row(entry));
    }
    md
}

/// Language table with links to each catalog
pub fn format_language_table(languages: &[LanguageEntry], homepage: &str) -> String {
    let mut md = String::from(
        " \n## Languages\n|Rank|Language|:star2:|Number of Repositories|\n|---|---|---|---|\n",
    );

    for entry in languages {
        md.push_str(&format!(
            "|{}|[{}]({})|{}|{}|\n",
            entry.rank,
            entry.language,
            language_link(homepage, &entry.language),
            entry.stars,
            entry.repositories
        ));
    }
    md
}

/// Link to a language catalog, whitespace encoded as `%20`
pub fn language_link(homepage: &str, language: &str) -> String {
    format!(
        "{}/blob/master/docs/{}.md",
        homepage,
        language_file_stem(language).replace(char::is_whitespace, "%20")
    )
}

/// File stem of a language catalog; path separators cannot appear in it
pub fn language_file_stem(language: &str) -> String {
    language.replace(['/', '\\'], "-")
}

/// Escapes characters that would break a table cell
pub fn escape_cell(text: &str) -> String {
    text.replace('|', "\\|")
}

/// Homepage glyph, only for well-formed http(s) URLs
pub fn homepage_link(homepage: Option<&str>) -> String {
    let Some(homepage) = homepage else {
        return String::new();
    };

    match url::Url::parse(homepage) {
        Ok(url) if matches!(url.scheme(), "http" | "https") => {
            format!("[:arrow_upper_right:]({})", homepage)
        }
        _ => String::new(),
    }
}

fn format_catalog_row(repo: &Repository) -> String {
    format!(
        "|{}|[@{}]({})/[**{}**]({})|{}|{}|",
        repo.stars,
        repo.owner.login,
        repo.owner.html_url,
        repo.name,
        repo.html_url,
        escape_cell(repo.desc.as_deref().unwrap_or_default()),
        homepage_link(repo.homepage.as_deref())
    )
}

/// One catalog per language: stars descending, ties by owner then name
pub fn format_language_documents(repositories: &[Repository]) -> BTreeMap<String, String> {
    let mut grouped: BTreeMap<&str, Vec<&Repository>> = BTreeMap::new();
    for repo in repositories {
        grouped.entry(repo.language.as_str()).or_default().push(repo);
    }

    grouped
        .into_iter()
        .map(|(language, mut repos)| {
            repos.sort_by(|a, b| b.stars.cmp(&a.stars).then_with(|| a.key().cmp(&b.key())));

            let rows: Vec<String> = repos.iter().map(|repo| format_catalog_row(repo)).collect();
            let md = format!(
                "|:star2: | Name | Description | 🌍|\n|---|---|---|---|\n{}\n\n",
                rows.join("\n")
            );
            (language.to_string(), md)
        })
        .collect()
}

fn write_file(path: &Path, contents: &str) -> OutputResult<()> {
    std::fs::write(path, contents).map_err(|source| OutputError::Write {
        path: path.display().to_string(),
        source,
    })
}

/// Writes the summary, the ranking document and every catalog
///
/// # Arguments
///
/// * `documents` - Rendered documents
/// * `readme_path` - Destination of the summary
/// * `docs_dir` - Directory receiving `rankers.md` and the catalogs
///
/// # Returns
///
/// * `Ok(())` - Every document was written
/// * `Err(OutputError)` - A directory or file could not be written
pub fn write_documents(documents: &Documents, readme_path: &Path, docs_dir: &Path) -> OutputResult<()> {
    std::fs::create_dir_all(docs_dir)?;
    if let Some(parent) = readme_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    write_file(&docs_dir.join("rankers.md"), &documents.rankers)?;
    for (language, md) in &documents.languages {
        let path = docs_dir.join(format!("{}.md", language_file_stem(language)));
        write_file(&path, md)?;
    }
    write_file(readme_path, &documents.readme)?;

    tracing::info!(
        "Wrote {} and {} language documents",
        readme_path.display(),
        documents.languages.len()
    );
    Ok(())
}
