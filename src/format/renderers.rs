//! Plain-text rendering of search results for the CLI and MCP tools.

use crate::search::{ObjectMatch, SearchHit, SearchIndex, Suggestion, TokenizerSettings};
use std::fmt::{self, Write as _};

/// Render ranked search hits.
pub fn render_search_results<'a>(
    output: &mut String,
    query: &str,
    hits: impl IntoIterator<Item = SearchHit<'a>>,
) -> fmt::Result {
    writeln!(output, "Search results for '{}':\n", query)?;

    for (idx, hit) in hits.into_iter().enumerate() {
        write!(output, "{}. {} ({})", idx + 1, hit.title(), hit.path())?;
        match hit.object {
            Some(name) => writeln!(output, " - defines `{}`", name)?,
            None => writeln!(
                output,
                " - {} matching term{}, score {:.2}",
                hit.matched_terms,
                if hit.matched_terms == 1 { "" } else { "s" },
                hit.score
            )?,
        }
    }

    Ok(())
}

/// Render the message shown when a query matched nothing.
pub fn render_no_results(
    output: &mut String,
    query: &str,
    suggestions: &[Suggestion<'_>],
    settings: &TokenizerSettings,
) -> fmt::Result {
    writeln!(output, "No results found for '{}'.\n", query)?;

    if !suggestions.is_empty() {
        writeln!(output, "Did you mean one of these?")?;
        for suggestion in suggestions {
            writeln!(output, "• `{}`", suggestion.name)?;
        }
        writeln!(output)?;
    }

    writeln!(output, "Search tips:")?;
    writeln!(output, "• Try a shorter or more general term")?;
    writeln!(
        output,
        "• Words shorter than {} letters and common words are ignored",
        settings.min_term_length
    )?;
    if settings.stem {
        writeln!(output, "• Search uses stemming: 'selection' matches 'selected'")?;
    }
    Ok(())
}

/// Render object-inventory lookup results.
pub fn render_object_matches(
    output: &mut String,
    name: &str,
    matches: &[ObjectMatch<'_>],
) -> fmt::Result {
    writeln!(output, "Objects matching '{}':\n", name)?;

    for (idx, found) in matches.iter().enumerate() {
        let shown = found.entry.display_name.as_deref().unwrap_or(found.name);
        writeln!(
            output,
            "{}. `{}` ({}) in {} ({}) - relevance: {}%",
            idx + 1,
            shown,
            found.entry.kind,
            found.document.title,
            found.document.path,
            found.relevance
        )?;
    }

    Ok(())
}

/// Render a short summary of an index.
pub fn render_index_info(output: &mut String, index: &SearchIndex) -> fmt::Result {
    writeln!(output, "Documents: {}", index.document_count())?;
    writeln!(output, "Objects: {}", index.objects().len())?;
    writeln!(output, "Terms: {}", index.terms().term_count())?;
    writeln!(output, "Title terms: {}", index.title_terms().term_count())?;
    writeln!(output, "Postings: {}", index.terms().posting_count())?;

    let settings = index.tokenizer_settings();
    writeln!(
        output,
        "Tokenizer: min length {}, stemming {}, camelCase splitting {}",
        settings.min_term_length,
        if settings.stem { "on" } else { "off" },
        if settings.split_camel_case { "on" } else { "off" }
    )
}
