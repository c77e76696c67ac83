//! CLAUDE.md fragment splitter

use crate::artifacts::ClaudeMdFragment;
use std::collections::HashSet;

/// Heading used for text that precedes the first `## ` heading
pub const PREAMBLE_HEADING: &str = "(preamble)";

/// Split a CLAUDE.md document at level-2 headings
///
/// Text before the first heading becomes a `preamble` fragment when it is not
/// blank. Keys are heading slugs, suffixed `-2`, `-3`, ... when a slug repeats.
#[must_use]
pub fn split_fragments(content: &str) -> Vec<ClaudeMdFragment> {
    let mut sections: Vec<(String, String)> = Vec::new();
    let mut heading = PREAMBLE_HEADING.to_string();
    let mut body = String::new();

    for line in content.lines() {
        if let Some(title) = line.strip_prefix("## ") {
            sections.push((std::mem::take(&mut heading), std::mem::take(&mut body)));
            heading = title.trim().to_string();
        }
        body.push_str(line);
        body.push('\n');
    }
    sections.push((heading, body));

    let mut seen = HashSet::new();
    sections
        .into_iter()
        .filter(|(heading, body)| heading != PREAMBLE_HEADING || !body.trim().is_empty())
        .map(|(heading, content)| {
            let base = if heading == PREAMBLE_HEADING {
                "preamble".to_string()
            } else {
                slugify(&heading)
            };
            let mut key = base.clone();
            let mut n = 2;
            while !seen.insert(key.clone()) {
                key = format!("{base}-{n}");
                n += 1;
            }
            ClaudeMdFragment {
                key,
                heading,
                content,
            }
        })
        .collect()
}

/// Lowercase, alphanumerics kept, everything else collapsed to single dashes
#[must_use]
pub fn slugify(text: &str) -> String {
    let mut slug = String::with_capacity(text.len());
    for c in text.chars() {
        if c.is_alphanumeric() {
            slug.extend(c.to_lowercase());
        } else if !slug.ends_with('-') && !slug.is_empty() {
            slug.push('-');
        }
    }
    let trimmed = slug.trim_end_matches('-');
    if trimmed.is_empty() {
        "section".to_string()
    } else {
        trimmed.to_string()
    }
}
