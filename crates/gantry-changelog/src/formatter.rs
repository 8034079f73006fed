//! Release notes formatters

use std::collections::BTreeMap;

use tracing::{debug, instrument};

use crate::types::{ChangelogEntry, CommitType, Section};

/// Trait for release notes formatters
pub trait NotesFormatter: Send + Sync {
    /// Format entries, oldest first, into release notes
    fn format(&self, entries: &[ChangelogEntry]) -> String;
}

/// One `- <subject> (<author>)` line per commit
#[derive(Debug, Clone, Copy, Default)]
pub struct FlatFormatter;

impl NotesFormatter for FlatFormatter {
    fn format(&self, entries: &[ChangelogEntry]) -> String {
        entries
            .iter()
            .map(|e| format!("- {} ({})", e.subject, e.author))
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// Entries grouped under `<Section>:` headers in [`CommitType`] order
#[derive(Debug, Clone, Copy, Default)]
pub struct GroupedFormatter;

impl GroupedFormatter {
    /// Group entries into non-empty sections
    pub fn sections(entries: &[ChangelogEntry]) -> Vec<Section> {
        let mut grouped: BTreeMap<CommitType, Section> = BTreeMap::new();
        for entry in entries {
            grouped
                .entry(entry.commit_type)
                .or_insert_with(|| Section::new(entry.commit_type.section_title()))
                .entries
                .push(entry.clone());
        }
        grouped.into_values().filter(|s| !s.is_empty()).collect()
    }
}

impl NotesFormatter for GroupedFormatter {
    #[instrument(skip_all, fields(entry_count = entries.len()))]
    fn format(&self, entries: &[ChangelogEntry]) -> String {
        let sections = Self::sections(entries);
        debug!(section_count = sections.len(), "grouped release notes");

        sections
            .iter()
            .map(|section| {
                let mut block = format!("{}:", section.title);
                for entry in &section.entries {
                    block.push_str("\n- ");
                    if let Some(scope) = &entry.scope {
                        block.push_str(scope);
                        block.push_str(": ");
                    }
                    block.push_str(&entry.description);
                    block.push_str(&format!(" ({})", entry.author));
                }
                block
            })
            .collect::<Vec<_>>()
            .join("\n\n")
    }
}

/// Cut `notes` to at most `max_chars` characters on a line boundary
///
/// Section headers and blank lines left dangling at the end are dropped. A
/// first line longer than the limit is cut mid-line.
pub fn truncate_notes(notes: &str, max_chars: usize) -> String {
    if notes.chars().count() <= max_chars {
        return notes.to_string();
    }

    let mut kept: Vec<&str> = Vec::new();
    let mut used = 0;
    for line in notes.lines() {
        let cost = line.chars().count() + usize::from(!kept.is_empty());
        if used + cost > max_chars {
            break;
        }
        used += cost;
        kept.push(line);
    }

    while kept
        .last()
        .map(|l| l.trim().is_empty() || l.ends_with(':'))
        .unwrap_or(false)
    {
        kept.pop();
    }

    if kept.is_empty() {
        return notes
            .lines()
            .next()
            .unwrap_or_default()
            .chars()
            .take(max_chars)
            .collect();
    }

    kept.join("\n")
}
