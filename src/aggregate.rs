//! Attraction aggregation
//!
//! The catalog stores one row per title/text variant of an attraction. This
//! module folds those rows into one record per attraction name and trims the
//! text snippets so that attractions with many snippets do not crowd out the
//! rest of the evidence.

use tracing::debug;

use crate::models::{AggregatedAttraction, RawAttractionRow};

/// Character budget for attraction text snippets
#[derive(Debug, Clone, Copy)]
pub struct AggregatedTextBudget {
    /// Cutoff never drops below this many characters
    pub min_chars: usize,
    /// Cutoff for an attraction with no texts
    pub max_chars: usize,
    /// Characters removed from the cutoff per text
    pub step_chars: usize,
}

impl Default for AggregatedTextBudget {
    fn default() -> Self {
        Self {
            min_chars: 50,
            max_chars: 200,
            step_chars: 10,
        }
    }
}

impl AggregatedTextBudget {
    /// Per-text character cutoff for an attraction with `text_count` texts
    #[must_use]
    pub fn cutoff(&self, text_count: usize) -> usize {
        self.max_chars
            .saturating_sub(self.step_chars.saturating_mul(text_count))
            .max(self.min_chars)
    }
}

/// Rows collected for one attraction before resolution
#[derive(Debug, Default)]
struct Group {
    name: String,
    city_name: Option<String>,
    /// Distinct locations with their counts, in first-seen order
    locations: Vec<(String, usize)>,
    titles: Vec<String>,
    texts: Vec<String>,
    url: Option<String>,
}

impl Group {
    fn new(name: String) -> Self {
        Self {
            name,
            ..Self::default()
        }
    }

    fn absorb(&mut self, row: &RawAttractionRow) {
        if let Some(city_name) = non_empty(row.city_name.as_deref()) {
            self.city_name = Some(city_name.to_string());
        }

        if let Some(location) = non_empty(row.location.as_deref()) {
            match self.locations.iter_mut().find(|(seen, _)| seen == location) {
                Some((_, count)) => *count += 1,
                None => self.locations.push((location.to_string(), 1)),
            }
        }

        if let Some(title) = non_empty(row.title.as_deref()) {
            self.titles.push(title.to_string());
        }
        if let Some(text) = non_empty(row.text.as_deref()) {
            self.texts.push(text.to_string());
        }

        if self.url.is_none() {
            self.url = non_empty(row.url.as_deref()).map(str::to_string);
        }
    }

    /// Most frequent location; earlier values win ties
    fn location(&self) -> String {
        let mut best: Option<&(String, usize)> = None;
        for entry in &self.locations {
            if best.is_none_or(|(_, count)| entry.1 > *count) {
                best = Some(entry);
            }
        }
        best.map(|(location, _)| location.clone()).unwrap_or_default()
    }

    fn finish(self, budget: &AggregatedTextBudget) -> AggregatedAttraction {
        let location = self.location();
        let cutoff = budget.cutoff(self.texts.len());
        AggregatedAttraction {
            name: self.name,
            city_name: self.city_name.unwrap_or_default(),
            location,
            titles: self.titles,
            texts: self
                .texts
                .into_iter()
                .map(|text| truncate_chars(text, cutoff))
                .collect(),
            url: self.url.unwrap_or_default(),
        }
    }
}

/// Groups attraction rows by name and resolves their fields
#[derive(Debug, Clone, Copy, Default)]
pub struct AttractionAggregator {
    budget: AggregatedTextBudget,
}

impl AttractionAggregator {
    #[must_use]
    pub fn new(budget: AggregatedTextBudget) -> Self {
        Self { budget }
    }

    #[must_use]
    pub fn budget(&self) -> &AggregatedTextBudget {
        &self.budget
    }

    /// Merge `rows` into one record per name, in first-seen name order.
    ///
    /// Rows without a name are skipped.
    #[must_use]
    pub fn aggregate(&self, rows: &[RawAttractionRow]) -> Vec<AggregatedAttraction> {
        let mut groups: Vec<Group> = Vec::new();
        let mut skipped = 0usize;

        for row in rows {
            let Some(name) = non_empty(row.name.as_deref()) else {
                skipped += 1;
                continue;
            };

            let index = match groups.iter().position(|group| group.name == name) {
                Some(index) => index,
                None => {
                    groups.push(Group::new(name.to_string()));
                    groups.len() - 1
                }
            };
            groups[index].absorb(row);
        }

        if skipped > 0 {
            debug!("Skipped {} attraction rows without a name", skipped);
        }

        groups
            .into_iter()
            .map(|group| group.finish(&self.budget))
            .collect()
    }
}

/// Whitespace-only values carry no content and count as missing
fn non_empty(value: Option<&str>) -> Option<&str> {
    value.filter(|v| !v.trim().is_empty())
}

/// Cut `text` to `limit` characters followed by `...` when it is longer
fn truncate_chars(text: String, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((byte_index, _)) => format!("{}...", &text[..byte_index]),
        None => text,
    }
}
