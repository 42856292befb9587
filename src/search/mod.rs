//! Roster filtering and sorting.
//!
//! The display list is always recomputed from the full roster:
//! `sort(filter(roster, query), field, ascending)`. Rosters are small, so there
//! is no cached intermediate result.

use std::cmp::Ordering;

use icu_collator::{Collator, CollatorOptions};

use crate::models::{CandidateDetail, SortField};

/// Value a candidate exposes for a sort column.
enum SortKey<'a> {
    Text(&'a str),
    Number(i64),
}

impl SortField {
    fn key<'a>(&self, candidate: &'a CandidateDetail) -> Option<SortKey<'a>> {
        let text = |value: &'a Option<String>| value.as_deref().map(SortKey::Text);
        match self {
            SortField::Name => text(&candidate.name),
            SortField::Login => Some(SortKey::Text(&candidate.login)),
            SortField::Location => text(&candidate.location),
            SortField::Email => text(&candidate.email),
            SortField::HtmlUrl => text(&candidate.html_url),
            SortField::Company => text(&candidate.company),
            SortField::Id => Some(SortKey::Number(candidate.id)),
        }
    }

    /// Compare two candidates on this column. Pairs where either value is
    /// missing compare equal.
    fn compare(
        &self,
        collator: Option<&Collator>,
        a: &CandidateDetail,
        b: &CandidateDetail,
    ) -> Ordering {
        match (self.key(a), self.key(b)) {
            (Some(SortKey::Text(a)), Some(SortKey::Text(b))) => collate(collator, a, b),
            (Some(SortKey::Number(a)), Some(SortKey::Number(b))) => a.cmp(&b),
            _ => Ordering::Equal,
        }
    }
}

/// Root-locale collator for text columns.
fn text_collator() -> Option<Collator> {
    match Collator::try_new(&Default::default(), CollatorOptions::new()) {
        Ok(collator) => Some(collator),
        Err(e) => {
            tracing::warn!("Collation data unavailable, sorting by lowercase text: {}", e);
            None
        }
    }
}

/// Locale-aware text ordering. Without a collator, case-insensitive with a
/// case-sensitive tiebreak.
fn collate(collator: Option<&Collator>, a: &str, b: &str) -> Ordering {
    match collator {
        Some(collator) => collator.compare(a, b),
        None => a
            .to_lowercase()
            .cmp(&b.to_lowercase())
            .then_with(|| a.cmp(b)),
    }
}

/// Fields searched by the free-text filter.
fn searchable(candidate: &CandidateDetail) -> [Option<&str>; 5] {
    [
        candidate.name.as_deref(),
        Some(candidate.login.as_str()),
        candidate.location.as_deref(),
        candidate.email.as_deref(),
        candidate.company.as_deref(),
    ]
}

/// Keep candidates where any searchable field contains `query`, ignoring case.
/// An empty query keeps everything.
pub fn filter<'a>(roster: &'a [CandidateDetail], query: &str) -> Vec<&'a CandidateDetail> {
    if query.is_empty() {
        return roster.iter().collect();
    }

    let needle = query.to_lowercase();
    roster
        .iter()
        .filter(|candidate| {
            searchable(candidate)
                .into_iter()
                .flatten()
                .any(|value| value.to_lowercase().contains(&needle))
        })
        .collect()
}

/// Stable sort on `field`. Descending swaps the comparison rather than
/// reversing, so ties keep their original order either way.
pub fn sort<'a>(
    entries: Vec<&'a CandidateDetail>,
    field: SortField,
    ascending: bool,
) -> Vec<&'a CandidateDetail> {
    let collator = text_collator();
    let collator = collator.as_ref();
    merge_sort(&entries, &mut |a: &&CandidateDetail, b: &&CandidateDetail| {
        if ascending {
            field.compare(collator, a, b)
        } else {
            field.compare(collator, b, a)
        }
    })
}

// Column comparators are not total orders (a missing value equals everything),
// so this must not rely on `slice::sort_by`.
fn merge_sort<T: Copy>(items: &[T], cmp: &mut impl FnMut(&T, &T) -> Ordering) -> Vec<T> {
    if items.len() <= 1 {
        return items.to_vec();
    }

    let (left, right) = items.split_at(items.len() / 2);
    let left = merge_sort(left, cmp);
    let right = merge_sort(right, cmp);

    let mut merged = Vec::with_capacity(items.len());
    let (mut i, mut j) = (0, 0);
    while i < left.len() && j < right.len() {
        if cmp(&right[j], &left[i]) == Ordering::Less {
            merged.push(right[j]);
            j += 1;
        } else {
            merged.push(left[i]);
            i += 1;
        }
    }
    merged.extend_from_slice(&left[i..]);
    merged.extend_from_slice(&right[j..]);
    merged
}

/// Query and sort state for the saved-candidates table.
#[derive(Debug, Clone)]
pub struct RosterView {
    query: String,
    sort_field: Option<SortField>,
    ascending: bool,
}

impl Default for RosterView {
    fn default() -> Self {
        Self {
            query: String::new(),
            sort_field: None,
            ascending: true,
        }
    }
}

impl RosterView {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn sort_field(&self) -> Option<SortField> {
        self.sort_field
    }

    pub fn ascending(&self) -> bool {
        self.ascending
    }

    pub fn set_query(&mut self, query: impl Into<String>) {
        self.query = query.into();
    }

    /// Select `field`; selecting the active field again flips the direction.
    pub fn toggle_sort(&mut self, field: SortField) {
        if self.sort_field == Some(field) {
            self.ascending = !self.ascending;
        } else {
            self.sort_field = Some(field);
            self.ascending = true;
        }
    }

    /// Back to insertion order.
    pub fn clear_sort(&mut self) {
        self.sort_field = None;
        self.ascending = true;
    }

    /// Filtered and sorted copy of `roster`.
    pub fn display(&self, roster: &[CandidateDetail]) -> Vec<CandidateDetail> {
        let matched = filter(roster, &self.query);
        let ordered = match self.sort_field {
            Some(field) => sort(matched, field, self.ascending),
            None => matched,
        };
        ordered.into_iter().cloned().collect()
    }
}
