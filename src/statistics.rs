//! Alphabetic character frequency statistics.
//!
//! [`Statistics`] maps a lowercase alphabetic character to its count. Entries keep
//! the order in which each character was first recorded; equality ignores that
//! order, so [`merge`] is commutative as a map even though the enumeration order of
//! `merge(a, b)` and `merge(b, a)` can differ.
//!
//! A character counts when its Unicode general category is a letter (`Lu`, `Ll`,
//! `Lt`, `Lm` or `Lo`). Combining marks, letter numbers such as `Ⅻ` and symbols
//! such as `ⓐ` are not counted, even though [`char::is_alphabetic`] accepts them.
//! Input is lowercased per character before classification, so counting raw or
//! sanitized text gives the same result.

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use unicode_general_category::{get_general_category, GeneralCategory};

/// Character → count mapping in first-occurrence order.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Statistics {
    counts: IndexMap<char, u64>,
}

impl Statistics {
    /// The empty mapping; identity element of [`merge`].
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Add `n` occurrences of `c`. Zero adds are ignored so that no entry ever
    /// holds a zero count.
    pub fn add(&mut self, c: char, n: u64) {
        if n == 0 {
            return;
        }
        *self.counts.entry(c).or_insert(0) += n;
    }

    /// Count every alphabetic character of `text` into `self`.
    pub fn record(&mut self, text: &str) {
        for c in text.chars().flat_map(char::to_lowercase) {
            if is_letter(c) {
                self.add(c, 1);
            }
        }
    }

    /// Fold `other` into `self`, keeping `self`'s entries first.
    pub fn merge_from(&mut self, other: Statistics) {
        if self.counts.is_empty() {
            self.counts = other.counts;
            return;
        }
        for (c, n) in other.counts {
            self.add(c, n);
        }
    }

    #[must_use]
    pub fn get(&self, c: char) -> u64 {
        self.counts.get(&c).copied().unwrap_or(0)
    }

    /// Sum of all counts.
    #[must_use]
    pub fn total(&self) -> u64 {
        self.counts.values().sum()
    }

    /// Number of distinct characters.
    #[must_use]
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// `(char, count)` pairs in first-occurrence order.
    pub fn iter(&self) -> impl Iterator<Item = (char, u64)> + '_ {
        self.counts.iter().map(|(c, n)| (*c, *n))
    }
}

impl FromIterator<(char, u64)> for Statistics {
    fn from_iter<I: IntoIterator<Item = (char, u64)>>(iter: I) -> Self {
        let mut s = Statistics::new();
        for (c, n) in iter {
            s.add(c, n);
        }
        s
    }
}

impl<'a> IntoIterator for &'a Statistics {
    type Item = (&'a char, &'a u64);
    type IntoIter = indexmap::map::Iter<'a, char, u64>;

    fn into_iter(self) -> Self::IntoIter {
        self.counts.iter()
    }
}

/// Whether `c` belongs to one of the Unicode letter categories.
#[must_use]
pub fn is_letter(c: char) -> bool {
    matches!(
        get_general_category(c),
        GeneralCategory::UppercaseLetter
            | GeneralCategory::LowercaseLetter
            | GeneralCategory::TitlecaseLetter
            | GeneralCategory::ModifierLetter
            | GeneralCategory::OtherLetter
    )
}

/// Statistics of a single chunk.
#[must_use]
pub fn count_alphabetic(chunk: &str) -> Statistics {
    let mut s = Statistics::new();
    s.record(chunk);
    s
}

/// Elementwise sum of two statistics.
#[must_use]
pub fn merge(mut a: Statistics, b: Statistics) -> Statistics {
    a.merge_from(b);
    a
}
