//! Category registry
//!
//! Maps category names to enabled states driven by the controller's keyword.
//!
//! The key set is fixed when the registry is seeded: one slot per filtered
//! category followed by the two catch-all slots. Only slot values change
//! afterwards, so the name index is immutable and every slot is an
//! `AtomicBool`. One writer (the serialized enable callback) stores into the
//! slots while any number of event threads load from them without a lock.
//! A reader racing a decode pass may see some categories with their old
//! value and some with their new value; it never sees a missing key.

use super::keyword::{
    KeywordChange, DISABLED_OTHER_EVENTS_KEYWORD_BIT, OTHER_EVENTS_KEYWORD_BIT,
    RESERVED_KEYWORD_BIT,
};
use super::{
    DISABLED_BY_DEFAULT_PREFIX, DISABLED_OTHER_EVENTS_CATEGORY, MAX_FILTERED_CATEGORIES,
    OTHER_EVENTS_CATEGORY, SYNTHETIC_CATEGORY_COUNT,
};
use crate::types::{ExportError, Keyword, Result};
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};

/// Name → enabled state for every category the keyword can address
#[derive(Debug)]
pub struct CategoryRegistry {
    /// Slot names: filtered categories in bit order, then the catch-alls
    names: Vec<String>,
    /// Immutable after seeding
    index: HashMap<String, usize>,
    states: Box<[AtomicBool]>,
    /// Most recently applied keyword
    last_keyword: AtomicU64,
}

impl CategoryRegistry {
    /// Seed a registry with every category disabled
    ///
    /// # Panics
    /// If the names are duplicated, shadow a catch-all name, or do not fit
    /// below the catch-all bits. Callers validate names through
    /// [`ExportConfig::validate`](crate::ExportConfig::validate) first.
    pub fn seed<S: AsRef<str>>(filtered_categories: &[S]) -> Self {
        assert!(
            filtered_categories.len() <= MAX_FILTERED_CATEGORIES,
            "too many filtered categories: {}",
            filtered_categories.len()
        );

        let mut names: Vec<String> = filtered_categories
            .iter()
            .map(|name| name.as_ref().to_string())
            .collect();
        names.push(OTHER_EVENTS_CATEGORY.to_string());
        names.push(DISABLED_OTHER_EVENTS_CATEGORY.to_string());

        let index: HashMap<String, usize> = names
            .iter()
            .enumerate()
            .map(|(slot, name)| (name.clone(), slot))
            .collect();

        let states = names.iter().map(|_| AtomicBool::new(false)).collect();

        let registry = Self {
            names,
            index,
            states,
            last_keyword: AtomicU64::new(0),
        };
        registry.check_size();

        log::debug!(
            "Seeded category registry with {} categories",
            registry.category_count()
        );
        registry
    }

    /// Total number of categories, including the two catch-alls
    pub fn category_count(&self) -> usize {
        self.filtered_count() + SYNTHETIC_CATEGORY_COUNT
    }

    /// Number of categories with a dedicated keyword bit
    pub fn filtered_count(&self) -> usize {
        self.names.len() - SYNTHETIC_CATEGORY_COUNT
    }

    /// Filtered category names in bit order
    pub fn filtered_categories(&self) -> impl Iterator<Item = &str> {
        self.names[..self.filtered_count()].iter().map(String::as_str)
    }

    /// The most recently applied keyword (0 before the first change)
    pub fn last_keyword(&self) -> Keyword {
        self.last_keyword.load(Ordering::Relaxed)
    }

    /// Apply a keyword from the controller
    ///
    /// Must only be called from one context at a time; readers may run
    /// concurrently.
    pub fn decode(&self, keyword: Keyword) -> KeywordChange {
        if self.last_keyword.load(Ordering::Relaxed) == keyword {
            return KeywordChange::Unchanged;
        }
        self.last_keyword.store(keyword, Ordering::Relaxed);

        let filtered = self.filtered_count();
        for bit in 0..filtered {
            self.states[bit].store(keyword & (1 << bit) != 0, Ordering::Relaxed);
        }

        // Catch-alls live right after the filtered slots
        self.states[filtered].store(keyword & OTHER_EVENTS_KEYWORD_BIT != 0, Ordering::Relaxed);
        self.states[filtered + 1].store(
            keyword & DISABLED_OTHER_EVENTS_KEYWORD_BIT != 0,
            Ordering::Relaxed,
        );

        self.check_size();
        KeywordChange::Changed
    }

    /// Check whether a single category is enabled
    ///
    /// Names without a slot fall back to one of the catch-alls, depending on
    /// whether they carry the disabled-by-default prefix.
    pub fn is_enabled(&self, category: &str) -> bool {
        if let Some(&slot) = self.index.get(category) {
            return self.states[slot].load(Ordering::Relaxed);
        }

        let fallback = if category.starts_with(DISABLED_BY_DEFAULT_PREFIX) {
            self.filtered_count() + 1
        } else {
            self.filtered_count()
        };
        self.states[fallback].load(Ordering::Relaxed)
    }

    /// Current state of every category, in slot order
    pub fn snapshot(&self) -> Vec<(String, bool)> {
        self.names
            .iter()
            .zip(self.states.iter())
            .map(|(name, state)| (name.clone(), state.load(Ordering::Relaxed)))
            .collect()
    }

    /// Names of the categories currently enabled
    pub fn enabled_categories(&self) -> Vec<&str> {
        self.names
            .iter()
            .zip(self.states.iter())
            .filter(|(_, state)| state.load(Ordering::Relaxed))
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Build the keyword a controller must pass to enable `categories`
    ///
    /// The reserved bit is always included. Catch-alls are selected by their
    /// synthetic names.
    pub fn keyword_for<I, S>(&self, categories: I) -> Result<Keyword>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let filtered = self.filtered_count();
        let mut keyword = RESERVED_KEYWORD_BIT;

        for category in categories {
            let category = category.as_ref();
            let slot = self
                .index
                .get(category)
                .copied()
                .ok_or_else(|| ExportError::UnknownCategory(category.to_string()))?;

            keyword |= if slot < filtered {
                1 << slot
            } else if slot == filtered {
                OTHER_EVENTS_KEYWORD_BIT
            } else {
                DISABLED_OTHER_EVENTS_KEYWORD_BIT
            };
        }

        Ok(keyword)
    }

    fn check_size(&self) {
        assert_eq!(
            self.index.len(),
            self.category_count(),
            "category registry size changed"
        );
        assert_eq!(self.states.len(), self.category_count());
    }
}
