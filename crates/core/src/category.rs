//! Patient fee categories.
//!
//! A category is free text chosen on the enrollment form. Whether it waives scan charges is
//! decided by exact, case-sensitive membership in the configured exempt list: `"rghs"` and
//! `" RGHS"` are ordinary paying categories.

use crate::constants::{DEFAULT_EXEMPT_CATEGORIES, KNOWN_CATEGORIES};
use serde::Serialize;
use std::collections::BTreeSet;

/// A category label together with its resolved exemption.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct Category {
    pub name: String,
    pub is_fee_exempt: bool,
}

/// The exempt-category lookup shared by every consumer.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CategoryTable {
    exempt: BTreeSet<String>,
    known: Vec<String>,
}

impl Default for CategoryTable {
    fn default() -> Self {
        Self::new(DEFAULT_EXEMPT_CATEGORIES.iter().map(|s| (*s).to_owned()))
    }
}

impl CategoryTable {
    /// Builds a table with the given exempt labels.
    ///
    /// Display order starts with [`KNOWN_CATEGORIES`]; exempt labels not in that list are
    /// appended so they can still be chosen.
    pub fn new(exempt: impl IntoIterator<Item = String>) -> Self {
        let exempt: BTreeSet<String> = exempt.into_iter().collect();
        let mut known: Vec<String> = KNOWN_CATEGORIES.iter().map(|s| (*s).to_owned()).collect();
        for label in &exempt {
            if !known.contains(label) {
                known.push(label.clone());
            }
        }
        Self { exempt, known }
    }

    pub fn is_exempt(&self, category_name: &str) -> bool {
        self.exempt.contains(category_name)
    }

    pub fn category(&self, name: &str) -> Category {
        Category {
            name: name.to_owned(),
            is_fee_exempt: self.is_exempt(name),
        }
    }

    /// Known categories in display order, with their exemption flag.
    pub fn categories(&self) -> Vec<Category> {
        self.known.iter().map(|name| self.category(name)).collect()
    }

    pub fn exempt_labels(&self) -> impl Iterator<Item = &str> {
        self.exempt.iter().map(String::as_str)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_table_exempts_listed_categories() {
        let table = CategoryTable::default();
        for label in DEFAULT_EXEMPT_CATEGORIES {
            assert!(table.is_exempt(label), "{label} should be exempt");
        }
        assert!(!table.is_exempt("GEN / Paid"));
    }

    #[test]
    fn match_is_exact_and_case_sensitive() {
        let table = CategoryTable::default();
        assert!(!table.is_exempt("rghs"));
        assert!(!table.is_exempt(" RGHS"));
        assert!(!table.is_exempt("RGHS "));
        assert!(!table.is_exempt("Sn. Citizen"));
        assert!(!table.is_exempt(""));
        assert!(!table.is_exempt("walk-in"));
    }

    #[test]
    fn override_replaces_exempt_set() {
        let table = CategoryTable::new(["PRISONER".to_owned(), "RTA".to_owned()]);
        assert!(table.is_exempt("PRISONER"));
        assert!(table.is_exempt("RTA"));
        assert!(!table.is_exempt("RGHS"));
    }

    #[test]
    fn categories_lists_known_then_extra_exempt_labels() {
        let table = CategoryTable::new(["Aayushmaan".to_owned(), "RTA".to_owned()]);
        let categories = table.categories();

        assert_eq!(categories.first().map(|c| c.name.as_str()), Some("GEN / Paid"));
        assert_eq!(
            categories.last(),
            Some(&Category {
                name: "Aayushmaan".into(),
                is_fee_exempt: true
            })
        );
        let rghs = categories
            .iter()
            .find(|c| c.name == "RGHS")
            .expect("RGHS is a known category");
        assert!(!rghs.is_fee_exempt);
    }
}
