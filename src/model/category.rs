use indexmap::IndexSet;
use serde::{Deserialize, Serialize};

/// Label given to new items when no category is supplied
pub const DEFAULT_CATEGORY: &str = "Personal";

/// Seed labels, in display order
pub const DEFAULT_CATEGORIES: [&str; 5] = ["Personal", "Work", "Shopping", "Health", "Other"];

/// Ordered set of known category labels.
///
/// Iteration order is insertion order; stats output follows it.
/// Serialized as a plain list. Labels read back go through `insert`, so
/// blanks and duplicates in a hand-edited config are dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(from = "Vec<String>", into = "Vec<String>")]
pub struct CategorySet {
    labels: IndexSet<String>,
}

impl CategorySet {
    pub fn new() -> Self {
        CategorySet {
            labels: IndexSet::new(),
        }
    }

    /// Insert a label. Returns false for blanks and duplicates.
    pub fn insert(&mut self, label: &str) -> bool {
        let label = label.trim();
        if label.is_empty() {
            return false;
        }
        self.labels.insert(label.to_string())
    }

    pub fn contains(&self, label: &str) -> bool {
        self.labels.contains(label)
    }

    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.labels.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

impl Default for CategorySet {
    fn default() -> Self {
        DEFAULT_CATEGORIES.iter().copied().collect()
    }
}

impl<'a> FromIterator<&'a str> for CategorySet {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut set = CategorySet::new();
        for label in iter {
            set.insert(label);
        }
        set
    }
}

impl From<Vec<String>> for CategorySet {
    fn from(labels: Vec<String>) -> Self {
        labels.iter().map(String::as_str).collect()
    }
}

impl From<CategorySet> for Vec<String> {
    fn from(set: CategorySet) -> Self {
        set.labels.into_iter().collect()
    }
}
