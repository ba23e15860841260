use std::collections::BTreeMap;

use serde::Serialize;

/// Value counts for a categorical column.
///
/// Keys that are empty after trimming are never recorded, so a table built
/// from sparse export columns only ever holds real categories.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FrequencyTable {
    counts: BTreeMap<String, usize>,
}

impl FrequencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, key: &str) {
        self.add_n(key, 1);
    }

    pub fn add_n(&mut self, key: &str, count: usize) {
        if key.trim().is_empty() || count == 0 {
            return;
        }
        *self.counts.entry(key.to_string()).or_insert(0) += count;
    }

    pub fn get(&self, key: &str) -> usize {
        self.counts.get(key).copied().unwrap_or(0)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.counts.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Sum of all counts.
    pub fn total(&self) -> usize {
        self.counts.values().sum()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, usize)> {
        self.counts.iter().map(|(key, count)| (key.as_str(), *count))
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.counts.keys().map(String::as_str)
    }

    /// Entries ordered by count descending, then key ascending.
    pub fn sorted_desc(&self) -> Vec<(String, usize)> {
        let mut items = self
            .counts
            .iter()
            .map(|(key, count)| (key.clone(), *count))
            .collect::<Vec<_>>();
        items.sort_by(|a, b| b.1.cmp(&a.1).then_with(|| a.0.cmp(&b.0)));
        items
    }

    pub fn top(&self, limit: usize) -> Vec<(String, usize)> {
        let mut items = self.sorted_desc();
        items.truncate(limit);
        items
    }
}

impl<'a> FromIterator<&'a str> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = &'a str>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for key in iter {
            table.add(key);
        }
        table
    }
}

impl FromIterator<String> for FrequencyTable {
    fn from_iter<I: IntoIterator<Item = String>>(iter: I) -> Self {
        let mut table = FrequencyTable::new();
        for key in iter {
            table.add(&key);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn blank_keys_are_ignored() {
        let table = ["Alumni", "", "  ", "Parent", "Alumni"]
            .into_iter()
            .collect::<FrequencyTable>();
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("Alumni"), 2);
        assert_eq!(table.get(""), 0);
        assert_eq!(table.total(), 3);
    }

    #[test]
    fn sorted_desc_breaks_ties_by_key() {
        let table = ["b", "a", "c", "c"].into_iter().collect::<FrequencyTable>();
        assert_eq!(
            table.sorted_desc(),
            vec![
                ("c".to_string(), 2),
                ("a".to_string(), 1),
                ("b".to_string(), 1)
            ]
        );
        assert_eq!(table.top(1), vec![("c".to_string(), 2)]);
    }

    proptest! {
        #[test]
        fn tables_never_hold_blank_keys(values in proptest::collection::vec("[ a-c]{0,3}", 0..40)) {
            let table = values.iter().map(String::as_str).collect::<FrequencyTable>();
            prop_assert!(table.keys().all(|key| !key.trim().is_empty()));
            let expected = values.iter().filter(|v| !v.trim().is_empty()).count();
            prop_assert_eq!(table.total(), expected);
        }
    }
}
