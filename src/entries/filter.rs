//! Derived views over an entry collection

use std::collections::HashSet;

use super::Entry;

/// Drop entries whose id was already seen. First occurrence wins and the
/// relative order is kept.
pub fn dedup_by_id(entries: Vec<Entry>) -> Vec<Entry> {
    let mut seen = HashSet::with_capacity(entries.len());
    entries
        .into_iter()
        .filter(|entry| seen.insert(entry.id.clone()))
        .collect()
}

/// Whether `query` occurs in the entry's title, text or date, ignoring case.
/// An empty query matches everything.
pub fn matches_query(entry: &Entry, query: &str) -> bool {
    let query = query.to_lowercase();
    [&entry.title, &entry.text, &entry.date]
        .iter()
        .any(|field| field.to_lowercase().contains(&query))
}

/// The entries matching `query`, in their original order
pub fn filter_entries(entries: &[Entry], query: &str) -> Vec<Entry> {
    entries
        .iter()
        .filter(|entry| matches_query(entry, query))
        .cloned()
        .collect()
}

/// Newest first: by date, then by creation time. Ties keep their order.
pub fn sort_newest_first(entries: &mut [Entry]) {
    entries.sort_by(|a, b| {
        b.date
            .cmp(&a.date)
            .then_with(|| b.created_at.cmp(&a.created_at))
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::EntryId;

    fn entry(id: i64, title: &str, text: &str, date: &str) -> Entry {
        Entry {
            id: EntryId::from(id),
            title: title.to_string(),
            text: text.to_string(),
            date: date.to_string(),
            created_at: None,
            mood_analysis: None,
        }
    }

    #[test]
    fn test_dedup_keeps_first_occurrence_in_order() {
        let entries = vec![
            entry(3, "first three", "", "2025-01-03"),
            entry(1, "one", "", "2025-01-01"),
            entry(3, "second three", "", "2025-01-03"),
            entry(2, "two", "", "2025-01-02"),
            entry(1, "one again", "", "2025-01-01"),
        ];

        let unique = dedup_by_id(entries);
        let titles: Vec<_> = unique.iter().map(|e| e.title.as_str()).collect();
        assert_eq!(titles, vec!["first three", "one", "two"]);
    }

    #[test]
    fn test_query_matches_any_field_ignoring_case() {
        let e = entry(1, "Beach Day", "Sunny and WARM", "2025-07-04");

        assert!(matches_query(&e, "beach"));
        assert!(matches_query(&e, "warm"));
        assert!(matches_query(&e, "07-04"));
        assert!(matches_query(&e, ""));
        assert!(!matches_query(&e, "snow"));
    }

    #[test]
    fn test_filter_does_not_touch_source() {
        let entries = vec![
            entry(1, "Work", "long meeting", "2025-03-01"),
            entry(2, "Gym", "leg day", "2025-03-02"),
            entry(3, "Dinner", "met friends after work", "2025-03-03"),
        ];

        let hits = filter_entries(&entries, "WORK");
        let ids: Vec<_> = hits.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["1", "3"]);
        assert_eq!(entries.len(), 3);
    }

    #[test]
    fn test_sort_newest_first_is_stable() {
        let mut entries = vec![
            entry(1, "a", "", "2025-01-01"),
            entry(2, "b", "", "2025-03-01"),
            entry(3, "c", "", "2025-01-01"),
        ];

        sort_newest_first(&mut entries);
        let ids: Vec<_> = entries.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["2", "1", "3"]);
    }
}
