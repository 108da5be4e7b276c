use unicode_normalization::UnicodeNormalization;

use crate::models::{DateRange, FilterState, Record, RecordDate};

fn fold(s: &str) -> String {
    s.nfc().collect::<String>().to_lowercase()
}

/// Records passing every active predicate, in their original order.
///
/// Predicates are AND-combined: title search (case-insensitive substring),
/// exact source match unless `All`, and an inclusive date range when both
/// bounds are set. The input is never modified.
pub fn apply(records: &[Record], filters: &FilterState) -> Vec<Record> {
    let needle = fold(&filters.search);

    records
        .iter()
        .filter(|r| needle.is_empty() || fold(&r.title).contains(&needle))
        .filter(|r| filters.source.matches(&r.source_type))
        .filter(|r| match &filters.date_range {
            Some(range) => in_range(&r.date, range),
            None => true,
        })
        .cloned()
        .collect()
}

fn in_range(date: &RecordDate, range: &DateRange) -> bool {
    range.contains(date.date())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Sentiment, SourceFilter, SourceType};
    use chrono::NaiveDate;

    fn rec(id: &str, title: &str, source: SourceType, y: i32, m: u32, d: u32) -> Record {
        Record {
            id: id.into(),
            title: title.into(),
            source_type: source,
            date: RecordDate::from_ymd(y, m, d).unwrap(),
            views: 10,
            likes: 1,
            reposts: 0,
            engagement: 0.1,
            sentiment: Sentiment::Neutral,
            link: None,
        }
    }

    fn sample() -> Vec<Record> {
        vec![
            rec("a", "МТС запускает 5G", SourceType::Telegram, 2024, 1, 5),
            rec("b", "Обзор тарифов", SourceType::Vk, 2024, 1, 10),
            rec("c", "мтс и ИИ", SourceType::Habr, 2024, 2, 1),
            rec("d", "Stream recap", SourceType::Youtube, 2023, 12, 31),
        ]
    }

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    fn ids(records: &[Record]) -> Vec<&str> {
        records.iter().map(|r| r.id.as_str()).collect()
    }

    #[test]
    fn test_default_filters_are_identity() {
        let records = sample();
        assert_eq!(apply(&records, &FilterState::default()), records);
    }

    #[test]
    fn test_empty_input() {
        let f = FilterState::default().with_search("x");
        assert!(apply(&[], &f).is_empty());
    }

    #[test]
    fn test_search_is_case_insensitive_for_cyrillic() {
        let f = FilterState::default().with_search("МТС");
        assert_eq!(ids(&apply(&sample(), &f)), vec!["a", "c"]);
    }

    #[test]
    fn test_source_filter() {
        let f = FilterState::default().with_source(SourceFilter::Only(SourceType::Vk));
        assert_eq!(ids(&apply(&sample(), &f)), vec!["b"]);
    }

    #[test]
    fn test_date_range_is_inclusive() {
        let f = FilterState::default()
            .with_date_range(Some(DateRange::new(day(2024, 1, 5), day(2024, 1, 10))));
        assert_eq!(ids(&apply(&sample(), &f)), vec!["a", "b"]);
    }

    #[test]
    fn test_inverted_range_matches_nothing() {
        let f = FilterState::default()
            .with_date_range(Some(DateRange::new(day(2024, 2, 1), day(2024, 1, 1))));
        assert!(apply(&sample(), &f).is_empty());
    }

    #[test]
    fn test_predicates_combine() {
        let f = FilterState::default()
            .with_search("мтс")
            .with_source(SourceFilter::Only(SourceType::Habr))
            .with_date_range(Some(DateRange::new(day(2024, 1, 1), day(2024, 12, 31))));
        assert_eq!(ids(&apply(&sample(), &f)), vec!["c"]);
    }

    #[test]
    fn test_filter_is_idempotent() {
        let f = FilterState::default()
            .with_search("т")
            .with_date_range(Some(DateRange::new(day(2024, 1, 1), day(2024, 1, 31))));
        let once = apply(&sample(), &f);
        assert_eq!(apply(&once, &f), once);
    }
}
