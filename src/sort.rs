use std::cmp::Ordering;

use crate::models::Record;

pub fn by_date(a: &Record, b: &Record) -> Ordering {
    a.date.cmp(&b.date)
}

pub fn by_views(a: &Record, b: &Record) -> Ordering {
    a.views.cmp(&b.views)
}

pub fn by_likes(a: &Record, b: &Record) -> Ordering {
    a.likes.cmp(&b.likes)
}

pub fn by_reposts(a: &Record, b: &Record) -> Ordering {
    a.reposts.cmp(&b.reposts)
}

/// Positive < Neutral < Negative < anything unrecognized. Unrecognized labels
/// compare equal to each other so a stable sort keeps their order.
pub fn by_sentiment(a: &Record, b: &Record) -> Ordering {
    a.sentiment.rank().cmp(&b.sentiment.rank())
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SortKey {
    Date,
    Views,
    Likes,
    Reposts,
    Sentiment,
}

impl SortKey {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "date" => Some(SortKey::Date),
            "views" => Some(SortKey::Views),
            "likes" => Some(SortKey::Likes),
            "reposts" => Some(SortKey::Reposts),
            "sentiment" => Some(SortKey::Sentiment),
            _ => None,
        }
    }

    pub fn comparator(&self) -> fn(&Record, &Record) -> Ordering {
        match self {
            SortKey::Date => by_date,
            SortKey::Views => by_views,
            SortKey::Likes => by_likes,
            SortKey::Reposts => by_reposts,
            SortKey::Sentiment => by_sentiment,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    #[default]
    Ascending,
    Descending,
}

/// Fresh, stably sorted copy of `records`.
pub fn sort_records(records: &[Record], key: SortKey, order: SortOrder) -> Vec<Record> {
    let cmp = key.comparator();
    let mut sorted = records.to_vec();
    match order {
        SortOrder::Ascending => sorted.sort_by(cmp),
        SortOrder::Descending => sorted.sort_by(|a, b| cmp(a, b).reverse()),
    }
    sorted
}
