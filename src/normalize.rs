use chrono::{DateTime, Local, NaiveDate};
use chrono_tz::Tz;
use once_cell::sync::Lazy;
use regex::Regex;
use serde_json::Value;
use std::sync::atomic::{AtomicU64, Ordering};
use tracing::{debug, info};
use uuid::Uuid;

use crate::api_types::ApiItem;
use crate::models::{Record, RecordDate, Sentiment, SourceType, UNTITLED};

/// Numbers above this are epoch milliseconds; anything smaller is not a
/// plausible post date in millis.
pub const EPOCH_MILLIS_THRESHOLD: i64 = 1_000_000_000_000;

/// Date assigned when the feed value is neither epoch millis nor ISO.
pub fn fallback_date() -> RecordDate {
    RecordDate::new(NaiveDate::from_ymd_opt(2024, 1, 1).unwrap_or_default())
}

static ISO_PREFIX: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^\s*(\d{4})-(\d{1,2})-(\d{1,2})").unwrap());

/// Keys that name the source column, tried before the per-source rules apply.
const SOURCE_KEYS: &[&str] = &["Источник", "source", "type"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountStyle {
    /// Numbers or plain numeric strings ("120").
    Plain,
    /// Also accepts scraped counters such as "1.5k", "+10", "2,3m".
    Abbreviated,
}

/// Where each canonical field lives in one source's raw `fields` map.
#[derive(Debug, Clone, Copy)]
pub struct FieldRules {
    pub title: &'static [&'static str],
    pub date: &'static [&'static str],
    pub views: &'static [&'static str],
    pub likes: &'static [&'static str],
    pub reposts: &'static [&'static str],
    pub engagement: &'static [&'static str],
    pub sentiment: &'static [&'static str],
    pub link: &'static [&'static str],
    pub counts: CountStyle,
}

pub const DEFAULT_RULES: FieldRules = FieldRules {
    title: &["Название", "title"],
    date: &["Дата", "date"],
    views: &["Просмотры", "views"],
    likes: &["Лайки", "likes"],
    reposts: &["Репосты", "reposts"],
    engagement: &["engagement"],
    sentiment: &["Тональность", "sentiment"],
    link: &["Ссылка", "link"],
    counts: CountStyle::Plain,
};

// Habr counters are scraped from page text.
const HABR_RULES: FieldRules = FieldRules {
    counts: CountStyle::Abbreviated,
    ..DEFAULT_RULES
};

static RULE_TABLE: &[(SourceType, FieldRules)] = &[
    (SourceType::Telegram, DEFAULT_RULES),
    (SourceType::Vk, DEFAULT_RULES),
    (SourceType::Youtube, DEFAULT_RULES),
    (SourceType::Rutube, DEFAULT_RULES),
    (SourceType::Habr, HABR_RULES),
];

/// Extraction rules for a source; unknown sources use the defaults.
pub fn rules_for(source: &SourceType) -> &'static FieldRules {
    RULE_TABLE
        .iter()
        .find(|(s, _)| s == source)
        .map(|(_, rules)| rules)
        .unwrap_or(&DEFAULT_RULES)
}

#[derive(Debug, Default)]
struct NormalizeStats {
    generated_ids: usize,
    fallback_dates: usize,
    unmapped_sources: usize,
    defaulted_fields: usize,
}

/// Turns raw feed items into canonical records. Never fails: every malformed
/// field degrades to its default.
#[derive(Debug, Default)]
pub struct Normalizer {
    tz: Option<Tz>,
    seq: AtomicU64,
}

impl Normalizer {
    pub fn new() -> Self {
        Self::default()
    }

    /// Derive calendar days in `tz` instead of the system local zone.
    pub fn with_timezone(tz: Tz) -> Self {
        Self {
            tz: Some(tz),
            seq: AtomicU64::new(0),
        }
    }

    pub fn normalize(&self, raw: &ApiItem) -> Record {
        let mut stats = NormalizeStats::default();
        self.normalize_with_stats(raw, &mut stats)
    }

    pub fn normalize_all(&self, items: &[ApiItem]) -> Vec<Record> {
        let mut stats = NormalizeStats::default();
        let records: Vec<Record> = items
            .iter()
            .map(|item| self.normalize_with_stats(item, &mut stats))
            .collect();

        info!(
            "Normalization completed - records={}, generated_ids={}, fallback_dates={}, unmapped_sources={}, defaulted_fields={}",
            records.len(),
            stats.generated_ids,
            stats.fallback_dates,
            stats.unmapped_sources,
            stats.defaulted_fields
        );
        records
    }

    fn normalize_with_stats(&self, raw: &ApiItem, stats: &mut NormalizeStats) -> Record {
        let source_type = raw
            .field(SOURCE_KEYS)
            .and_then(Value::as_str)
            .map(SourceType::parse)
            .unwrap_or_default();
        if matches!(source_type, SourceType::Unknown | SourceType::Other(_)) {
            stats.unmapped_sources += 1;
            debug!("No field rules for source '{}', using defaults", source_type);
        }
        let rules = rules_for(&source_type);

        let id = raw.id_string().unwrap_or_else(|| {
            stats.generated_ids += 1;
            self.next_id()
        });

        let date = match self.parse_date(raw.field(rules.date)) {
            Some(d) => d,
            None => {
                stats.fallback_dates += 1;
                debug!("Unusable date for record {} - value={:?}", id, raw.field(rules.date));
                fallback_date()
            }
        };

        let mut count = |keys: &[&str], name: &str| -> u64 {
            match raw.field(keys) {
                None => 0,
                Some(v) => parse_count(v, rules.counts).unwrap_or_else(|| {
                    stats.defaulted_fields += 1;
                    debug!("Malformed {} for record {} - value={}", name, id, v);
                    0
                }),
            }
        };
        let views = count(rules.views, "views");
        let likes = count(rules.likes, "likes");
        let reposts = count(rules.reposts, "reposts");

        let engagement = match raw.field(rules.engagement) {
            None => 0.0,
            Some(v) => parse_ratio(v).unwrap_or_else(|| {
                stats.defaulted_fields += 1;
                debug!("Malformed engagement for record {} - value={}", id, v);
                0.0
            }),
        };

        let title = match raw.field(rules.title) {
            Some(Value::String(s)) if !s.trim().is_empty() => s.trim().to_string(),
            Some(Value::Number(n)) => n.to_string(),
            _ => UNTITLED.to_string(),
        };

        let sentiment = raw
            .field(rules.sentiment)
            .and_then(Value::as_str)
            .map(Sentiment::parse)
            .unwrap_or_default();

        let link = raw
            .field(rules.link)
            .and_then(Value::as_str)
            .map(str::trim)
            .filter(|s| !s.is_empty())
            .map(str::to_string);

        Record {
            id,
            title,
            source_type,
            date,
            views,
            likes,
            reposts,
            engagement,
            sentiment,
            link,
        }
    }

    /// Epoch millis first (some sources send numbers), then ISO strings.
    pub fn parse_date(&self, value: Option<&Value>) -> Option<RecordDate> {
        match value? {
            Value::Number(n) => {
                let millis = n
                    .as_i64()
                    .or_else(|| n.as_f64().filter(|f| f.is_finite()).map(|f| f as i64))?;
                if millis > EPOCH_MILLIS_THRESHOLD {
                    self.local_day(millis).map(RecordDate::new)
                } else {
                    None
                }
            }
            Value::String(s) => {
                let caps = ISO_PREFIX.captures(s)?;
                let year = caps[1].parse().ok()?;
                let month = caps[2].parse().ok()?;
                let day = caps[3].parse().ok()?;
                RecordDate::from_ymd(year, month, day)
            }
            _ => None,
        }
    }

    fn local_day(&self, millis: i64) -> Option<NaiveDate> {
        let utc = DateTime::from_timestamp_millis(millis)?;
        Some(match self.tz {
            Some(tz) => utc.with_timezone(&tz).date_naive(),
            None => utc.with_timezone(&Local).date_naive(),
        })
    }

    fn next_id(&self) -> String {
        let seq = self.seq.fetch_add(1, Ordering::Relaxed);
        let millis = chrono::Utc::now().timestamp_millis();
        let salt = Uuid::new_v4().simple().to_string();
        format!("record_{}_{}_{}", millis, seq, &salt[..8])
    }
}

/// Non-negative counter from a raw value. Negative numbers clamp to zero;
/// anything unparseable is `None`.
pub fn parse_count(value: &Value, style: CountStyle) -> Option<u64> {
    match value {
        Value::Number(n) => {
            if let Some(u) = n.as_u64() {
                Some(u)
            } else if n.as_i64().is_some() {
                Some(0)
            } else {
                n.as_f64().filter(|f| f.is_finite()).map(clamp_count)
            }
        }
        Value::String(s) => {
            let trimmed = s.trim();
            if trimmed.is_empty() {
                return Some(0);
            }
            match style {
                CountStyle::Plain => trimmed.parse::<f64>().ok().filter(|f| f.is_finite()).map(clamp_count),
                CountStyle::Abbreviated => parse_abbreviated(trimmed),
            }
        }
        _ => None,
    }
}

fn parse_abbreviated(s: &str) -> Option<u64> {
    let cleaned = s.replace('+', "").replace(',', ".").to_lowercase();
    let cleaned = cleaned.trim();
    let (digits, scale) = if let Some(rest) = cleaned.strip_suffix('k') {
        (rest, 1_000.0)
    } else if let Some(rest) = cleaned.strip_suffix('m') {
        (rest, 1_000_000.0)
    } else {
        (cleaned, 1.0)
    };
    digits
        .trim()
        .parse::<f64>()
        .ok()
        .filter(|f| f.is_finite())
        .map(|f| clamp_count(f * scale))
}

fn clamp_count(f: f64) -> u64 {
    if f <= 0.0 {
        0
    } else {
        f.trunc() as u64
    }
}

fn parse_ratio(value: &Value) -> Option<f64> {
    let f = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    f.is_finite().then(|| f.clamp(0.0, 1.0))
}
