use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// Title used when a feed item carries none.
pub const UNTITLED: &str = "Без названия";

/// Canonical date format for display and sorting.
pub const DATE_FORMAT: &str = "%d-%m-%Y";

/// Calendar day of a record. Stored as a real date, rendered `DD-MM-YYYY`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RecordDate(NaiveDate);

impl RecordDate {
    pub fn new(date: NaiveDate) -> Self {
        Self(date)
    }

    pub fn from_ymd(year: i32, month: u32, day: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, day).map(Self)
    }

    /// Parse the canonical `DD-MM-YYYY` form.
    pub fn parse(s: &str) -> Option<Self> {
        NaiveDate::parse_from_str(s.trim(), DATE_FORMAT).ok().map(Self)
    }

    pub fn date(&self) -> NaiveDate {
        self.0
    }

    /// ISO `YYYY-MM-DD`, used when talking to date pickers or logs.
    pub fn to_iso(&self) -> String {
        format!("{:04}-{:02}-{:02}", self.0.year(), self.0.month(), self.0.day())
    }
}

impl fmt::Display for RecordDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}-{:02}-{:04}", self.0.day(), self.0.month(), self.0.year())
    }
}

impl Serialize for RecordDate {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordDate {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        RecordDate::parse(&s)
            .ok_or_else(|| serde::de::Error::custom(format!("expected DD-MM-YYYY date, got '{s}'")))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum SourceType {
    Telegram,
    Vk,
    Youtube,
    Rutube,
    Habr,
    #[default]
    Unknown,
    /// Lowercased source name the registry has no rules for.
    Other(String),
}

impl SourceType {
    pub fn parse(raw: &str) -> Self {
        let lowered = raw.trim().to_lowercase();
        match lowered.as_str() {
            "" | "unknown" => SourceType::Unknown,
            "telegram" => SourceType::Telegram,
            "vk" => SourceType::Vk,
            "youtube" => SourceType::Youtube,
            "rutube" => SourceType::Rutube,
            "habr" => SourceType::Habr,
            _ => SourceType::Other(lowered),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            SourceType::Telegram => "telegram",
            SourceType::Vk => "vk",
            SourceType::Youtube => "youtube",
            SourceType::Rutube => "rutube",
            SourceType::Habr => "habr",
            SourceType::Unknown => "unknown",
            SourceType::Other(name) => name,
        }
    }

    /// Name shown in the table's source column.
    pub fn display_name(&self) -> &str {
        match self {
            SourceType::Telegram => "Telegram",
            SourceType::Vk => "VK",
            SourceType::Youtube => "YouTube",
            SourceType::Rutube => "Rutube",
            SourceType::Habr => "Habr",
            other => other.as_str(),
        }
    }
}

impl fmt::Display for SourceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for SourceType {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for SourceType {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(SourceType::parse(&s))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash, Default)]
pub enum Sentiment {
    Positive,
    #[default]
    Neutral,
    Negative,
    Other(String),
}

impl Sentiment {
    pub fn parse(raw: &str) -> Self {
        // labels are matched exactly; "negative" is a passthrough, not Negative
        let trimmed = raw.trim();
        match trimmed {
            "" | "Neutral" => Sentiment::Neutral,
            "Positive" => Sentiment::Positive,
            "Negative" => Sentiment::Negative,
            _ => Sentiment::Other(trimmed.to_string()),
        }
    }

    pub fn as_str(&self) -> &str {
        match self {
            Sentiment::Positive => "Positive",
            Sentiment::Neutral => "Neutral",
            Sentiment::Negative => "Negative",
            Sentiment::Other(label) => label,
        }
    }

    /// Sort rank: recognized labels first, everything else after them.
    pub fn rank(&self) -> u8 {
        match self {
            Sentiment::Positive => 1,
            Sentiment::Neutral => 2,
            Sentiment::Negative => 3,
            Sentiment::Other(_) => 4,
        }
    }

    pub fn display_label(&self) -> &str {
        match self {
            Sentiment::Positive => "Позитивная",
            Sentiment::Neutral => "Нейтральная",
            Sentiment::Negative => "Негативная",
            Sentiment::Other(label) => label,
        }
    }
}

impl fmt::Display for Sentiment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl Serialize for Sentiment {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.as_str())
    }
}

impl<'de> Deserialize<'de> for Sentiment {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        Ok(Sentiment::parse(&s))
    }
}

/// Canonical post record. Built once by the normalizer and never mutated.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Record {
    pub id: String,
    pub title: String,
    pub source_type: SourceType,
    pub date: RecordDate,
    pub views: u64,
    pub likes: u64,
    pub reposts: u64,
    pub engagement: f64, // [0.0, 1.0], scaled only when charted
    pub sentiment: Sentiment,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SourceFilter {
    All,
    Only(SourceType),
}

impl SourceFilter {
    pub fn parse(raw: &str) -> Self {
        if raw.trim().eq_ignore_ascii_case("all") {
            SourceFilter::All
        } else {
            SourceFilter::Only(SourceType::parse(raw))
        }
    }

    pub fn matches(&self, source: &SourceType) -> bool {
        match self {
            SourceFilter::All => true,
            SourceFilter::Only(wanted) => wanted == source,
        }
    }
}

/// Inclusive calendar range; only exists when both bounds are known.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: NaiveDate,
    pub end: NaiveDate,
}

impl DateRange {
    pub fn new(start: NaiveDate, end: NaiveDate) -> Self {
        Self { start, end }
    }

    /// A half-open picker selection is no range at all.
    pub fn from_bounds(start: Option<NaiveDate>, end: Option<NaiveDate>) -> Option<Self> {
        match (start, end) {
            (Some(start), Some(end)) => Some(Self { start, end }),
            _ => None,
        }
    }

    pub fn contains(&self, date: NaiveDate) -> bool {
        date >= self.start && date <= self.end
    }
}

/// Active filter set. Edits produce a new value; nothing mutates it in place.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilterState {
    pub search: String,
    pub source: SourceFilter,
    pub date_range: Option<DateRange>,
}

impl Default for FilterState {
    fn default() -> Self {
        Self {
            search: String::new(),
            source: SourceFilter::All,
            date_range: None,
        }
    }
}

impl FilterState {
    pub fn with_search(self, search: impl Into<String>) -> Self {
        Self {
            search: search.into(),
            ..self
        }
    }

    pub fn with_source(self, source: SourceFilter) -> Self {
        Self { source, ..self }
    }

    pub fn with_date_range(self, date_range: Option<DateRange>) -> Self {
        Self { date_range, ..self }
    }

    /// True when the export endpoint's unfiltered stream matches what is shown:
    /// all sources and no custom date range.
    pub fn is_export_scope(&self) -> bool {
        self.source == SourceFilter::All && self.date_range.is_none()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DateAggregate {
    pub date: RecordDate,
    pub views: u64,
    pub likes: u64,
    pub reposts: u64,
    pub count: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ChartPoint {
    pub date: RecordDate,
    pub title: String,
    pub views: u64,
    pub likes: u64,
    pub reposts: u64,
    pub engagement: f64, // percent
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "mode", content = "points", rename_all = "snake_case")]
pub enum ChartSeries {
    Aggregated(Vec<DateAggregate>),
    PerRecord(Vec<ChartPoint>),
}

impl ChartSeries {
    pub fn len(&self) -> usize {
        match self {
            ChartSeries::Aggregated(points) => points.len(),
            ChartSeries::PerRecord(points) => points.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
