use std::collections::BTreeMap;

use crate::models::{
    ChartPoint, ChartSeries, DateAggregate, Record, RecordDate, SourceFilter, SourceType,
};

/// Which chart branch to compute. Aggregation answers "what happened on a
/// day across all sources"; per-record points keep each post visible once a
/// single source is isolated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChartMode {
    AllSources,
    Single(SourceType),
}

impl From<&SourceFilter> for ChartMode {
    fn from(filter: &SourceFilter) -> Self {
        match filter {
            SourceFilter::All => ChartMode::AllSources,
            SourceFilter::Only(source) => ChartMode::Single(source.clone()),
        }
    }
}

/// Counter series the chart draws.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ChartMetric {
    #[default]
    All,
    Views,
    Likes,
    Reposts,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Counter {
    Views,
    Likes,
    Reposts,
}

impl Counter {
    pub fn as_str(&self) -> &'static str {
        match self {
            Counter::Views => "views",
            Counter::Likes => "likes",
            Counter::Reposts => "reposts",
        }
    }
}

impl ChartMetric {
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "all" => Some(ChartMetric::All),
            "views" => Some(ChartMetric::Views),
            "likes" => Some(ChartMetric::Likes),
            "reposts" => Some(ChartMetric::Reposts),
            _ => None,
        }
    }

    pub fn counters(&self) -> &'static [Counter] {
        match self {
            ChartMetric::All => &[Counter::Views, Counter::Likes, Counter::Reposts],
            ChartMetric::Views => &[Counter::Views],
            ChartMetric::Likes => &[Counter::Likes],
            ChartMetric::Reposts => &[Counter::Reposts],
        }
    }
}

pub fn aggregate(records: &[Record], mode: &ChartMode) -> ChartSeries {
    match mode {
        ChartMode::AllSources => ChartSeries::Aggregated(aggregate_by_date(records)),
        ChartMode::Single(_) => ChartSeries::PerRecord(per_record(records)),
    }
}

/// One bucket per distinct canonical date, ascending.
fn aggregate_by_date(records: &[Record]) -> Vec<DateAggregate> {
    let mut buckets: BTreeMap<RecordDate, DateAggregate> = BTreeMap::new();
    for r in records {
        let bucket = buckets.entry(r.date).or_insert_with(|| DateAggregate {
            date: r.date,
            views: 0,
            likes: 0,
            reposts: 0,
            count: 0,
        });
        // counters come straight from the feed and may be near u64::MAX
        bucket.views = bucket.views.saturating_add(r.views);
        bucket.likes = bucket.likes.saturating_add(r.likes);
        bucket.reposts = bucket.reposts.saturating_add(r.reposts);
        bucket.count += 1;
    }
    buckets.into_values().collect()
}

fn per_record(records: &[Record]) -> Vec<ChartPoint> {
    let mut points: Vec<ChartPoint> = records
        .iter()
        .map(|r| ChartPoint {
            date: r.date,
            title: r.title.clone(),
            views: r.views,
            likes: r.likes,
            reposts: r.reposts,
            engagement: r.engagement * 100.0,
        })
        .collect();
    // stable: equal dates keep filtered order
    points.sort_by_key(|p| p.date);
    points
}

/// Value of one counter at a chart point, whichever mode produced it.
pub fn counter_value(series: &ChartSeries, idx: usize, counter: Counter) -> Option<u64> {
    let (views, likes, reposts) = match series {
        ChartSeries::Aggregated(points) => {
            let p = points.get(idx)?;
            (p.views, p.likes, p.reposts)
        }
        ChartSeries::PerRecord(points) => {
            let p = points.get(idx)?;
            (p.views, p.likes, p.reposts)
        }
    };
    Some(match counter {
        Counter::Views => views,
        Counter::Likes => likes,
        Counter::Reposts => reposts,
    })
}
