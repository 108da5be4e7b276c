// src/chart_export.rs
use anyhow::{Context, Result};
use itertools::Itertools;
use serde::Serialize;
use serde_json::json;
use std::{fs, path::Path};

use crate::chart::ChartMetric;
use crate::dashboard::View;
use crate::models::{FilterState, SourceFilter};

/// Write the current view as renderer-ready JSON into `out_dir`:
/// `chart.json`, `table.json` and an `index.json` describing both.
pub fn write_chart_bundle(
    out_dir: &Path,
    view: &View,
    filters: &FilterState,
    metric: ChartMetric,
) -> Result<()> {
    fs::create_dir_all(out_dir).with_context(|| format!("create {:?}", out_dir))?;

    let metrics: Vec<&str> = metric.counters().iter().map(|c| c.as_str()).collect();
    let chart = json!({
        "metrics": metrics,
        "series": view.chart,
    });
    write_json(out_dir.join("chart.json"), &chart)?;
    write_json(out_dir.join("table.json"), &view.filtered)?;

    let sources = view
        .filtered
        .iter()
        .map(|r| r.source_type.as_str())
        .unique()
        .sorted()
        .collect::<Vec<_>>();

    let idx = json!({
        "version": 1,
        "filters": filters_json(filters),
        "counts": {
            "records": view.filtered.len(),
            "points": view.chart.len(),
            "sources": sources.len(),
        },
        "sources": sources,
        "files": ["chart.json", "table.json"],
    });
    write_json(out_dir.join("index.json"), &idx)?;

    Ok(())
}

fn filters_json(filters: &FilterState) -> serde_json::Value {
    let source = match &filters.source {
        SourceFilter::All => "all".to_string(),
        SourceFilter::Only(s) => s.as_str().to_string(),
    };
    let range = filters.date_range.map(|r| {
        json!([
            r.start.format("%d-%m-%Y").to_string(),
            r.end.format("%d-%m-%Y").to_string()
        ])
    });
    json!({
        "search": filters.search,
        "source": source,
        "dateRange": range,
    })
}

fn write_json<P: AsRef<Path>, T: ?Sized + Serialize>(path: P, value: &T) -> Result<()> {
    let path = path.as_ref();
    fs::write(path, serde_json::to_vec_pretty(value)?).with_context(|| format!("write {:?}", path))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dashboard::recompute;
    use crate::models::{DateRange, Record, RecordDate, Sentiment, SourceType};
    use chrono::NaiveDate;

    fn rec(id: &str, source: SourceType, day: u32, views: u64) -> Record {
        Record {
            id: id.into(),
            title: id.into(),
            source_type: source,
            date: RecordDate::from_ymd(2024, 6, day).unwrap(),
            views,
            likes: 0,
            reposts: 0,
            engagement: 0.0,
            sentiment: Sentiment::Neutral,
            link: None,
        }
    }

    fn read(path: &Path) -> serde_json::Value {
        serde_json::from_slice(&fs::read(path).unwrap()).unwrap()
    }

    #[test]
    fn test_bundle_files() {
        let dir = tempfile::tempdir().unwrap();
        let records = vec![
            rec("a", SourceType::Vk, 1, 10),
            rec("b", SourceType::Telegram, 1, 5),
            rec("c", SourceType::Vk, 3, 1),
        ];
        let filters = FilterState::default();
        let view = recompute(&records, &filters);
        write_chart_bundle(dir.path(), &view, &filters, ChartMetric::Views).unwrap();

        let chart = read(&dir.path().join("chart.json"));
        assert_eq!(chart["metrics"], json!(["views"]));
        assert_eq!(chart["series"]["mode"], "aggregated");
        assert_eq!(chart["series"]["points"][0]["date"], "01-06-2024");
        assert_eq!(chart["series"]["points"][0]["views"], 15);

        let table = read(&dir.path().join("table.json"));
        assert_eq!(table.as_array().unwrap().len(), 3);

        let idx = read(&dir.path().join("index.json"));
        assert_eq!(idx["counts"]["points"], 2);
        assert_eq!(idx["sources"], json!(["telegram", "vk"]));
        assert_eq!(idx["filters"]["source"], "all");
        assert!(idx["filters"]["dateRange"].is_null());
    }

    #[test]
    fn test_bundle_records_active_filters() {
        let dir = tempfile::tempdir().unwrap();
        let start = NaiveDate::from_ymd_opt(2024, 6, 1).unwrap();
        let end = NaiveDate::from_ymd_opt(2024, 6, 2).unwrap();
        let filters = FilterState::default()
            .with_source(SourceFilter::Only(SourceType::Vk))
            .with_date_range(Some(DateRange::new(start, end)));
        let view = recompute(&[rec("a", SourceType::Vk, 1, 10)], &filters);
        write_chart_bundle(dir.path(), &view, &filters, ChartMetric::All).unwrap();

        let idx = read(&dir.path().join("index.json"));
        assert_eq!(idx["filters"]["source"], "vk");
        assert_eq!(idx["filters"]["dateRange"], json!(["01-06-2024", "02-06-2024"]));
        let chart = read(&dir.path().join("chart.json"));
        assert_eq!(chart["series"]["mode"], "per_record");
    }
}
