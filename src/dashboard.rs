use anyhow::Result;
use serde::Serialize;
use std::fmt;
use tracing::{debug, error, info, warn};

use crate::chart::{aggregate, ChartMetric, ChartMode};
use crate::fetch::FeedClient;
use crate::filter;
use crate::models::{ChartSeries, FilterState, Record};
use crate::normalize::Normalizer;

/// Everything derived from one (records, filters) pair.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct View {
    pub filtered: Vec<Record>,
    pub chart: ChartSeries,
}

/// Pure re-derivation of the table and chart. Same inputs, same output.
pub fn recompute(records: &[Record], filters: &FilterState) -> View {
    let filtered = filter::apply(records, filters);
    let chart = aggregate(&filtered, &ChartMode::from(&filters.source));
    View { filtered, chart }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notice {
    Loaded(usize),
    Added(usize),
    NoNewData,
    FetchFailed(String),
    Exported { bytes: usize },
    ExportUnavailable,
    ExportFailed(String),
    AssistantFailed(String),
}

impl Notice {
    pub fn is_error(&self) -> bool {
        matches!(
            self,
            Notice::FetchFailed(_) | Notice::ExportFailed(_) | Notice::AssistantFailed(_)
        )
    }
}

impl fmt::Display for Notice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Notice::Loaded(n) => write!(f, "Загружено {} записей", n),
            Notice::Added(n) => write!(f, "Данные успешно обновлены! Добавлено {} новых записей", n),
            Notice::NoNewData => f.write_str("Нет новых данных"),
            Notice::FetchFailed(e) => write!(f, "Ошибка загрузки данных от бэкенда: {}", e),
            Notice::Exported { bytes } => write!(f, "Данные успешно экспортированы в CSV ({} байт)", bytes),
            Notice::ExportUnavailable => {
                f.write_str("Экспорт CSV выгружает все источники и даты: сбросьте фильтры источника и дат")
            }
            Notice::ExportFailed(e) => write!(f, "Ошибка при экспорте данных: {}", e),
            Notice::AssistantFailed(e) => write!(f, "Ассистент недоступен: {}", e),
        }
    }
}

/// Compare batch sizes around a successful refresh.
pub fn refresh_notice(previous: usize, current: usize) -> Option<Notice> {
    if previous == 0 && current > 0 {
        Some(Notice::Loaded(current))
    } else if current > previous {
        Some(Notice::Added(current - previous))
    } else if current == previous && previous > 0 {
        Some(Notice::NoNewData)
    } else {
        None
    }
}

/// One user session: the latest canonical batch, the active filters and the
/// notices raised since they were last drained.
#[derive(Debug, Default)]
pub struct Dashboard {
    records: Vec<Record>,
    filters: FilterState,
    chart_metric: ChartMetric,
    notices: Vec<Notice>,
}

impl Dashboard {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn filters(&self) -> &FilterState {
        &self.filters
    }

    /// Replace the whole filter set.
    pub fn set_filters(&mut self, filters: FilterState) {
        debug!("Filters replaced - {:?}", filters);
        self.filters = filters;
    }

    pub fn chart_metric(&self) -> ChartMetric {
        self.chart_metric
    }

    pub fn set_chart_metric(&mut self, metric: ChartMetric) {
        self.chart_metric = metric;
    }

    pub fn view(&self) -> View {
        recompute(&self.records, &self.filters)
    }

    pub fn notices(&self) -> &[Notice] {
        &self.notices
    }

    pub fn take_notices(&mut self) -> Vec<Notice> {
        std::mem::take(&mut self.notices)
    }

    fn push(&mut self, notice: Notice) {
        if notice.is_error() {
            error!("{}", notice);
        } else {
            info!("{}", notice);
        }
        self.notices.push(notice);
    }

    /// Install the outcome of a fetch. A successful batch replaces the records
    /// wholesale; a failure clears them so no stale data is shown.
    pub fn apply_fetch(&mut self, outcome: Result<Vec<Record>>) {
        match outcome {
            Ok(records) => {
                let previous = self.records.len();
                self.records = records;
                if let Some(notice) = refresh_notice(previous, self.records.len()) {
                    self.push(notice);
                }
            }
            Err(e) => {
                self.records.clear();
                self.push(Notice::FetchFailed(format!("{:#}", e)));
            }
        }
    }

    pub async fn refresh(&mut self, client: &FeedClient, normalizer: &Normalizer) {
        let outcome = client.fetch_records(normalizer).await;
        self.apply_fetch(outcome);
    }

    /// Raw CSV, only while the view covers all sources and all dates.
    pub async fn export_csv(&mut self, client: &FeedClient) -> Option<Vec<u8>> {
        if !self.filters.is_export_scope() {
            warn!("CSV export skipped - filters={:?}", self.filters);
            self.push(Notice::ExportUnavailable);
            return None;
        }
        match client.export_csv().await {
            Ok(bytes) => {
                self.push(Notice::Exported { bytes: bytes.len() });
                Some(bytes)
            }
            Err(e) => {
                self.push(Notice::ExportFailed(format!("{:#}", e)));
                None
            }
        }
    }

    /// Ask the assistant about the currently filtered records.
    pub async fn ask(&mut self, client: &FeedClient, question: &str) -> Option<String> {
        if question.trim().is_empty() {
            return None;
        }
        let context = self.view().filtered;
        match client.ask(question, &context).await {
            Ok(answer) => Some(answer),
            Err(e) => {
                self.push(Notice::AssistantFailed(format!("{:#}", e)));
                None
            }
        }
    }
}
