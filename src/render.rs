// src/render.rs
use crate::chart::{counter_value, ChartMetric};
use crate::models::{ChartSeries, Record};

/// Thousands grouped with a no-break space, as ru-RU number formatting does.
pub fn format_count(n: u64) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3 * 2);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push('\u{a0}');
        }
        out.push(ch);
    }
    out
}

fn clip(s: &str, max_chars: usize) -> String {
    if s.chars().count() <= max_chars {
        s.to_string()
    } else {
        let mut t: String = s.chars().take(max_chars.saturating_sub(1)).collect();
        t.push('…');
        t
    }
}

pub fn render_table_text(records: &[Record]) -> String {
    let mut out = String::new();
    out.push_str("Название | Источник | Дата | Просмотры | Лайки | Репосты | Тональность\n");
    if records.is_empty() {
        out.push_str("(нет данных)\n");
        return out;
    }
    for r in records {
        out.push_str(&format!(
            "{} | {} | {} | {} | {} | {} | {}\n",
            clip(&r.title, 50),
            r.source_type.display_name(),
            r.date,
            format_count(r.views),
            format_count(r.likes),
            format_count(r.reposts),
            r.sentiment.display_label()
        ));
    }
    out
}

pub fn render_chart_text(series: &ChartSeries, metric: ChartMetric) -> String {
    let mut out = String::new();
    let counters = metric.counters();

    match series {
        ChartSeries::Aggregated(points) => {
            out.push_str("Все источники, по датам:\n");
            for (i, p) in points.iter().enumerate() {
                out.push_str(&format!("- {} (постов: {})", p.date, p.count));
                for c in counters {
                    if let Some(v) = counter_value(series, i, *c) {
                        out.push_str(&format!(" {}={}", c.as_str(), format_count(v)));
                    }
                }
                out.push('\n');
            }
        }
        ChartSeries::PerRecord(points) => {
            out.push_str("По публикациям:\n");
            for (i, p) in points.iter().enumerate() {
                out.push_str(&format!("- {} {}", p.date, clip(&p.title, 40)));
                for c in counters {
                    if let Some(v) = counter_value(series, i, *c) {
                        out.push_str(&format!(" {}={}", c.as_str(), format_count(v)));
                    }
                }
                out.push_str(&format!(" engagement={:.1}%\n", p.engagement));
            }
        }
    }

    if series.is_empty() {
        out.push_str("(нет данных)\n");
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{ChartPoint, DateAggregate, RecordDate, Sentiment, SourceType};

    #[test]
    fn test_format_count_groups_thousands() {
        assert_eq!(format_count(0), "0");
        assert_eq!(format_count(999), "999");
        assert_eq!(format_count(1000), "1\u{a0}000");
        assert_eq!(format_count(1234567), "1\u{a0}234\u{a0}567");
    }

    #[test]
    fn test_table_uses_display_vocabulary() {
        let r = Record {
            id: "1".into(),
            title: "Пост".into(),
            source_type: SourceType::Youtube,
            date: RecordDate::from_ymd(2024, 1, 2).unwrap(),
            views: 12000,
            likes: 3,
            reposts: 0,
            engagement: 0.0,
            sentiment: Sentiment::Negative,
            link: None,
        };
        let text = render_table_text(&[r]);
        assert!(text.contains("Пост | YouTube | 02-01-2024 | 12\u{a0}000 | 3 | 0 | Негативная"));
    }

    #[test]
    fn test_chart_respects_metric() {
        let series = ChartSeries::Aggregated(vec![DateAggregate {
            date: RecordDate::from_ymd(2024, 1, 2).unwrap(),
            views: 50,
            likes: 4,
            reposts: 1,
            count: 1,
        }]);
        let text = render_chart_text(&series, ChartMetric::Likes);
        assert!(text.contains("02-01-2024"));
        assert!(text.contains("likes=4"));
        assert!(!text.contains("views="));
    }

    #[test]
    fn test_per_record_chart_shows_engagement_percent() {
        let series = ChartSeries::PerRecord(vec![ChartPoint {
            date: RecordDate::from_ymd(2024, 1, 2).unwrap(),
            title: "Ролик".into(),
            views: 10,
            likes: 1,
            reposts: 0,
            engagement: 12.5,
        }]);
        let text = render_chart_text(&series, ChartMetric::All);
        assert!(text.contains("Ролик views=10 likes=1 reposts=0 engagement=12.5%"));
    }

    #[test]
    fn test_empty_outputs() {
        assert!(render_table_text(&[]).contains("нет данных"));
        assert!(render_chart_text(&ChartSeries::Aggregated(vec![]), ChartMetric::All).contains("нет данных"));
    }
}
