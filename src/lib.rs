pub mod api_types;
pub mod chart;
pub mod chart_export;
pub mod config;
pub mod dashboard;
pub mod fetch;
pub mod filter;
pub mod models;
pub mod normalize;
pub mod render;
pub mod sort;

pub use dashboard::{recompute, Dashboard, Notice, View};
pub use models::{FilterState, Record};
