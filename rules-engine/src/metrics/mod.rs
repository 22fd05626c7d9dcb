pub mod metric_models;
pub mod metric_periods;
pub mod metric_store;

pub use metric_models::{CompanyMetric, MetricPeriod, MetricPeriodMonthReset};
pub use metric_store::{find_metric, upsert_metric, MetricStore};
