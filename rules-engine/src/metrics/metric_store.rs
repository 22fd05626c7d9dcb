use std::fmt;
use std::sync::{Mutex, MutexGuard, PoisonError};

use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::accounts::Company;
use crate::metrics::metric_models::{CompanyMetric, MetricPeriod, MetricPeriodMonthReset};

/// Looks up the counter for an event subtype. A missing period means all-time
/// and a missing reset policy means first-of-month.
pub fn find_metric<'a>(
    metrics: &'a [CompanyMetric],
    event_subtype: &str,
    period: Option<MetricPeriod>,
    month_reset: Option<MetricPeriodMonthReset>,
) -> Option<&'a CompanyMetric> {
    let period = period.unwrap_or_default();
    let month_reset = month_reset.unwrap_or_default();
    metrics
        .iter()
        .find(|metric| metric.has_key(event_subtype, period, month_reset))
}

/// Inserts or replaces a company's counter. Does nothing if either side is absent.
pub fn upsert_metric(company: Option<&Company>, metric: Option<CompanyMetric>) {
    if let (Some(company), Some(metric)) = (company, metric) {
        company.metrics.upsert(metric);
    }
}

/// A company's usage counters behind a lock, so usage ingestion can upsert
/// while flags are being checked against the same company.
#[derive(Default)]
pub struct MetricStore {
    metrics: Mutex<Vec<CompanyMetric>>,
}

impl MetricStore {
    pub fn new(metrics: Vec<CompanyMetric>) -> Self {
        Self {
            metrics: Mutex::new(metrics),
        }
    }

    // The guarded Vec is never left half-written, so a poisoned lock is still usable.
    fn lock(&self) -> MutexGuard<'_, Vec<CompanyMetric>> {
        self.metrics.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn find(
        &self,
        event_subtype: &str,
        period: Option<MetricPeriod>,
        month_reset: Option<MetricPeriodMonthReset>,
    ) -> Option<CompanyMetric> {
        find_metric(&self.lock(), event_subtype, period, month_reset).cloned()
    }

    /// Current value of a counter, or 0 if the company has never reported it.
    pub fn value_of(
        &self,
        event_subtype: &str,
        period: Option<MetricPeriod>,
        month_reset: Option<MetricPeriodMonthReset>,
    ) -> i64 {
        find_metric(&self.lock(), event_subtype, period, month_reset)
            .map(|metric| metric.value)
            .unwrap_or(0)
    }

    /// Replaces the counter with the same `(event_subtype, period, month_reset)`
    /// in place, or appends it.
    pub fn upsert(&self, metric: CompanyMetric) {
        let event_subtype = metric.event_subtype.clone();
        let (period, month_reset) = (metric.period, metric.month_reset);

        let replaced = {
            let mut metrics = self.lock();
            match metrics
                .iter()
                .position(|m| m.has_key(&event_subtype, period, month_reset))
            {
                Some(index) => {
                    metrics[index] = metric;
                    true
                }
                None => {
                    metrics.push(metric);
                    false
                }
            }
        };

        tracing::debug!(
            %event_subtype,
            %period,
            %month_reset,
            replaced,
            "upserted company metric"
        );
    }

    pub fn len(&self) -> usize {
        self.lock().len()
    }

    pub fn is_empty(&self) -> bool {
        self.lock().is_empty()
    }

    pub fn snapshot(&self) -> Vec<CompanyMetric> {
        self.lock().clone()
    }
}

impl From<Vec<CompanyMetric>> for MetricStore {
    fn from(metrics: Vec<CompanyMetric>) -> Self {
        Self::new(metrics)
    }
}

impl Clone for MetricStore {
    fn clone(&self) -> Self {
        Self::new(self.snapshot())
    }
}

impl fmt::Debug for MetricStore {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.lock().iter()).finish()
    }
}

impl PartialEq for MetricStore {
    fn eq(&self, other: &Self) -> bool {
        if std::ptr::eq(self, other) {
            return true;
        }
        self.snapshot() == other.snapshot()
    }
}

impl Serialize for MetricStore {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.lock().serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for MetricStore {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // `null` is accepted as an empty collection
        let metrics = Option::<Vec<CompanyMetric>>::deserialize(deserializer)?;
        Ok(Self::new(metrics.unwrap_or_default()))
    }
}
