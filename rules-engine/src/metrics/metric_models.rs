use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

/// The window a usage counter accumulates over.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    Display,
    AsRefStr,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricPeriod {
    #[default]
    AllTime,
    CurrentDay,
    CurrentWeek,
    CurrentMonth,
}

impl MetricPeriod {
    /// Compact code used by callers that key caches or columns on the period.
    pub fn as_i32(&self) -> i32 {
        match self {
            MetricPeriod::AllTime => 0,
            MetricPeriod::CurrentDay => 1,
            MetricPeriod::CurrentWeek => 2,
            MetricPeriod::CurrentMonth => 3,
        }
    }

    pub fn from_i32(code: i32) -> Self {
        match code {
            1 => MetricPeriod::CurrentDay,
            2 => MetricPeriod::CurrentWeek,
            3 => MetricPeriod::CurrentMonth,
            _ => MetricPeriod::AllTime,
        }
    }
}

/// For monthly metrics, whether the month starts on the 1st or on the
/// company's billing anniversary.
#[derive(
    Debug,
    Clone,
    Copy,
    Default,
    PartialEq,
    Eq,
    Hash,
    Deserialize,
    Serialize,
    Display,
    AsRefStr,
    EnumString,
    VariantNames,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum MetricPeriodMonthReset {
    #[default]
    FirstOfMonth,
    BillingCycle,
}

impl MetricPeriodMonthReset {
    pub fn as_i32(&self) -> i32 {
        match self {
            MetricPeriodMonthReset::FirstOfMonth => 0,
            MetricPeriodMonthReset::BillingCycle => 1,
        }
    }

    pub fn from_i32(code: i32) -> Self {
        match code {
            1 => MetricPeriodMonthReset::BillingCycle,
            _ => MetricPeriodMonthReset::FirstOfMonth,
        }
    }
}

/// A running usage total for one event subtype of one company.
///
/// Within a company, `(event_subtype, period, month_reset)` identifies at most
/// one counter.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct CompanyMetric {
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub environment_id: String,
    #[serde(default)]
    pub company_id: String,
    pub event_subtype: String,
    #[serde(default)]
    pub period: MetricPeriod,
    #[serde(default)]
    pub month_reset: MetricPeriodMonthReset,
    #[serde(default)]
    pub value: i64,
    #[serde(default)]
    pub created_at: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub valid_until: Option<DateTime<Utc>>,
}

impl CompanyMetric {
    pub fn has_key(
        &self,
        event_subtype: &str,
        period: MetricPeriod,
        month_reset: MetricPeriodMonthReset,
    ) -> bool {
        self.event_subtype == event_subtype
            && self.period == period
            && self.month_reset == month_reset
    }
}
