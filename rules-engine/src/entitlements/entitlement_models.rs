use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

use crate::metrics::{MetricPeriod, MetricPeriodMonthReset};

/// Where an entitlement came from.
#[derive(
    Debug,
    Clone,
    Copy,
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
pub enum EntitlementType {
    PlanEntitlement,
    CompanyOverride,
}

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
pub enum EntitlementValueType {
    Boolean,
    Credit,
    Numeric,
    Trait,
    #[default]
    Unknown,
    Unlimited,
}

/// A company's access to one feature, as assembled by the caller from the
/// rules that matched.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct FeatureEntitlement {
    pub feature_id: String,
    pub feature_key: String,
    #[serde(default)]
    pub value_type: EntitlementValueType,
    /// Absent for unlimited entitlements.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub allocation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub usage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_period: Option<MetricPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub month_reset: Option<MetricPeriodMonthReset>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_reset_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_total: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_used: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_remaining: Option<f64>,
}

impl FeatureEntitlement {
    /// Whether this entitlement grants more than `other`, comparing
    /// allocations normalized to a daily rate where both have a period.
    pub fn is_more_generous_than(&self, other: &FeatureEntitlement) -> bool {
        super::is_allocation_more_generous(
            self.allocation,
            self.metric_period,
            other.allocation,
            other.metric_period,
        )
    }
}
