use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::entitlements::FeatureEntitlement;
use crate::metrics::{CompanyMetric, MetricStore};
use crate::rules::{Rule, Trait};
use crate::utils::serialization::null_is_default;

/// The billing period a company is currently in.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Subscription {
    pub id: String,
    pub period_start: DateTime<Utc>,
    pub period_end: DateTime<Utc>,
}

/// Everything known about a company at evaluation time.
///
/// Only `metrics` may change while a company is shared between threads;
/// every other field is read-only for the duration of a check.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Company {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub environment_id: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub base_plan_id: Option<String>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub billing_product_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub crm_product_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub keys: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub plan_ids: Vec<String>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub plan_version_ids: Vec<String>,
    #[serde(default)]
    pub metrics: MetricStore,
    #[serde(default, deserialize_with = "null_is_default")]
    pub credit_balances: HashMap<String, f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subscription: Option<Subscription>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub traits: Vec<Trait>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub rules: Vec<Rule>,
    #[serde(
        default,
        deserialize_with = "null_is_default",
        skip_serializing_if = "Vec::is_empty"
    )]
    pub entitlements: Vec<FeatureEntitlement>,
}

impl Company {
    /// Records a usage counter, replacing any counter with the same key.
    pub fn add_metric(&self, metric: CompanyMetric) {
        self.metrics.upsert(metric);
    }

    pub fn trait_by_definition_id(&self, trait_definition_id: &str) -> Option<&Trait> {
        Trait::find_by_definition_id(&self.traits, trait_definition_id)
    }

    pub fn credit_balance(&self, credit_id: &str) -> f64 {
        self.credit_balances.get(credit_id).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct User {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub environment_id: String,

    #[serde(default, deserialize_with = "null_is_default")]
    pub keys: HashMap<String, String>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub traits: Vec<Trait>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub rules: Vec<Rule>,
}

impl User {
    pub fn trait_by_definition_id(&self, trait_definition_id: &str) -> Option<&Trait> {
        Trait::find_by_definition_id(&self.traits, trait_definition_id)
    }
}
