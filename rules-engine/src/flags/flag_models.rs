use std::collections::HashMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::accounts::{Company, User};
use crate::api::errors::RulesEngineError;
use crate::comparison::type_conversion::string_to_i64;
use crate::metrics::metric_periods::next_metric_period_start_from_condition;
use crate::metrics::MetricPeriod;
use crate::rules::{ConditionType, EntityType, Rule, RuleType};
use crate::utils::serialization::null_is_default;

pub const REASON_NO_COMPANY_OR_USER: &str = "No company or user context; default value for flag";
pub const REASON_COMPANY_NOT_FOUND: &str = "Company not found";
pub const REASON_COMPANY_NOT_SPECIFIED: &str = "Must specify a company";
pub const REASON_FLAG_NOT_FOUND: &str = "Flag not found";
pub const REASON_NO_RULES_MATCHED: &str = "No rules matched; default value for flag";
pub const REASON_SERVER_ERROR: &str = "Server error; rule evaluation failed";
pub const REASON_USER_NOT_FOUND: &str = "User not found";

#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct Flag {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub environment_id: String,
    #[serde(default)]
    pub key: String,
    #[serde(default, deserialize_with = "null_is_default")]
    pub rules: Vec<Rule>,
    #[serde(default)]
    pub default_value: bool,
}

/// Hypothetical usage to evaluate numeric conditions against, as if it had
/// already been consumed. Quantities that are not positive are ignored.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CheckFlagOptions {
    /// Added to every metric, credit and integer trait condition.
    pub usage: Option<i64>,
    /// Added to conditions tracking the named event.
    pub event_usage: HashMap<String, i64>,
}

impl CheckFlagOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_usage(mut self, quantity: i64) -> Self {
        self.usage = Some(quantity);
        self
    }

    pub fn with_event_usage(mut self, event_subtype: impl Into<String>, quantity: i64) -> Self {
        self.event_usage.insert(event_subtype.into(), quantity);
        self
    }

    pub fn generic_usage(&self) -> Option<i64> {
        self.usage.filter(|quantity| *quantity > 0)
    }

    pub fn event_usage_for(&self, event_subtype: &str) -> Option<i64> {
        self.event_usage
            .get(event_subtype)
            .copied()
            .filter(|quantity| *quantity > 0)
    }

    /// Usage to add to a metric or trait condition. An event named in
    /// `event_usage` takes its own quantity, even a non-positive one that adds
    /// nothing; the generic quantity applies only to events not named there.
    pub fn added_usage(&self, event_subtype: Option<&str>) -> Option<i64> {
        match event_subtype {
            Some(event) if self.event_usage.contains_key(event) => self.event_usage_for(event),
            _ => self.generic_usage(),
        }
    }
}

#[derive(Debug, Default, Deserialize, Serialize)]
pub struct CheckFlagResult {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub company_id: Option<String>,
    /// Set when the check completed without evaluating, e.g. an unknown flag.
    #[serde(skip)]
    pub err: Option<RulesEngineError>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_allocation: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_usage: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_usage_event: Option<String>,
    #[serde(default)]
    pub feature_usage_period: Option<MetricPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub feature_usage_reset_at: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_id: Option<String>,
    #[serde(default)]
    pub flag_key: String,
    #[serde(default)]
    pub reason: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rule_id: Option<String>,
    #[serde(default)]
    pub rule_type: Option<RuleType>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_id: Option<String>,
    #[serde(default)]
    pub value: bool,
}

impl CheckFlagResult {
    pub(crate) fn set_rule_fields(
        &mut self,
        company: Option<&Company>,
        user: Option<&User>,
        rule: &Rule,
        now: DateTime<Utc>,
    ) {
        self.rule_id = Some(rule.id.clone());
        self.rule_type = Some(rule.rule_type);

        let Some(company) = company else {
            return;
        };

        if !rule.rule_type.is_entitlement() {
            return;
        }

        // boolean and unlimited entitlements have no usage condition
        let Some(condition) = rule.usage_condition() else {
            return;
        };

        let mut usage = 0;
        let mut allocation = 0;
        match condition.condition_type {
            ConditionType::Metric => {
                if let Some(event_subtype) = &condition.event_subtype {
                    self.feature_usage_event = Some(event_subtype.clone());
                    usage = company.metrics.value_of(
                        event_subtype,
                        condition.metric_period,
                        condition.metric_period_month_reset,
                    );
                }
                allocation = condition.metric_value.unwrap_or(0);
                self.feature_usage_period = Some(condition.metric_period.unwrap_or_default());
                self.feature_usage_reset_at =
                    next_metric_period_start_from_condition(condition, Some(company), now);
            }
            ConditionType::Trait => {
                if let Some(definition) = &condition.trait_definition {
                    let usage_trait = match definition.entity_type {
                        EntityType::Company => company.trait_by_definition_id(&definition.id),
                        EntityType::User => {
                            user.and_then(|user| user.trait_by_definition_id(&definition.id))
                        }
                    };
                    usage = usage_trait.map_or(0, |t| string_to_i64(&t.value));
                }
                allocation = string_to_i64(&condition.trait_value);
            }
            _ => {}
        }

        if let Some(definition) = &condition.comparison_trait_definition {
            if let Some(allocation_trait) = company.trait_by_definition_id(&definition.id) {
                allocation = string_to_i64(&allocation_trait.value);
            }
        }

        self.feature_usage = Some(usage);
        self.feature_allocation = Some(allocation);
    }
}
