use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString, VariantNames};

use crate::comparison::{ComparableOperator, ComparableType};
use crate::metrics::{MetricPeriod, MetricPeriodMonthReset};
use crate::utils::serialization::null_is_default;

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
pub enum ConditionType {
    BasePlan,
    BillingProduct,
    Company,
    CrmProduct,
    Credit,
    Metric,
    Plan,
    PlanVersion,
    Trait,
    User,
}

/// Which entity a trait is attached to.
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
pub enum EntityType {
    #[default]
    Company,
    User,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct TraitDefinition {
    pub id: String,
    #[serde(default)]
    pub comparable_type: ComparableType,
    #[serde(default)]
    pub entity_type: EntityType,
}

/// A string-encoded attribute value on a company or user.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize)]
pub struct Trait {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_definition: Option<TraitDefinition>,
    #[serde(default)]
    pub value: String,
}

impl Trait {
    pub fn find_by_definition_id<'a>(
        traits: &'a [Trait],
        trait_definition_id: &str,
    ) -> Option<&'a Trait> {
        traits.iter().find(|t| {
            t.trait_definition
                .as_ref()
                .is_some_and(|definition| definition.id == trait_definition_id)
        })
    }
}

/// A single predicate. Which optional fields matter depends on `condition_type`:
///
/// - company, user, plan, base plan, billing product, CRM product and plan
///   version conditions test `resource_ids`
/// - metric conditions use the `event_subtype`/`metric_*` fields
/// - credit conditions use `credit_id`, `consumption_rate` and optionally
///   `event_subtype`/`metric_*` to price current usage
/// - trait conditions use `trait_definition` and `trait_value`
///
/// Metric and trait conditions may compare against another trait's value via
/// `comparison_trait_definition`.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Condition {
    pub id: String,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub environment_id: String,
    pub condition_type: ConditionType,
    #[serde(default)]
    pub operator: ComparableOperator,

    #[serde(default, deserialize_with = "null_is_default")]
    pub resource_ids: Vec<String>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub event_subtype: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_value: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_period: Option<MetricPeriod>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metric_period_month_reset: Option<MetricPeriodMonthReset>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub credit_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub consumption_rate: Option<f64>,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub trait_definition: Option<TraitDefinition>,
    #[serde(default)]
    pub trait_value: String,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub comparison_trait_definition: Option<TraitDefinition>,
}

impl Condition {
    pub fn is_usage_condition(&self) -> bool {
        matches!(
            self.condition_type,
            ConditionType::Metric | ConditionType::Trait
        )
    }
}

/// Conditions OR-ed together. An empty group never matches.
#[derive(Debug, Clone, Default, PartialEq, Deserialize, Serialize)]
pub struct ConditionGroup {
    #[serde(default, deserialize_with = "null_is_default")]
    pub conditions: Vec<Condition>,
}

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
pub enum RuleType {
    /// Flag-wide on/off toggle; carries no conditions.
    GlobalOverride,
    CompanyOverride,
    CompanyOverrideUsageExceeded,
    PlanEntitlement,
    PlanEntitlementUsageExceeded,
    Standard,
    /// Fallback value; carries no conditions.
    Default,
    /// Plan targeting, never evaluated as part of a flag.
    PlanAudience,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RulePrioritizationMethod {
    None,
    Priority,
    Optimistic,
}

/// The order rule type groups are evaluated in when checking a flag.
/// Types missing from this list are never evaluated against a flag.
pub const RULE_TYPE_PRIORITY: [RuleType; 7] = [
    RuleType::GlobalOverride,
    RuleType::CompanyOverride,
    RuleType::PlanEntitlement,
    RuleType::CompanyOverrideUsageExceeded,
    RuleType::PlanEntitlementUsageExceeded,
    RuleType::Standard,
    RuleType::Default,
];

impl RuleType {
    pub fn display_name(&self) -> String {
        self.as_ref().replace('_', " ")
    }

    pub fn is_entitlement(&self) -> bool {
        matches!(
            self,
            RuleType::CompanyOverride
                | RuleType::CompanyOverrideUsageExceeded
                | RuleType::PlanEntitlement
                | RuleType::PlanEntitlementUsageExceeded
        )
    }

    /// Rules of these types match without looking at their conditions.
    pub fn is_unconditional(&self) -> bool {
        matches!(self, RuleType::Default | RuleType::GlobalOverride)
    }

    pub fn prioritization_method(&self) -> RulePrioritizationMethod {
        match self {
            RuleType::Standard => RulePrioritizationMethod::Priority,
            RuleType::CompanyOverride
            | RuleType::CompanyOverrideUsageExceeded
            | RuleType::PlanEntitlement
            | RuleType::PlanEntitlementUsageExceeded => RulePrioritizationMethod::Optimistic,
            RuleType::GlobalOverride | RuleType::Default | RuleType::PlanAudience => {
                RulePrioritizationMethod::None
            }
        }
    }
}

#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct Rule {
    pub id: String,
    /// Set for rules owned by a company or user; such rules only take part in
    /// checks of this flag.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub flag_id: Option<String>,
    #[serde(default)]
    pub account_id: String,
    #[serde(default)]
    pub environment_id: String,
    pub rule_type: RuleType,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub priority: i64,
    #[serde(default, deserialize_with = "null_is_default")]
    pub conditions: Vec<Condition>,
    #[serde(default, deserialize_with = "null_is_default")]
    pub condition_groups: Vec<ConditionGroup>,
    #[serde(default)]
    pub value: bool,
}

impl Rule {
    /// The first metric or trait condition, which carries the usage and
    /// allocation for numeric entitlements.
    pub fn usage_condition(&self) -> Option<&Condition> {
        self.conditions.iter().find(|c| c.is_usage_condition())
    }

    pub fn applies_to_flag(&self, flag_id: &str) -> bool {
        self.flag_id.as_deref() == Some(flag_id)
    }
}
