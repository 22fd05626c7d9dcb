use std::borrow::Cow;

use crate::accounts::{Company, User};
use crate::api::errors::RulesEngineError;
use crate::comparison::type_conversion::string_to_i64;
use crate::comparison::comparison_matching::compare_i64;
use crate::comparison::{compare, ComparableOperator, ComparableType};
use crate::flags::CheckFlagOptions;
use crate::rules::rule_models::{
    Condition, ConditionGroup, ConditionType, EntityType, Rule, Trait, TraitDefinition,
};

/// Evaluates rules against one company and/or user.
///
/// Conditions that reference an entity missing from scope, or lack the data
/// their type needs, do not match. A metric condition with no threshold to
/// compare against is an error.
pub struct RuleChecker<'a> {
    company: Option<&'a Company>,
    user: Option<&'a User>,
    options: &'a CheckFlagOptions,
}

impl<'a> RuleChecker<'a> {
    pub fn new(
        company: Option<&'a Company>,
        user: Option<&'a User>,
        options: &'a CheckFlagOptions,
    ) -> Self {
        Self {
            company,
            user,
            options,
        }
    }

    /// All conditions and all condition groups must match. Default and global
    /// override rules match unconditionally.
    pub fn check(&self, rule: Option<&Rule>) -> Result<bool, RulesEngineError> {
        let Some(rule) = rule else {
            return Ok(false);
        };

        if rule.rule_type.is_unconditional() {
            return Ok(true);
        }

        for condition in &rule.conditions {
            if !self.check_condition(condition)? {
                return Ok(false);
            }
        }

        for group in &rule.condition_groups {
            if !self.check_condition_group(group)? {
                return Ok(false);
            }
        }

        Ok(true)
    }

    pub fn check_condition_group(&self, group: &ConditionGroup) -> Result<bool, RulesEngineError> {
        for condition in &group.conditions {
            if self.check_condition(condition)? {
                return Ok(true);
            }
        }

        Ok(false)
    }

    pub fn check_condition(&self, condition: &Condition) -> Result<bool, RulesEngineError> {
        let matched = match condition.condition_type {
            ConditionType::Company => self.check_company_condition(condition),
            ConditionType::User => self.check_user_condition(condition),
            ConditionType::Plan => {
                self.check_company_resources(condition, |company| &company.plan_ids)
            }
            ConditionType::PlanVersion => {
                self.check_company_resources(condition, |company| &company.plan_version_ids)
            }
            ConditionType::BillingProduct => {
                self.check_company_resources(condition, |company| &company.billing_product_ids)
            }
            ConditionType::CrmProduct => {
                self.check_company_resources(condition, |company| &company.crm_product_ids)
            }
            ConditionType::BasePlan => self.check_base_plan_condition(condition),
            ConditionType::Credit => self.check_credit_condition(condition),
            ConditionType::Trait => self.check_trait_condition(condition),
            ConditionType::Metric => return self.check_metric_condition(condition),
        };

        Ok(matched)
    }

    fn check_company_condition(&self, condition: &Condition) -> bool {
        let Some(company) = self.company else {
            return false;
        };

        let matched = condition.resource_ids.contains(&company.id);
        invert_on_ne(matched, condition.operator)
    }

    fn check_user_condition(&self, condition: &Condition) -> bool {
        let Some(user) = self.user else {
            return false;
        };

        let matched = condition.resource_ids.contains(&user.id);
        invert_on_ne(matched, condition.operator)
    }

    /// Matches when the condition's ids and the company's ids intersect.
    fn check_company_resources<F>(&self, condition: &Condition, company_ids: F) -> bool
    where
        F: Fn(&Company) -> &Vec<String>,
    {
        let Some(company) = self.company else {
            return false;
        };

        let company_ids = company_ids(company);
        let matched = condition
            .resource_ids
            .iter()
            .any(|id| company_ids.contains(id));
        invert_on_ne(matched, condition.operator)
    }

    fn check_base_plan_condition(&self, condition: &Condition) -> bool {
        let Some(company) = self.company else {
            return false;
        };

        let base_plan_id = company.base_plan_id.as_ref();
        let in_condition = base_plan_id.is_some_and(|id| condition.resource_ids.contains(id));
        match condition.operator {
            ComparableOperator::Eq => in_condition,
            ComparableOperator::Ne => !in_condition,
            ComparableOperator::IsEmpty => base_plan_id.is_none(),
            ComparableOperator::NotEmpty => base_plan_id.is_some(),
            ComparableOperator::Gt
            | ComparableOperator::Lt
            | ComparableOperator::Gte
            | ComparableOperator::Lte => false,
        }
    }

    fn check_metric_condition(&self, condition: &Condition) -> Result<bool, RulesEngineError> {
        let (Some(company), Some(event_subtype)) =
            (self.company, condition.event_subtype.as_deref())
        else {
            return Ok(false);
        };

        let mut left = company.metrics.value_of(
            event_subtype,
            condition.metric_period,
            condition.metric_period_month_reset,
        );
        if let Some(added) = self.options.added_usage(Some(event_subtype)) {
            left = left.saturating_add(added);
        }

        let right = match (&condition.comparison_trait_definition, condition.metric_value) {
            (Some(definition), _) => {
                let allocation = find_trait(definition, &company.traits);
                string_to_i64(&allocation.value)
            }
            (None, Some(threshold)) => threshold,
            (None, None) => {
                tracing::warn!(
                    condition_id = %condition.id,
                    event_subtype,
                    "metric condition has no value to compare against"
                );
                return Err(RulesEngineError::MissingMetricValue(condition.id.clone()));
            }
        };

        Ok(compare_i64(left, right, condition.operator))
    }

    fn check_trait_condition(&self, condition: &Condition) -> bool {
        let Some(definition) = &condition.trait_definition else {
            return false;
        };

        let traits = match (definition.entity_type, self.company, self.user) {
            (EntityType::Company, Some(company), _) => &company.traits,
            (EntityType::User, _, Some(user)) => &user.traits,
            _ => return false,
        };

        let found = find_trait(definition, traits);
        let comparison = condition
            .comparison_trait_definition
            .as_ref()
            .map(|definition| find_trait(definition, traits));

        let comparable_type = found
            .trait_definition
            .as_ref()
            .map(|definition| definition.comparable_type)
            .unwrap_or_default();

        let mut left = Cow::Borrowed(found.value.as_str());
        if comparable_type == ComparableType::Int {
            if let Some(added) = self.options.added_usage(condition.event_subtype.as_deref()) {
                let total = string_to_i64(&left).saturating_add(added);
                left = Cow::Owned(total.to_string());
            }
        }

        let right = comparison
            .as_ref()
            .map_or(condition.trait_value.as_str(), |t| t.value.as_str());

        compare(&left, right, comparable_type, condition.operator)
    }

    fn check_credit_condition(&self, condition: &Condition) -> bool {
        let (Some(company), Some(credit_id)) = (self.company, condition.credit_id.as_deref()) else {
            return false;
        };

        let rate = condition.consumption_rate.unwrap_or(1.0);
        let balance = company.credit_balance(credit_id);
        let event_subtype = condition.event_subtype.as_deref();

        let needed = if let Some(usage) = self.options.generic_usage() {
            usage as f64 * rate
        } else if let Some(usage) =
            event_subtype.and_then(|event| self.options.event_usage_for(event))
        {
            usage as f64 * rate
        } else if let Some(event) = event_subtype {
            let consumed = company.metrics.value_of(
                event,
                condition.metric_period,
                condition.metric_period_month_reset,
            );
            consumed as f64 * rate
        } else {
            // a flat charge of one unit
            rate
        };

        balance >= needed
    }
}

fn invert_on_ne(matched: bool, operator: ComparableOperator) -> bool {
    if operator == ComparableOperator::Ne {
        !matched
    } else {
        matched
    }
}

/// The entity's trait for `definition`, or an empty placeholder carrying only
/// the definition when the entity has no such trait.
fn find_trait<'t>(definition: &TraitDefinition, traits: &'t [Trait]) -> Cow<'t, Trait> {
    match Trait::find_by_definition_id(traits, &definition.id) {
        Some(found) => Cow::Borrowed(found),
        None => Cow::Owned(Trait {
            trait_definition: Some(definition.clone()),
            value: String::new(),
        }),
    }
}
