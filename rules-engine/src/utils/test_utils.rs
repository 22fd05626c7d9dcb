use chrono::{Duration, Utc};
use rand::{distributions::Alphanumeric, Rng};

use crate::accounts::{Company, Subscription, User};
use crate::comparison::{ComparableOperator, ComparableType};
use crate::flags::Flag;
use crate::metrics::{CompanyMetric, MetricPeriod, MetricPeriodMonthReset};
use crate::rules::{Condition, ConditionType, EntityType, Rule, RuleType, Trait, TraitDefinition};

pub fn random_string(prefix: &str, length: usize) -> String {
    let suffix: String = rand::thread_rng()
        .sample_iter(Alphanumeric)
        .take(length)
        .map(char::from)
        .collect();
    format!("{}{}", prefix, suffix.to_lowercase())
}

pub fn random_id(prefix: &str) -> String {
    random_string(&format!("{}_", prefix), 12)
}

pub fn create_test_subscription() -> Subscription {
    let now = Utc::now();
    Subscription {
        id: random_id("bilsub"),
        period_start: now - Duration::days(30),
        period_end: now + Duration::days(30),
    }
}

pub fn create_test_company() -> Company {
    Company {
        id: random_id("comp"),
        account_id: random_id("acct"),
        environment_id: random_id("env"),
        base_plan_id: Some(random_id("plan")),
        billing_product_ids: vec![random_id("bilp"), random_id("bilp")],
        plan_ids: vec![random_id("plan"), random_id("plan")],
        plan_version_ids: vec![random_id("plnv"), random_id("plnv")],
        subscription: Some(create_test_subscription()),
        ..Default::default()
    }
}

pub fn create_test_user() -> User {
    User {
        id: random_id("user"),
        account_id: random_id("acct"),
        environment_id: random_id("env"),
        ..Default::default()
    }
}

pub fn create_test_flag(rules: Vec<Rule>, default_value: bool) -> Flag {
    Flag {
        id: random_id("flag"),
        account_id: random_id("acct"),
        environment_id: random_id("env"),
        key: random_string("flag-", 8),
        rules,
        default_value,
    }
}

/// A standard rule with priority 1 that evaluates to `true`.
pub fn create_test_rule() -> Rule {
    Rule {
        id: random_id("rule"),
        flag_id: None,
        account_id: random_id("acct"),
        environment_id: random_id("env"),
        rule_type: RuleType::Standard,
        name: random_string("rule ", 6),
        priority: 1,
        conditions: Vec::new(),
        condition_groups: Vec::new(),
        value: true,
    }
}

pub fn create_test_rule_with(rule_type: RuleType, conditions: Vec<Condition>, value: bool) -> Rule {
    Rule {
        rule_type,
        conditions,
        value,
        ..create_test_rule()
    }
}

/// A condition of the given type with `eq` and the payload that type needs
/// to be meaningful. Metric conditions track an all-time counter.
pub fn create_test_condition(condition_type: ConditionType) -> Condition {
    let mut condition = Condition {
        id: random_id("cond"),
        account_id: random_id("acct"),
        environment_id: random_id("env"),
        condition_type,
        operator: ComparableOperator::Eq,
        resource_ids: Vec::new(),
        event_subtype: None,
        metric_value: None,
        metric_period: None,
        metric_period_month_reset: None,
        credit_id: None,
        consumption_rate: None,
        trait_definition: None,
        trait_value: String::new(),
        comparison_trait_definition: None,
    };

    match condition_type {
        ConditionType::Metric => {
            condition.event_subtype = Some(random_string("event-", 6));
            condition.metric_value = Some(rand::thread_rng().gen_range(1..1_000));
            condition.metric_period = Some(MetricPeriod::AllTime);
            condition.metric_period_month_reset = Some(MetricPeriodMonthReset::FirstOfMonth);
        }
        ConditionType::Trait => {
            condition.trait_definition = Some(create_test_trait_definition(
                ComparableType::Int,
                EntityType::Company,
            ));
            condition.trait_value = random_string("", 6);
        }
        ConditionType::Credit => {
            condition.credit_id = Some(random_id("bcrd"));
        }
        _ => {}
    }

    condition
}

pub fn create_test_metric_condition(
    event_subtype: &str,
    operator: ComparableOperator,
    metric_value: i64,
    period: MetricPeriod,
) -> Condition {
    let mut condition = create_test_condition(ConditionType::Metric);
    condition.event_subtype = Some(event_subtype.to_string());
    condition.operator = operator;
    condition.metric_value = Some(metric_value);
    condition.metric_period = Some(period);
    condition
}

pub fn create_test_trait_condition(
    definition: &TraitDefinition,
    operator: ComparableOperator,
    trait_value: &str,
) -> Condition {
    let mut condition = create_test_condition(ConditionType::Trait);
    condition.trait_definition = Some(definition.clone());
    condition.operator = operator;
    condition.trait_value = trait_value.to_string();
    condition
}

pub fn create_test_metric(
    company: &Company,
    event_subtype: &str,
    period: MetricPeriod,
    value: i64,
) -> CompanyMetric {
    CompanyMetric {
        account_id: company.account_id.clone(),
        environment_id: company.environment_id.clone(),
        company_id: company.id.clone(),
        event_subtype: event_subtype.to_string(),
        period,
        month_reset: MetricPeriodMonthReset::FirstOfMonth,
        value,
        created_at: Utc::now(),
        valid_until: None,
    }
}

pub fn create_test_trait(value: &str, definition: &TraitDefinition) -> Trait {
    Trait {
        trait_definition: Some(definition.clone()),
        value: value.to_string(),
    }
}

pub fn create_test_trait_definition(
    comparable_type: ComparableType,
    entity_type: EntityType,
) -> TraitDefinition {
    TraitDefinition {
        id: random_id("trt"),
        comparable_type,
        entity_type,
    }
}
