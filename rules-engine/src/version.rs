//! A short fingerprint of the wire models. Callers namespace cached
//! evaluation inputs with it so that a model change invalidates them.

use std::collections::BTreeSet;

use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use serde::Serialize;
use serde_json::Value;
use sha1::{Digest, Sha1};
use strum::VariantNames;

use crate::accounts::{Company, Subscription, User};
use crate::comparison::{ComparableOperator, ComparableType};
use crate::entitlements::{EntitlementType, EntitlementValueType, FeatureEntitlement};
use crate::flags::{CheckFlagResult, Flag};
use crate::metrics::{CompanyMetric, MetricPeriod, MetricPeriodMonthReset};
use crate::rules::{
    Condition, ConditionGroup, ConditionType, EntityType, Rule, RuleType, Trait, TraitDefinition,
};

static VERSION_KEY: Lazy<String> = Lazy::new(compute_version_key);

/// First 8 hex characters of a SHA-1 over every serialized field path and
/// enum variant. Computed once per process.
pub fn version_key() -> &'static str {
    VERSION_KEY.as_str()
}

fn compute_version_key() -> String {
    let mut hasher = Sha1::new();
    for line in schema_lines() {
        hasher.update(line.as_bytes());
        hasher.update(b"\n");
    }
    let digest = hex::encode(hasher.finalize());
    digest[..8].to_string()
}

fn schema_lines() -> BTreeSet<String> {
    let mut lines = BTreeSet::new();

    collect_paths("company", &to_value(&exemplar_company()), &mut lines);
    collect_paths("user", &to_value(&exemplar_user()), &mut lines);
    collect_paths("flag", &to_value(&exemplar_flag()), &mut lines);
    collect_paths("check_flag_result", &to_value(&exemplar_result()), &mut lines);

    let enums: [(&str, &[&str]); 9] = [
        ("comparable_operator", ComparableOperator::VARIANTS),
        ("comparable_type", ComparableType::VARIANTS),
        ("condition_type", ConditionType::VARIANTS),
        ("entitlement_type", EntitlementType::VARIANTS),
        ("entitlement_value_type", EntitlementValueType::VARIANTS),
        ("entity_type", EntityType::VARIANTS),
        ("metric_period", MetricPeriod::VARIANTS),
        ("metric_period_month_reset", MetricPeriodMonthReset::VARIANTS),
        ("rule_type", RuleType::VARIANTS),
    ];
    for (name, variants) in enums {
        for variant in variants {
            lines.insert(format!("{}={}", name, variant));
        }
    }

    lines
}

fn to_value<T: Serialize>(model: &T) -> Value {
    serde_json::to_value(model).unwrap_or(Value::Null)
}

fn collect_paths(prefix: &str, value: &Value, paths: &mut BTreeSet<String>) {
    match value {
        Value::Object(map) => {
            for (key, child) in map {
                let path = format!("{}.{}", prefix, key);
                collect_paths(&path, child, paths);
                paths.insert(path);
            }
        }
        Value::Array(items) => {
            let path = format!("{}[]", prefix);
            for item in items {
                collect_paths(&path, item, paths);
            }
        }
        _ => {}
    }
}

// Exemplars populate every optional field and list so that each one shows up
// in the serialized form. Maps stay empty since their keys are data.

fn exemplar_trait_definition() -> TraitDefinition {
    TraitDefinition {
        id: String::new(),
        comparable_type: ComparableType::default(),
        entity_type: EntityType::default(),
    }
}

fn exemplar_trait() -> Trait {
    Trait {
        trait_definition: Some(exemplar_trait_definition()),
        value: String::new(),
    }
}

fn exemplar_condition() -> Condition {
    Condition {
        id: String::new(),
        account_id: String::new(),
        environment_id: String::new(),
        condition_type: ConditionType::Metric,
        operator: ComparableOperator::default(),
        resource_ids: vec![String::new()],
        event_subtype: Some(String::new()),
        metric_value: Some(0),
        metric_period: Some(MetricPeriod::default()),
        metric_period_month_reset: Some(MetricPeriodMonthReset::default()),
        credit_id: Some(String::new()),
        consumption_rate: Some(0.0),
        trait_definition: Some(exemplar_trait_definition()),
        trait_value: String::new(),
        comparison_trait_definition: Some(exemplar_trait_definition()),
    }
}

fn exemplar_rule() -> Rule {
    Rule {
        id: String::new(),
        flag_id: Some(String::new()),
        account_id: String::new(),
        environment_id: String::new(),
        rule_type: RuleType::Standard,
        name: String::new(),
        priority: 0,
        conditions: vec![exemplar_condition()],
        condition_groups: vec![ConditionGroup {
            conditions: vec![exemplar_condition()],
        }],
        value: false,
    }
}

fn exemplar_entitlement() -> FeatureEntitlement {
    FeatureEntitlement {
        feature_id: String::new(),
        feature_key: String::new(),
        value_type: EntitlementValueType::default(),
        allocation: Some(0),
        usage: Some(0),
        metric_period: Some(MetricPeriod::default()),
        month_reset: Some(MetricPeriodMonthReset::default()),
        metric_reset_at: Some(DateTime::<Utc>::UNIX_EPOCH),
        credit_id: Some(String::new()),
        credit_total: Some(0.0),
        credit_used: Some(0.0),
        credit_remaining: Some(0.0),
    }
}

fn exemplar_company() -> Company {
    let company = Company {
        base_plan_id: Some(String::new()),
        billing_product_ids: vec![String::new()],
        crm_product_ids: vec![String::new()],
        plan_ids: vec![String::new()],
        plan_version_ids: vec![String::new()],
        subscription: Some(Subscription::default()),
        traits: vec![exemplar_trait()],
        rules: vec![exemplar_rule()],
        entitlements: vec![exemplar_entitlement()],
        ..Default::default()
    };
    company.add_metric(CompanyMetric {
        valid_until: Some(DateTime::<Utc>::UNIX_EPOCH),
        ..Default::default()
    });
    company
}

fn exemplar_user() -> User {
    User {
        traits: vec![exemplar_trait()],
        rules: vec![exemplar_rule()],
        ..Default::default()
    }
}

fn exemplar_flag() -> Flag {
    Flag {
        rules: vec![exemplar_rule()],
        ..Default::default()
    }
}

fn exemplar_result() -> CheckFlagResult {
    CheckFlagResult {
        company_id: Some(String::new()),
        feature_allocation: Some(0),
        feature_usage: Some(0),
        feature_usage_event: Some(String::new()),
        feature_usage_period: Some(MetricPeriod::default()),
        feature_usage_reset_at: Some(DateTime::<Utc>::UNIX_EPOCH),
        flag_id: Some(String::new()),
        rule_id: Some(String::new()),
        rule_type: Some(RuleType::Standard),
        user_id: Some(String::new()),
        ..Default::default()
    }
}
