use anyhow::Result;
use assert_json_diff::assert_json_include;
use serde_json::{json, Value};

use rules_engine::host::check_flag_json;

fn check(input: Value) -> Result<Value> {
    Ok(serde_json::from_str(&check_flag_json(&input.to_string()))?)
}

#[test]
fn test_checks_a_flag_from_json() -> Result<()> {
    let output = check(json!({
        "company": {
            "id": "comp_1",
            "account_id": "acct_1",
            "environment_id": "env_1",
            "plan_ids": ["plan_pro"],
            "metrics": [{
                "account_id": "acct_1",
                "environment_id": "env_1",
                "company_id": "comp_1",
                "event_subtype": "api-call",
                "period": "all_time",
                "month_reset": "first_of_month",
                "value": 70,
                "created_at": "2024-01-15T21:59:40.162Z",
                "valid_until": null
            }],
            "traits": null,
            "rules": null
        },
        "user": {"id": "user_1", "traits": [], "rules": []},
        "flag": {
            "id": "flag_1",
            "key": "api-access",
            "default_value": false,
            "rules": [{
                "id": "rule_1",
                "flag_id": "flag_1",
                "rule_type": "plan_entitlement",
                "name": "Pro plan",
                "priority": 0,
                "value": true,
                "condition_groups": [],
                "conditions": [{
                    "id": "cond_1",
                    "condition_type": "metric",
                    "operator": "lte",
                    "event_subtype": "api-call",
                    "metric_value": 100,
                    "metric_period": "all_time",
                    "resource_ids": null
                }]
            }]
        },
        "event_usage": {"api-call": 25}
    }))?;

    assert_json_include!(
        actual: output.clone(),
        expected: json!({
            "result": {
                "company_id": "comp_1",
                "user_id": "user_1",
                "flag_id": "flag_1",
                "flag_key": "api-access",
                "rule_id": "rule_1",
                "rule_type": "plan_entitlement",
                "value": true,
                "reason": "Matched plan entitlement rule \"Pro plan\" (rule_1)",
                "feature_usage": 70,
                "feature_allocation": 100,
                "feature_usage_event": "api-call",
                "feature_usage_period": "all_time"
            }
        })
    );
    assert!(output.get("error").is_none());
    // all-time counters never reset
    assert!(output["result"].get("feature_usage_reset_at").is_none());

    Ok(())
}

#[test]
fn test_reports_rule_errors_with_a_result() -> Result<()> {
    let output = check(json!({
        "company": {"id": "comp_1"},
        "flag": {
            "id": "flag_1",
            "key": "api-access",
            "default_value": true,
            "rules": [{
                "id": "rule_1",
                "rule_type": "standard",
                "value": false,
                "conditions": [{
                    "id": "cond_1",
                    "condition_type": "metric",
                    "operator": "lte",
                    "event_subtype": "api-call"
                }]
            }]
        }
    }))?;

    assert_json_include!(
        actual: output,
        expected: json!({
            "result": {
                "flag_id": "flag_1",
                "value": true,
                "reason": "Server error; rule evaluation failed",
                "rule_type": null
            },
            "error": "expected metric value for condition cond_1, but received none"
        })
    );

    Ok(())
}

#[test]
fn test_reports_missing_flags_through_the_reason() -> Result<()> {
    let output = check(json!({"company": {"id": "comp_1"}, "usage": 5}))?;

    assert_json_include!(
        actual: output.clone(),
        expected: json!({
            "result": {
                "reason": "Flag not found",
                "value": false
            }
        })
    );
    assert!(output.get("error").is_none());

    Ok(())
}

#[test]
fn test_rejects_unknown_operators() -> Result<()> {
    let output = check(json!({
        "flag": {
            "id": "flag_1",
            "key": "api-access",
            "rules": [{
                "id": "rule_1",
                "rule_type": "standard",
                "conditions": [{"id": "cond_1", "condition_type": "plan", "operator": "contains"}]
            }]
        }
    }))?;

    assert_eq!(output["result"], Value::Null);
    assert!(output["error"]
        .as_str()
        .is_some_and(|error| error.starts_with("failed to parse input")));

    Ok(())
}
