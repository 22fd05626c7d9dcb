use chrono::{DateTime, Utc};
use tracing::instrument;

use crate::accounts::{Company, User};
use crate::api::errors::{FlagCheckError, RulesEngineError};
use crate::flags::flag_models::{
    CheckFlagOptions, CheckFlagResult, Flag, REASON_FLAG_NOT_FOUND, REASON_NO_RULES_MATCHED,
    REASON_SERVER_ERROR,
};
use crate::rules::{group_rules_by_priority, RuleChecker};

/// Resolves a flag for a company and/or user.
///
/// An unknown flag is not an error: the result carries
/// [`RulesEngineError::FlagNotFound`] in `err` and a matching reason. Malformed
/// rule data aborts the check and returns the partial result inside the error.
pub fn check_flag(
    company: Option<&Company>,
    user: Option<&User>,
    flag: Option<&Flag>,
    options: &CheckFlagOptions,
) -> Result<CheckFlagResult, FlagCheckError> {
    check_flag_at(company, user, flag, options, Utc::now())
}

/// [`check_flag`] with an explicit clock, used to compute usage reset times.
#[instrument(skip_all, fields(
    flag_id = flag.map(|f| f.id.as_str()),
    company_id = company.map(|c| c.id.as_str()),
    user_id = user.map(|u| u.id.as_str()),
))]
pub fn check_flag_at(
    company: Option<&Company>,
    user: Option<&User>,
    flag: Option<&Flag>,
    options: &CheckFlagOptions,
    now: DateTime<Utc>,
) -> Result<CheckFlagResult, FlagCheckError> {
    let mut result = CheckFlagResult {
        reason: REASON_NO_RULES_MATCHED.to_string(),
        ..Default::default()
    };

    let Some(flag) = flag else {
        tracing::debug!("flag not found");
        result.reason = REASON_FLAG_NOT_FOUND.to_string();
        result.err = Some(RulesEngineError::FlagNotFound);
        return Ok(result);
    };

    result.flag_id = Some(flag.id.clone());
    result.flag_key = flag.key.clone();
    result.value = flag.default_value;
    result.company_id = company.map(|company| company.id.clone());
    result.user_id = user.map(|user| user.id.clone());

    // Rules owned by a company or user only apply to the flag they name
    let company_rules = company
        .into_iter()
        .flat_map(|company| company.rules.iter())
        .filter(|rule| rule.applies_to_flag(&flag.id));
    let user_rules = user
        .into_iter()
        .flat_map(|user| user.rules.iter())
        .filter(|rule| rule.applies_to_flag(&flag.id));

    let groups = group_rules_by_priority(flag.rules.iter().chain(company_rules).chain(user_rules));

    let checker = RuleChecker::new(company, user, options);
    for rule in groups.into_iter().flatten() {
        let matched = match checker.check(Some(rule)) {
            Ok(matched) => matched,
            Err(err) => {
                tracing::warn!(
                    rule_id = %rule.id,
                    error_code = err.error_code(),
                    "rule evaluation failed: {}",
                    err
                );
                result.reason = REASON_SERVER_ERROR.to_string();
                return Err(FlagCheckError::new(result, err));
            }
        };

        if matched {
            result.value = rule.value;
            result.reason = format!(
                "Matched {} rule \"{}\" ({})",
                rule.rule_type.display_name(),
                rule.name,
                rule.id
            );
            result.set_rule_fields(company, user, rule, now);
            tracing::debug!(
                rule_id = %rule.id,
                rule_type = %rule.rule_type,
                value = rule.value,
                "rule matched"
            );
            return Ok(result);
        }
    }

    Ok(result)
}
