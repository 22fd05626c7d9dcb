use std::collections::HashMap;

use crate::rules::rule_models::{Rule, RulePrioritizationMethod, RuleType, RULE_TYPE_PRIORITY};

/// Groups rules by type, orders each group by its type's prioritization
/// method and returns the groups in evaluation order. Empty groups and rule
/// types that never apply to flags are left out.
///
/// Sorting is stable, so rules that tie keep the order they were given in.
pub fn group_rules_by_priority<'a, I>(rules: I) -> Vec<Vec<&'a Rule>>
where
    I: IntoIterator<Item = &'a Rule>,
{
    let mut grouped: HashMap<RuleType, Vec<&'a Rule>> = HashMap::new();
    for rule in rules {
        grouped.entry(rule.rule_type).or_default().push(rule);
    }

    RULE_TYPE_PRIORITY
        .iter()
        .filter_map(|rule_type| {
            let mut group = grouped.remove(rule_type)?;
            match rule_type.prioritization_method() {
                RulePrioritizationMethod::Priority => group.sort_by_key(|rule| rule.priority),
                // rules that enable the flag go first
                RulePrioritizationMethod::Optimistic => group.sort_by_key(|rule| !rule.value),
                RulePrioritizationMethod::None => {}
            }
            Some(group)
        })
        .collect()
}
