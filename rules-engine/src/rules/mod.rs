pub mod rule_check;
pub mod rule_models;
pub mod rule_prioritization;

pub use rule_check::RuleChecker;
pub use rule_models::{
    Condition, ConditionGroup, ConditionType, EntityType, Rule, RulePrioritizationMethod,
    RuleType, Trait, TraitDefinition, RULE_TYPE_PRIORITY,
};
pub use rule_prioritization::group_rules_by_priority;
