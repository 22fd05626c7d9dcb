pub mod entitlement_effectiveness;
pub mod entitlement_models;

pub use entitlement_effectiveness::{
    is_allocation_more_generous, normalize_allocation_to_daily_rate, should_boolean_override_win,
    should_boolean_plan_lose,
};
pub use entitlement_models::{EntitlementType, EntitlementValueType, FeatureEntitlement};
