//! Deciding which of two entitlements for the same feature a company
//! effectively has.

use crate::entitlements::entitlement_models::EntitlementType;
use crate::metrics::MetricPeriod;

/// Converts an allocation to a per-day rate. `None` for unlimited allocations
/// and for all-time or periodless ones, which have no rate.
pub fn normalize_allocation_to_daily_rate(
    allocation: Option<i64>,
    period: Option<MetricPeriod>,
) -> Option<f64> {
    let allocation = allocation? as f64;
    match period? {
        MetricPeriod::AllTime => None,
        MetricPeriod::CurrentDay => Some(allocation),
        MetricPeriod::CurrentWeek => Some(allocation / 7.0),
        MetricPeriod::CurrentMonth => Some(allocation / 30.0),
    }
}

/// Whether the first allocation is strictly more generous than the second.
/// `None` allocations are unlimited.
///
/// Unlimited beats any limit. A period-scoped allocation beats a periodless
/// one. Two period-scoped allocations compare by daily rate, falling back to
/// the raw values when either has no rate.
pub fn is_allocation_more_generous(
    allocation: Option<i64>,
    period: Option<MetricPeriod>,
    other_allocation: Option<i64>,
    other_period: Option<MetricPeriod>,
) -> bool {
    let (allocation_value, other_value) = match (allocation, other_allocation) {
        (None, None) => return false,
        (None, Some(_)) => return true,
        (Some(_), None) => return false,
        (Some(a), Some(b)) => (a, b),
    };

    match (period, other_period) {
        // trait based entitlements
        (None, None) => allocation_value > other_value,
        (None, Some(_)) => false,
        (Some(_), None) => true,
        (Some(_), Some(_)) => {
            match (
                normalize_allocation_to_daily_rate(allocation, period),
                normalize_allocation_to_daily_rate(other_allocation, other_period),
            ) {
                (Some(rate), Some(other_rate)) => rate > other_rate,
                _ => allocation_value > other_value,
            }
        }
    }
}

/// Company overrides always replace a boolean plan entitlement, including to
/// switch a plan feature off.
pub fn should_boolean_override_win(
    new_type: EntitlementType,
    existing_type: EntitlementType,
) -> bool {
    new_type == EntitlementType::CompanyOverride
        && existing_type == EntitlementType::PlanEntitlement
}

/// A boolean plan entitlement never replaces a company override.
pub fn should_boolean_plan_lose(new_type: EntitlementType, existing_type: EntitlementType) -> bool {
    new_type == EntitlementType::PlanEntitlement
        && existing_type == EntitlementType::CompanyOverride
}
