use chrono::{DateTime, Utc};

use crate::comparison::comparison_models::{ComparableOperator, ComparableType};
use crate::comparison::type_conversion::{string_to_bool, string_to_date, string_to_i64};

/// Compares two raw values after coercing both to `comparable_type`.
pub fn compare(
    left: &str,
    right: &str,
    comparable_type: ComparableType,
    operator: ComparableOperator,
) -> bool {
    match comparable_type {
        ComparableType::String => compare_string(left, right, operator),
        ComparableType::Int => compare_i64(string_to_i64(left), string_to_i64(right), operator),
        ComparableType::Bool => compare_bool(string_to_bool(left), string_to_bool(right), operator),
        ComparableType::Date => {
            compare_date(string_to_date(left), string_to_date(right), operator)
        }
    }
}

pub fn compare_bool(left: bool, right: bool, operator: ComparableOperator) -> bool {
    match operator {
        ComparableOperator::Eq => left == right,
        ComparableOperator::Ne => left != right,
        // a boolean always has a value
        ComparableOperator::IsEmpty => false,
        ComparableOperator::NotEmpty => true,
        ComparableOperator::Gt
        | ComparableOperator::Lt
        | ComparableOperator::Gte
        | ComparableOperator::Lte => false,
    }
}

pub fn compare_i64(left: i64, right: i64, operator: ComparableOperator) -> bool {
    match operator {
        ComparableOperator::Eq => left == right,
        ComparableOperator::Ne => left != right,
        ComparableOperator::Gt => left > right,
        ComparableOperator::Lt => left < right,
        ComparableOperator::Gte => left >= right,
        ComparableOperator::Lte => left <= right,
        ComparableOperator::IsEmpty => left == 0,
        ComparableOperator::NotEmpty => left != 0,
    }
}

pub fn compare_string(left: &str, right: &str, operator: ComparableOperator) -> bool {
    match operator {
        ComparableOperator::Eq => left == right,
        ComparableOperator::Ne => left != right,
        ComparableOperator::Gt => left > right,
        ComparableOperator::Lt => left < right,
        ComparableOperator::Gte => left >= right,
        ComparableOperator::Lte => left <= right,
        ComparableOperator::IsEmpty => left.is_empty(),
        ComparableOperator::NotEmpty => !left.is_empty(),
    }
}

/// Missing dates sort before every real date, and two missing dates are equal.
pub fn compare_date(
    left: Option<DateTime<Utc>>,
    right: Option<DateTime<Utc>>,
    operator: ComparableOperator,
) -> bool {
    match operator {
        ComparableOperator::Eq => left == right,
        ComparableOperator::Ne => left != right,
        ComparableOperator::Gt => match (left, right) {
            (None, _) => false,
            (Some(_), None) => true,
            (Some(left), Some(right)) => left > right,
        },
        ComparableOperator::Lt => match (left, right) {
            (_, None) => false,
            (None, Some(_)) => true,
            (Some(left), Some(right)) => left < right,
        },
        ComparableOperator::Gte => {
            compare_date(left, right, ComparableOperator::Eq)
                || compare_date(left, right, ComparableOperator::Gt)
        }
        ComparableOperator::Lte => {
            compare_date(left, right, ComparableOperator::Eq)
                || compare_date(left, right, ComparableOperator::Lt)
        }
        ComparableOperator::IsEmpty => left.is_none(),
        ComparableOperator::NotEmpty => left.is_some(),
    }
}
