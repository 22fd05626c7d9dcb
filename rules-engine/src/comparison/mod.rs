pub mod comparison_matching;
pub mod comparison_models;
pub mod type_conversion;

pub use comparison_matching::compare;
pub use comparison_models::{ComparableOperator, ComparableType};
