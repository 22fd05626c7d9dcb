pub mod flag_check;
pub mod flag_models;

pub use flag_check::{check_flag, check_flag_at};
pub use flag_models::{CheckFlagOptions, CheckFlagResult, Flag};
