pub mod serialization;
pub mod test_utils;
