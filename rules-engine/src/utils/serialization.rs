use serde::{Deserialize, Deserializer};

/// Treats an explicit `null` the same as a missing field. Payloads produced by
/// other services emit `null` for empty lists and maps.
pub fn null_is_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    let opt = Option::deserialize(deserializer)?;
    Ok(opt.unwrap_or_default())
}
