use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field from an explicit `null`.
///
/// Use together with `#[serde(default)]`: absent → `None`, `null` →
/// `Some(None)`, value → `Some(Some(v))`.
pub fn deserialize_nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

/// Applies a tri-state patch to an optional field.
pub fn apply_nullable<T>(current: &mut Option<T>, patch: Option<Option<T>>) {
    if let Some(value) = patch {
        *current = value;
    }
}
