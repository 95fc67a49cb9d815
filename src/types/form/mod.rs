pub mod admin;
pub mod auth;
pub mod pauses;
pub mod supervisor;

/// Deserializes a field that must distinguish "absent" from "null":
/// combined with `#[serde(default)]`, a missing key stays `None`
/// while an explicit `null` becomes `Some(None)`.
pub(crate) fn double_option<'de, T, D>(
  deserializer: D,
) -> Result<Option<Option<T>>, D::Error>
where
  T: serde::Deserialize<'de>,
  D: serde::Deserializer<'de>,
{
  serde::Deserialize::deserialize(deserializer).map(Some)
}
