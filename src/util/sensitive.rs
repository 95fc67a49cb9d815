use serde::{Deserialize, Serialize};
use std::ops::Deref;

/// Wrapper for values that must never leak into logs or traces.
///
/// The [`Debug`] implementation always renders `Sensitive(..)` so that
/// `?config` instrumentation and error reports stay free of secrets.
/// Serialization is transparent; responses that intentionally carry a
/// secret (like a freshly issued token) serialize the inner value.
#[derive(Clone, Default, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Sensitive<T>(T);

impl<T> Sensitive<T> {
  pub const fn new(value: T) -> Self {
    Self(value)
  }

  pub const fn value(&self) -> &T {
    &self.0
  }

  pub fn into_inner(self) -> T {
    self.0
  }
}

impl<T> std::fmt::Debug for Sensitive<T> {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str("Sensitive(..)")
  }
}

impl<T> From<T> for Sensitive<T> {
  fn from(value: T) -> Self {
    Self(value)
  }
}

impl From<&str> for Sensitive<String> {
  fn from(value: &str) -> Self {
    Self(value.to_string())
  }
}

impl<T> Deref for Sensitive<T> {
  type Target = T;

  fn deref(&self) -> &Self::Target {
    &self.0
  }
}

impl<T> AsRef<T> for Sensitive<T> {
  fn as_ref(&self) -> &T {
    &self.0
  }
}

impl AsRef<str> for Sensitive<String> {
  fn as_ref(&self) -> &str {
    &self.0
  }
}

impl AsRef<[u8]> for Sensitive<String> {
  fn as_ref(&self) -> &[u8] {
    self.0.as_bytes()
  }
}

impl<T: Serialize> Serialize for Sensitive<T> {
  fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
  where
    S: serde::Serializer,
  {
    self.0.serialize(serializer)
  }
}

impl<'de, T: Deserialize<'de>> Deserialize<'de> for Sensitive<T> {
  fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
  where
    D: serde::Deserializer<'de>,
  {
    T::deserialize(deserializer).map(Self)
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn test_debug_redacts() {
    let secret = Sensitive::new("hunter2".to_string());
    assert_eq!("Sensitive(..)", format!("{secret:?}"));
  }

  #[test]
  fn test_serde_is_transparent() {
    let secret = Sensitive::new("hunter2".to_string());
    serde_test::assert_tokens(&secret, &[serde_test::Token::Str("hunter2")]);
  }
}
