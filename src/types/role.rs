use serde::{Deserialize, Serialize};

/// Access level of a user.
///
/// Roles form a total order (`Attendant < Supervisor < Admin`); a
/// capability check for some minimum role passes for every role at or
/// above it. Ownership-style checks (self access, supervisor of the
/// same team) are evaluated separately, see
/// [`User::can_access`](crate::schema::User::can_access).
#[derive(
  Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize, sqlx::Type,
)]
#[serde(rename_all = "snake_case")]
#[sqlx(type_name = "user_role", rename_all = "snake_case")]
pub enum Role {
  Attendant,
  Supervisor,
  Admin,
}

impl Role {
  #[must_use]
  pub const fn as_str(self) -> &'static str {
    match self {
      Self::Attendant => "attendant",
      Self::Supervisor => "supervisor",
      Self::Admin => "admin",
    }
  }
}

impl std::fmt::Display for Role {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    f.write_str(self.as_str())
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use serde_test::Token;

  #[test]
  fn test_ordering() {
    assert!(Role::Attendant < Role::Supervisor);
    assert!(Role::Supervisor < Role::Admin);
    assert!(Role::Admin >= Role::Attendant);
    assert_eq!(
      Role::Admin,
      [Role::Supervisor, Role::Admin, Role::Attendant]
        .into_iter()
        .max()
        .unwrap()
    );
  }

  #[test]
  fn test_serde_impl() {
    serde_test::assert_tokens(
      &Role::Attendant,
      &[Token::UnitVariant {
        name: "Role",
        variant: "attendant",
      }],
    );
    serde_test::assert_tokens(
      &Role::Admin,
      &[Token::UnitVariant {
        name: "Role",
        variant: "admin",
      }],
    );
  }
}
