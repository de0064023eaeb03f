//! Roles, JWT claims, and auth request/response types.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Staff roles. An identity holds one or more of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    /// Can create invoices and upload attachments.
    Submitter,
    /// Full administrative access over resources and users.
    Manager,
    /// Can review and update invoice state.
    Approver,
}

impl Role {
    /// Canonical lowercase name, as stored and serialized.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Submitter => "submitter",
            Self::Manager => "manager",
            Self::Approver => "approver",
        }
    }

    /// Parses a single role name, case-insensitively. Unknown names
    /// yield `None` so stale entries in stored lists degrade silently.
    #[must_use]
    pub fn parse(raw: &str) -> Option<Self> {
        match raw.trim().to_ascii_lowercase().as_str() {
            "submitter" => Some(Self::Submitter),
            "manager" => Some(Self::Manager),
            "approver" => Some(Self::Approver),
            _ => None,
        }
    }
}

impl std::fmt::Display for Role {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Parses a comma-separated role list as stored on the user row.
/// Duplicates collapse, order of first appearance is kept, unknown
/// names are dropped.
#[must_use]
pub fn parse_role_list(raw: &str) -> Vec<Role> {
    let mut roles = Vec::new();
    for part in raw.split(',') {
        if let Some(role) = Role::parse(part) {
            if !roles.contains(&role) {
                roles.push(role);
            }
        }
    }
    roles
}

/// Formats a role list back into its comma-separated stored form.
#[must_use]
pub fn format_role_list(roles: &[Role]) -> String {
    roles
        .iter()
        .map(|r| r.as_str())
        .collect::<Vec<_>>()
        .join(",")
}

/// JWT claims for access tokens.
///
/// The role set is frozen at issuance: later role changes do not
/// retroactively affect unexpired tokens.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// Subject (user ID).
    pub sub: Uuid,
    /// Role-set snapshot taken at issuance.
    pub roles: Vec<Role>,
    /// Issued at (unix seconds).
    pub iat: i64,
    /// Expiration (unix seconds).
    pub exp: i64,
}

impl Claims {
    /// Creates new claims for a user.
    #[must_use]
    pub fn new(user_id: Uuid, roles: &[Role], expires_at: DateTime<Utc>) -> Self {
        Self {
            sub: user_id,
            roles: roles.to_vec(),
            iat: Utc::now().timestamp(),
            exp: expires_at.timestamp(),
        }
    }

    /// Returns the user ID from the claims.
    #[must_use]
    pub const fn user_id(&self) -> Uuid {
        self.sub
    }

    /// True if the snapshot holds at least one of the given roles.
    #[must_use]
    pub fn has_any(&self, allowed: &[Role]) -> bool {
        self.roles.iter().any(|r| allowed.contains(r))
    }

    /// True if the token's expiry has passed at the given instant.
    #[must_use]
    pub fn is_expired_at(&self, now: DateTime<Utc>) -> bool {
        now.timestamp() >= self.exp
    }
}

/// Login request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
}

/// Registration request payload.
#[derive(Debug, Clone, Deserialize)]
pub struct RegisterRequest {
    /// User email.
    pub email: String,
    /// User password.
    pub password: String,
    /// User full name.
    pub full_name: String,
}

/// Login response payload.
#[derive(Debug, Clone, Serialize)]
pub struct LoginResponse {
    /// Authenticated user info.
    pub user: UserInfo,
    /// Signed access token.
    pub access_token: String,
    /// Token lifetime in seconds.
    pub expires_in: i64,
}

/// User info returned in auth responses.
#[derive(Debug, Clone, Serialize)]
pub struct UserInfo {
    /// User ID.
    pub id: Uuid,
    /// User email.
    pub email: String,
    /// User full name.
    pub full_name: String,
    /// Roles held by the user.
    pub roles: Vec<Role>,
}

/// Password change request.
#[derive(Debug, Clone, Deserialize)]
pub struct ChangePasswordRequest {
    /// The new password.
    pub password: String,
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("submitter", Some(Role::Submitter))]
    #[case("MANAGER", Some(Role::Manager))]
    #[case("  approver ", Some(Role::Approver))]
    #[case("admin", None)]
    #[case("", None)]
    fn parse_single_role(#[case] raw: &str, #[case] expected: Option<Role>) {
        assert_eq!(Role::parse(raw), expected);
    }

    #[test]
    fn parse_role_list_dedupes_and_drops_unknown() {
        let roles = parse_role_list("manager,approver,manager,ghost,");
        assert_eq!(roles, vec![Role::Manager, Role::Approver]);
    }

    #[test]
    fn role_list_round_trips() {
        let roles = vec![Role::Submitter, Role::Approver];
        let stored = format_role_list(&roles);
        assert_eq!(stored, "submitter,approver");
        assert_eq!(parse_role_list(&stored), roles);
    }

    #[test]
    fn claims_has_any_matches_intersection() {
        let claims = Claims::new(
            Uuid::new_v4(),
            &[Role::Submitter],
            Utc::now() + chrono::Duration::minutes(5),
        );
        assert!(claims.has_any(&[Role::Submitter, Role::Manager]));
        assert!(!claims.has_any(&[Role::Manager, Role::Approver]));
        assert!(!claims.has_any(&[]));
    }

    #[test]
    fn claims_expiry_check() {
        let now = Utc::now();
        let live = Claims::new(Uuid::new_v4(), &[Role::Manager], now + chrono::Duration::hours(1));
        let dead = Claims::new(Uuid::new_v4(), &[Role::Manager], now - chrono::Duration::hours(1));
        assert!(!live.is_expired_at(now));
        assert!(dead.is_expired_at(now));
    }

    #[test]
    fn role_serializes_lowercase() {
        let json = serde_json::to_string(&Role::Approver).unwrap();
        assert_eq!(json, "\"approver\"");
    }
}
