use serde::{Deserialize, Serialize};

use crate::auth::Session;

/// Account identity returned by the auth endpoints and carried in the
/// session.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub username: String,
    pub email: String,
}

impl User {
    pub fn display_name(&self) -> &str {
        if self.username.is_empty() {
            &self.email
        } else {
            &self.username
        }
    }
}

/// Result of a registration call.
///
/// The service may answer registration with a full token pair, in which
/// case the client is logged in immediately; without tokens the account
/// exists but the user still has to log in.
#[derive(Debug, Clone)]
pub enum RegisterOutcome {
    /// Registration returned tokens; the session is committed.
    LoggedIn(Session),
    /// Registration succeeded without auto-login.
    Registered,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_user() {
        let json = r#"{"id": 42, "username": "stagehand", "email": "crew@example.com"}"#;
        let user: User = serde_json::from_str(json).expect("Failed to parse user JSON");
        assert_eq!(user.id, 42);
        assert_eq!(user.username, "stagehand");
        assert_eq!(user.display_name(), "stagehand");
    }

    #[test]
    fn test_display_name_falls_back_to_email() {
        let user = User {
            id: 1,
            username: String::new(),
            email: "crew@example.com".to_string(),
        };
        assert_eq!(user.display_name(), "crew@example.com");
    }
}
