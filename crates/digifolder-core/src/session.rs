//! Explicit session context
//!
//! Every service call receives the caller's session instead of looking it up
//! from process-wide state.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::AppError;

/// An authenticated user session, produced by verifying an access token.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionContext {
    pub user_id: Uuid,
    pub email: Option<String>,
    pub expires_at: DateTime<Utc>,
}

impl SessionContext {
    pub fn new(user_id: Uuid, email: Option<String>, expires_at: DateTime<Utc>) -> Self {
        Self {
            user_id,
            email,
            expires_at,
        }
    }

    pub fn is_active(&self) -> bool {
        self.expires_at > Utc::now()
    }

    /// Fails with `AppError::Unauthorized` once the session has expired.
    pub fn ensure_active(&self) -> Result<&Self, AppError> {
        if self.is_active() {
            Ok(self)
        } else {
            Err(AppError::Unauthorized(format!(
                "session for user {} expired at {}",
                self.user_id, self.expires_at
            )))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    #[test]
    fn test_active_session_passes() {
        let session = SessionContext::new(Uuid::new_v4(), None, Utc::now() + Duration::hours(1));
        assert!(session.ensure_active().is_ok());
    }

    #[test]
    fn test_expired_session_is_unauthorized() {
        let session = SessionContext::new(Uuid::new_v4(), None, Utc::now() - Duration::seconds(1));
        assert!(matches!(
            session.ensure_active(),
            Err(AppError::Unauthorized(_))
        ));
    }
}
