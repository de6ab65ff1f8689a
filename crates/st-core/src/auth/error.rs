use thiserror::Error;

/// Normalized authentication failures.
///
/// Every raw provider error code maps to exactly one of these; the mapping
/// lives in the infrastructure adapter. The display strings are the
/// user-facing messages surfaced in coordinator state.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum AuthError {
    #[error("Invalid email or password.")]
    InvalidCredentials,

    #[error("This email is already registered. Please sign in instead.")]
    EmailAlreadyInUse,

    #[error("Password should be at least 6 characters.")]
    WeakPassword,

    #[error("This account has been disabled.")]
    UserDisabled,

    #[error("No account found with this email.")]
    UserNotFound,

    #[error("This sign-in method is not enabled.")]
    OperationNotAllowed,

    #[error("Popup was blocked. Please allow popups for this site and try again.")]
    PopupBlocked,

    #[error("Please wait for the current sign-in to complete.")]
    ConcurrentPopupRequest,

    /// The user dismissed the sign-in popup. Never surfaced as a
    /// user-visible error.
    #[error("Sign-in was cancelled.")]
    Cancelled,

    #[error("An error occurred during authentication. Please try again.")]
    Unknown,
}

impl AuthError {
    /// Cancellation-class failures are swallowed at the coordinator boundary
    /// instead of populating the visible error field.
    pub fn is_cancellation(&self) -> bool {
        matches!(self, AuthError::Cancelled)
    }
}

/// Profile store failures.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum StoreError {
    #[error("No authenticated user")]
    NotAuthenticated,

    #[error("Profile store unavailable: {0}")]
    Unavailable(String),
}

/// Client-side validation failures, checked before any network call.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValidationError {
    #[error("Passwords do not match")]
    PasswordMismatch,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cancellation_predicate_only_matches_cancelled() {
        assert!(AuthError::Cancelled.is_cancellation());
        assert!(!AuthError::PopupBlocked.is_cancellation());
        assert!(!AuthError::ConcurrentPopupRequest.is_cancellation());
        assert!(!AuthError::Unknown.is_cancellation());
    }

    #[test]
    fn messages_are_user_facing() {
        assert_eq!(
            AuthError::InvalidCredentials.to_string(),
            "Invalid email or password."
        );
        assert_eq!(
            AuthError::EmailAlreadyInUse.to_string(),
            "This email is already registered. Please sign in instead."
        );
        assert_eq!(
            StoreError::NotAuthenticated.to_string(),
            "No authenticated user"
        );
        assert_eq!(
            ValidationError::PasswordMismatch.to_string(),
            "Passwords do not match"
        );
    }
}
