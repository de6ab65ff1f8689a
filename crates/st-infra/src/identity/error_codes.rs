//! Provider error-code normalization.
//!
//! The identity provider surfaces failures two ways: dotted SDK codes
//! (`auth/email-already-in-use`) and upper-snake REST message codes
//! (`EMAIL_EXISTS`). Both families normalize into the same taxonomy; any
//! unmapped code falls to `Unknown`.

use st_core::auth::AuthError;

pub fn map_auth_code(code: &str) -> AuthError {
    // REST message codes may carry a trailing explanation, e.g.
    // "WEAK_PASSWORD : Password should be at least 6 characters".
    let code = code.split(':').next().unwrap_or(code).trim();

    match code {
        "auth/invalid-credential" | "auth/wrong-password" | "auth/invalid-email"
        | "INVALID_PASSWORD" | "INVALID_LOGIN_CREDENTIALS" | "INVALID_EMAIL" => {
            AuthError::InvalidCredentials
        }
        "auth/email-already-in-use" | "EMAIL_EXISTS" => AuthError::EmailAlreadyInUse,
        "auth/weak-password" | "WEAK_PASSWORD" => AuthError::WeakPassword,
        "auth/user-disabled" | "USER_DISABLED" => AuthError::UserDisabled,
        "auth/user-not-found" | "EMAIL_NOT_FOUND" => AuthError::UserNotFound,
        "auth/operation-not-allowed" | "OPERATION_NOT_ALLOWED" => AuthError::OperationNotAllowed,
        "auth/popup-blocked" => AuthError::PopupBlocked,
        "auth/cancelled-popup-request" => AuthError::ConcurrentPopupRequest,
        "auth/popup-closed-by-user" => AuthError::Cancelled,
        _ => AuthError::Unknown,
    }
}
