//! Identity REST payloads.

use serde::Deserialize;

use st_core::auth::ProviderIdentity;

/// Common shape of `signInWithPassword`, `signUp` and `signInWithIdp`
/// responses; only the fields this adapter consumes.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignInResponse {
    pub local_id: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub display_name: Option<String>,
    #[serde(default)]
    pub photo_url: Option<String>,
    pub id_token: String,
}

impl SignInResponse {
    pub fn identity(&self) -> ProviderIdentity {
        ProviderIdentity {
            uid: self.local_id.clone(),
            email: self.email.clone(),
            display_name: self
                .display_name
                .clone()
                .filter(|name| !name.is_empty()),
            photo_url: self.photo_url.clone().filter(|url| !url.is_empty()),
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorPayload {
    #[serde(default)]
    pub error: ErrorBody,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct ErrorBody {
    #[serde(default)]
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sign_in_response_deserializes_camel_case() {
        let json = r#"{
            "localId": "uid-123",
            "email": "a@b.com",
            "displayName": "Riley",
            "idToken": "tok-abc",
            "refreshToken": "ignored",
            "expiresIn": "3600"
        }"#;
        let response: SignInResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.local_id, "uid-123");
        assert_eq!(response.id_token, "tok-abc");

        let identity = response.identity();
        assert_eq!(identity.uid, "uid-123");
        assert_eq!(identity.display_name.as_deref(), Some("Riley"));
        assert_eq!(identity.photo_url, None);
    }

    #[test]
    fn empty_display_name_normalizes_to_none() {
        let json = r#"{"localId": "u", "email": "a@b.com", "displayName": "", "idToken": "t"}"#;
        let response: SignInResponse = serde_json::from_str(json).unwrap();
        assert_eq!(response.identity().display_name, None);
    }

    #[test]
    fn error_payload_tolerates_missing_fields() {
        let payload: ErrorPayload = serde_json::from_str("{}").unwrap();
        assert!(payload.error.message.is_empty());

        let payload: ErrorPayload =
            serde_json::from_str(r#"{"error": {"message": "EMAIL_EXISTS", "code": 400}}"#).unwrap();
        assert_eq!(payload.error.message, "EMAIL_EXISTS");
    }
}
