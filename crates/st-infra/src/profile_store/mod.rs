//! REST profile document store.
//!
//! Adapter over the hosted document database: read-by-id plus merge writes
//! keyed by the authenticated identity. Every write goes through the commit
//! endpoint so the field update and the server-side `updatedAt` stamp land
//! atomically.

mod wire;

pub use wire::{
    completion_fields, fields_to_profile, profile_to_fields, update_to_fields, WireDocument,
    WireValue,
};

use std::collections::BTreeMap;
use std::sync::Arc;

use async_trait::async_trait;
use serde::Serialize;
use tracing::{debug, warn};

use st_core::auth::StoreError;
use st_core::config::StoreConfig;
use st_core::ports::ProfileStorePort;
use st_core::profile::{ProfileUpdate, UserProfile};

use wire::{CREATED_AT_FIELD, UPDATED_AT_FIELD};

/// Where the store gets its bearer token: the identity gateway's live
/// session.
#[async_trait]
pub trait TokenSource: Send + Sync {
    async fn bearer_token(&self) -> Option<String>;
}

#[async_trait]
impl TokenSource for crate::identity::RestIdentityGateway {
    async fn bearer_token(&self) -> Option<String> {
        use st_core::ports::IdentityGatewayPort;
        self.id_token().await
    }
}

#[derive(Debug, Serialize)]
struct CommitRequest {
    writes: Vec<CommitWrite>,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct CommitWrite {
    #[serde(skip_serializing_if = "Option::is_none")]
    update: Option<WireDocument>,
    #[serde(skip_serializing_if = "Option::is_none")]
    update_mask: Option<DocumentMask>,
    #[serde(skip_serializing_if = "Option::is_none")]
    transform: Option<DocumentTransform>,
    #[serde(skip_serializing_if = "Option::is_none")]
    current_document: Option<Precondition>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentMask {
    field_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct DocumentTransform {
    document: String,
    field_transforms: Vec<FieldTransform>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct FieldTransform {
    field_path: String,
    set_to_server_value: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Precondition {
    exists: bool,
}

pub struct RestProfileStore {
    config: StoreConfig,
    client: reqwest::Client,
    tokens: Arc<dyn TokenSource>,
}

impl RestProfileStore {
    pub fn new(config: StoreConfig, tokens: Arc<dyn TokenSource>) -> Self {
        Self {
            config,
            client: reqwest::Client::new(),
            tokens,
        }
    }

    fn documents_root(&self) -> String {
        format!(
            "projects/{}/databases/(default)/documents",
            self.config.project_id
        )
    }

    fn document_name(&self, uid: &str) -> String {
        format!("{}/users/{uid}", self.documents_root())
    }

    fn document_url(&self, uid: &str) -> String {
        format!(
            "{}/{}",
            self.config.base_url.trim_end_matches('/'),
            self.document_name(uid)
        )
    }

    fn commit_url(&self) -> String {
        format!(
            "{}/{}:commit",
            self.config.base_url.trim_end_matches('/'),
            self.documents_root()
        )
    }

    async fn bearer(&self) -> Result<String, StoreError> {
        self.tokens
            .bearer_token()
            .await
            .ok_or(StoreError::NotAuthenticated)
    }

    fn stamp_transform(&self, uid: &str, fields: &'static [&'static str]) -> CommitWrite {
        CommitWrite {
            transform: Some(DocumentTransform {
                document: self.document_name(uid),
                field_transforms: fields
                    .iter()
                    .map(|field| FieldTransform {
                        field_path: (*field).to_string(),
                        set_to_server_value: "REQUEST_TIME",
                    })
                    .collect(),
            }),
            ..CommitWrite::default()
        }
    }

    /// One atomic commit: the field write plus the server-time stamp.
    async fn commit(
        &self,
        uid: &str,
        fields: BTreeMap<String, WireValue>,
        mask: Option<Vec<String>>,
        must_exist: Option<bool>,
        stamps: &'static [&'static str],
    ) -> Result<(), StoreError> {
        let token = self.bearer().await?;

        let request = CommitRequest {
            writes: vec![
                CommitWrite {
                    update: Some(WireDocument {
                        name: Some(self.document_name(uid)),
                        fields,
                        create_time: None,
                        update_time: None,
                    }),
                    update_mask: mask.map(|field_paths| DocumentMask { field_paths }),
                    current_document: must_exist.map(|exists| Precondition { exists }),
                    ..CommitWrite::default()
                },
                self.stamp_transform(uid, stamps),
            ],
        };

        let response = self
            .client
            .post(self.commit_url())
            .bearer_auth(&token)
            .json(&request)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status.is_success() {
            debug!(uid, "profile commit accepted");
            return Ok(());
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(StoreError::NotAuthenticated);
        }
        let body = response.text().await.unwrap_or_default();
        warn!(uid, %status, "profile commit rejected");
        Err(StoreError::Unavailable(format!("{status}: {body}")))
    }
}

#[async_trait]
impl ProfileStorePort for RestProfileStore {
    async fn read_profile(&self, uid: &str) -> Result<Option<UserProfile>, StoreError> {
        let token = self.bearer().await?;

        let response = self
            .client
            .get(self.document_url(uid))
            .bearer_auth(&token)
            .send()
            .await
            .map_err(|err| StoreError::Unavailable(err.to_string()))?;

        let status = response.status();
        if status.as_u16() == 404 {
            return Ok(None);
        }
        if status.as_u16() == 401 || status.as_u16() == 403 {
            return Err(StoreError::NotAuthenticated);
        }
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(StoreError::Unavailable(format!("{status}: {body}")));
        }

        let document: WireDocument = response
            .json()
            .await
            .map_err(|err| StoreError::Unavailable(format!("malformed document: {err}")))?;
        Ok(Some(fields_to_profile(uid, &document.fields)))
    }

    async fn create_profile(&self, uid: &str, profile: &UserProfile) -> Result<(), StoreError> {
        self.commit(
            uid,
            profile_to_fields(profile),
            None,
            None,
            &[CREATED_AT_FIELD, UPDATED_AT_FIELD],
        )
        .await
    }

    async fn write_partial(&self, uid: &str, update: &ProfileUpdate) -> Result<(), StoreError> {
        let (fields, mask) = update_to_fields(update);
        self.commit(uid, fields, Some(mask), Some(true), &[UPDATED_AT_FIELD])
            .await
    }

    async fn mark_onboarding_complete(&self, uid: &str) -> Result<(), StoreError> {
        let (fields, mask) = completion_fields();
        self.commit(uid, fields, Some(mask), Some(true), &[UPDATED_AT_FIELD])
            .await
    }
}
