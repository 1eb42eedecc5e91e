use std::time::Duration;

use async_trait::async_trait;
use reqwest::{Client, RequestBuilder, Response, StatusCode};
use serde::de::DeserializeOwned;
use tracing::{debug, warn};

use super::types::{
    error_message, Label, LabelListResult, MessageListPage, MessageRef, MessageResource, Profile,
    RawLabel, RawMessage, UserInfo, UNABLE_TO_LOAD,
};
use super::{ApiError, MessageQuery, MessagingApi};
use crate::config::AppConfig;
use crate::credentials::Credential;
use crate::types::Person;

/// Gmail REST client bound to one credential
pub struct GmailClient {
    client: Client,
    base_url: String,
    userinfo_url: String,
    credential: Credential,
}

impl GmailClient {
    pub fn new(config: &AppConfig, credential: Credential) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(Duration::from_secs(config.request_timeout_secs))
            .build()
            .map_err(|e| ApiError::Network(format!("HTTP client error: {}", e)))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
            userinfo_url: config.userinfo_url.clone(),
            credential,
        })
    }

    fn labels_url(&self) -> String {
        format!("{}/labels", self.base_url)
    }

    fn messages_url(&self) -> String {
        format!("{}/messages", self.base_url)
    }

    fn message_url(&self, id: &str) -> String {
        format!("{}/messages/{}", self.base_url, id)
    }

    fn list_request(&self, query: &MessageQuery) -> RequestBuilder {
        let mut params = vec![
            ("labelIds", query.label_id.clone()),
            ("q", query.q.clone()),
            ("maxResults", query.max_results.to_string()),
        ];
        if let Some(token) = &query.page_token {
            params.push(("pageToken", token.clone()));
        }
        self.client.get(self.messages_url()).query(&params)
    }

    fn label_request(&self, label_id: &str, max_results: u32) -> RequestBuilder {
        self.client.get(self.messages_url()).query(&[
            ("labelIds", label_id.to_string()),
            ("maxResults", max_results.to_string()),
        ])
    }

    fn metadata_request(&self, id: &str) -> RequestBuilder {
        self.client
            .get(self.message_url(id))
            .query(&[("format", "metadata"), ("metadataHeaders", "Subject")])
    }

    fn authorized(&self, builder: RequestBuilder) -> RequestBuilder {
        builder.bearer_auth(self.credential.secret())
    }

    async fn send(&self, builder: RequestBuilder, what: &str) -> Result<Response, ApiError> {
        let response = self
            .authorized(builder)
            .send()
            .await
            .map_err(|e| ApiError::Network(format!("{} failed: {}", what, e)))?;
        check_status(response, what).await
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        builder: RequestBuilder,
        what: &str,
    ) -> Result<T, ApiError> {
        self.send(builder, what)
            .await?
            .json::<T>()
            .await
            .map_err(|e| ApiError::InvalidResponse(format!("{}: {}", what, e)))
    }

    /// Mailbox address of the credential's owner
    pub async fn profile(&self) -> Result<Profile, ApiError> {
        let url = format!("{}/profile", self.base_url);
        self.send_json(self.client.get(url), "Get profile").await
    }

    /// The signed-in person from the OAuth userinfo endpoint
    pub async fn userinfo(&self) -> Result<Person, ApiError> {
        let info: UserInfo = self
            .send_json(self.client.get(&self.userinfo_url), "Get userinfo")
            .await?;
        info.into_person()
    }

    /// Subjects of the newest `max_results` messages under `label_id`.
    ///
    /// A message whose metadata cannot be fetched shows as
    /// `UNABLE_TO_LOAD` instead of failing the whole listing.
    pub async fn inbox_subjects(
        &self,
        label_id: &str,
        max_results: u32,
    ) -> Result<Vec<String>, ApiError> {
        let page: MessageListPage = self
            .send_json(self.label_request(label_id, max_results), "List inbox")
            .await?;
        let page = page.validate()?;

        let mut subjects = Vec::with_capacity(page.messages.len());
        for message in &page.messages {
            let subject = match self
                .send_json::<RawMessage>(self.metadata_request(&message.id), "Get metadata")
                .await
            {
                Ok(raw) => raw.subject_or_default(),
                Err(e) => {
                    warn!("Subject of {} unavailable: {}", message.id, e);
                    UNABLE_TO_LOAD.to_string()
                }
            };
            subjects.push(subject);
        }

        debug!("Loaded {} subject(s) from {}", subjects.len(), label_id);
        Ok(subjects)
    }
}

async fn check_status(response: Response, what: &str) -> Result<Response, ApiError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }

    let body = response.text().await.unwrap_or_default();
    let message = error_message(status.as_u16(), &body);
    warn!("{} failed: {} {}", what, status.as_u16(), message);

    match status {
        StatusCode::UNAUTHORIZED => Err(ApiError::Unauthorized),
        StatusCode::CONFLICT => Err(ApiError::Conflict(message)),
        _ => Err(ApiError::Status {
            status: status.as_u16(),
            message,
        }),
    }
}

#[async_trait]
impl MessagingApi for GmailClient {
    async fn list_labels(&self) -> Result<Vec<Label>, ApiError> {
        let result: LabelListResult = self
            .send_json(self.client.get(self.labels_url()), "List labels")
            .await?;
        let labels = result.into_labels()?;
        debug!("Listed {} labels", labels.len());
        Ok(labels)
    }

    async fn create_label(&self, name: &str) -> Result<Label, ApiError> {
        let body = serde_json::json!({ "name": name });
        let raw: RawLabel = self
            .send_json(self.client.post(self.labels_url()).json(&body), "Create label")
            .await?;
        raw.into_label()
    }

    async fn list_messages(&self, query: &MessageQuery) -> Result<MessageListPage, ApiError> {
        let page: MessageListPage = self
            .send_json(self.list_request(query), "List messages")
            .await?;
        page.validate()
    }

    async fn get_message(&self, id: &str) -> Result<MessageResource, ApiError> {
        let raw: RawMessage = self
            .send_json(self.client.get(self.message_url(id)), "Get message")
            .await?;
        MessageResource::try_from(raw)
    }

    async fn delete_message(&self, id: &str) -> Result<(), ApiError> {
        self.send(self.client.delete(self.message_url(id)), "Delete message")
            .await?;
        Ok(())
    }

    async fn insert_message(&self, raw: &str, label_id: &str) -> Result<MessageRef, ApiError> {
        let body = serde_json::json!({
            "raw": raw,
            "labelIds": [label_id],
        });
        self.send_json(
            self.client.post(self.messages_url()).json(&body),
            "Insert message",
        )
        .await
    }
}
