//! Named, replaceable documents kept as messages
//!
//! A folder is a label, a document name is a message subject and the
//! document content is the message body. The mailbox allows any number of
//! messages with one subject; the store keeps at most one by deleting every
//! older version before inserting a new one.

use tracing::{debug, info, warn};

use mail_codec::{build, sanitize_subject};

use crate::adapters::gmail::{subject_query, MessageQuery, MessagingApi};
use crate::services::LabelDirectory;
use crate::types::error::{Result, StoreError};

/// Page size when collecting every version of a document
pub const CLEANUP_PAGE_SIZE: u32 = 500;

pub struct DocumentStore<A> {
    api: A,
    labels: LabelDirectory,
}

fn document_name(name: &str) -> Result<String> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "Document name must not be empty".to_string(),
        ));
    }
    Ok(sanitize_subject(name))
}

impl<A: MessagingApi> DocumentStore<A> {
    pub fn new(api: A) -> Self {
        Self {
            api,
            labels: LabelDirectory::new(),
        }
    }

    pub fn api(&self) -> &A {
        &self.api
    }

    pub fn labels(&self) -> &LabelDirectory {
        &self.labels
    }

    /// Current content of `name` in `folder`; `None` when never written
    pub async fn read(&self, folder: &str, name: &str) -> Result<Option<String>> {
        let name = document_name(name)?;
        let label_id = self.labels.resolve(&self.api, folder).await?;

        let id = match self.first_match(&label_id, &name).await? {
            Some(id) => id,
            None => {
                debug!("No document \"{}\" in \"{}\"", name, folder);
                return Ok(None);
            }
        };

        let message = match self.api.get_message(&id).await {
            Ok(message) => message,
            Err(e) if e.is_not_found() => {
                warn!("Message {} for \"{}\" vanished before fetch", id, name);
                return Ok(None);
            }
            Err(e) => {
                return Err(StoreError::StoreUnavailable(format!(
                    "Failed to fetch \"{}\": {}",
                    name, e
                )))
            }
        };

        let content = message.payload.body_text()?;
        debug!("Read \"{}\" from \"{}\" ({} bytes)", name, folder, content.len());
        Ok(Some(content))
    }

    /// Replace `name` in `folder` with `content`.
    ///
    /// Every existing version is deleted before the new one is inserted. On
    /// `WriteFailed` the document may be missing or still have old versions;
    /// retry the whole write.
    pub async fn write(&self, folder: &str, name: &str, content: &str) -> Result<()> {
        let name = document_name(name)?;
        let label_id = self.labels.resolve(&self.api, folder).await?;

        let ids = self.matching_ids(&label_id, &name).await?;
        self.delete_all(&name, &ids).await?;

        let raw = build(folder, &name, content);
        let inserted = self
            .api
            .insert_message(&raw, &label_id)
            .await
            .map_err(|e| {
                StoreError::WriteFailed(format!("Failed to insert \"{}\": {}", name, e))
            })?;

        info!(
            "Wrote \"{}\" to \"{}\" as {} (replaced {})",
            name,
            folder,
            inserted.id,
            ids.len()
        );
        Ok(())
    }

    /// Delete every version of `name`, returning how many were removed
    pub async fn remove(&self, folder: &str, name: &str) -> Result<usize> {
        let name = document_name(name)?;
        let label_id = self.labels.resolve(&self.api, folder).await?;

        let ids = self.matching_ids(&label_id, &name).await?;
        self.delete_all(&name, &ids).await?;

        info!("Removed {} version(s) of \"{}\" from \"{}\"", ids.len(), name, folder);
        Ok(ids.len())
    }

    pub async fn exists(&self, folder: &str, name: &str) -> Result<bool> {
        let name = document_name(name)?;
        let label_id = self.labels.resolve(&self.api, folder).await?;
        Ok(self.first_match(&label_id, &name).await?.is_some())
    }

    async fn first_match(&self, label_id: &str, name: &str) -> Result<Option<String>> {
        let query = MessageQuery::new(label_id, subject_query(name), 1);
        let page = self.api.list_messages(&query).await.map_err(|e| {
            StoreError::StoreUnavailable(format!("Failed to search for \"{}\": {}", name, e))
        })?;
        Ok(page.messages.into_iter().next().map(|m| m.id))
    }

    /// Ids of every message in the label with this subject, across all pages
    async fn matching_ids(&self, label_id: &str, name: &str) -> Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut page_token = None;

        loop {
            let query = MessageQuery::new(label_id, subject_query(name), CLEANUP_PAGE_SIZE)
                .with_page_token(page_token.take());
            let page = self.api.list_messages(&query).await.map_err(|e| {
                StoreError::StoreUnavailable(format!("Failed to list \"{}\": {}", name, e))
            })?;

            ids.extend(page.messages.iter().map(|m| m.id.clone()));
            match page.next_page() {
                Some(token) => page_token = Some(token.to_string()),
                None => break,
            }
        }

        debug!("Found {} version(s) of \"{}\"", ids.len(), name);
        Ok(ids)
    }

    async fn delete_all(&self, name: &str, ids: &[String]) -> Result<()> {
        for (done, id) in ids.iter().enumerate() {
            self.api.delete_message(id).await.map_err(|e| {
                StoreError::WriteFailed(format!(
                    "Failed to delete {} of \"{}\" after {} of {} deletions: {}",
                    id,
                    name,
                    done,
                    ids.len(),
                    e
                ))
            })?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    use mail_codec::Part;

    use crate::adapters::gmail::fake::FakeMailbox;

    fn store() -> (Arc<FakeMailbox>, DocumentStore<Arc<FakeMailbox>>) {
        store_with_page_size(500)
    }

    fn store_with_page_size(size: usize) -> (Arc<FakeMailbox>, DocumentStore<Arc<FakeMailbox>>) {
        let fake = Arc::new(FakeMailbox::with_page_size(size));
        (fake.clone(), DocumentStore::new(fake))
    }

    #[tokio::test]
    async fn test_round_trip() {
        let (_, store) = store();
        for content in ["", "plain", "{\"k\":[1,2]}", "héllo wörld ✓ 日本語", "line1\r\nline2"] {
            store.write("f", "doc", content).await.unwrap();
            assert_eq!(store.read("f", "doc").await.unwrap().as_deref(), Some(content));
        }
    }

    #[tokio::test]
    async fn test_not_found_is_none() {
        let (fake, store) = store();
        assert_eq!(store.read("f", "never-written").await.unwrap(), None);
        assert!(!store.exists("f", "never-written").await.unwrap());
        assert_eq!(fake.calls().get_message, 0);
    }

    #[tokio::test]
    async fn test_replace_leaves_one_version() {
        let (fake, store) = store();
        store.write("f", "n", "c1").await.unwrap();
        store.write("f", "n", "c2").await.unwrap();

        assert_eq!(store.read("f", "n").await.unwrap().as_deref(), Some("c2"));

        let label = store.labels().cached("f").await.unwrap();
        let versions = fake.messages_with_subject(&label, "n");
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].body, "c2");
    }

    #[tokio::test]
    async fn test_names_are_independent() {
        let (_, store) = store();
        store.write("f", "posts", "[]").await.unwrap();
        store.write("f", "following", "{}").await.unwrap();
        store.write("g", "posts", "other").await.unwrap();

        assert_eq!(store.read("f", "posts").await.unwrap().as_deref(), Some("[]"));
        assert_eq!(store.read("f", "following").await.unwrap().as_deref(), Some("{}"));
        assert_eq!(store.read("g", "posts").await.unwrap().as_deref(), Some("other"));
    }

    #[tokio::test]
    async fn test_multi_page_cleanup() {
        let (fake, store) = store_with_page_size(2);
        let label = fake.add_label("f");
        for i in 0..5 {
            fake.seed_message(&label, "n", &format!("stale {}", i));
        }
        fake.seed_message(&label, "other", "keep");

        store.write("f", "n", "fresh").await.unwrap();

        let calls = fake.calls();
        assert_eq!(calls.list_messages, 3);
        assert_eq!(calls.delete_message, 5);
        let versions = fake.messages_with_subject(&label, "n");
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].body, "fresh");
        assert_eq!(fake.messages_with_subject(&label, "other").len(), 1);
    }

    #[tokio::test]
    async fn test_read_returns_newest() {
        let (fake, store) = store();
        let label = fake.add_label("f");
        fake.seed_message(&label, "n", "old");
        fake.seed_message(&label, "n", "new");

        assert_eq!(store.read("f", "n").await.unwrap().as_deref(), Some("new"));
    }

    #[tokio::test]
    async fn test_partial_delete_failure() {
        let (fake, store) = store();
        let label = fake.add_label("f");
        for i in 0..3 {
            fake.seed_message(&label, "n", &i.to_string());
        }
        fake.fail_deletes_after(1);

        let err = store.write("f", "n", "new").await.unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed(_)));
        assert_eq!(fake.calls().insert_message, 0);
        assert_eq!(fake.messages_with_subject(&label, "n").len(), 2);
    }

    #[tokio::test]
    async fn test_insert_failure() {
        let (fake, store) = store();
        store.write("f", "n", "v1").await.unwrap();
        fake.fail_inserts();

        let err = store.write("f", "n", "v2").await.unwrap_err();
        assert!(matches!(err, StoreError::WriteFailed(_)));
        // old version already gone; the gap is reported, not hidden
        assert_eq!(store.read("f", "n").await.unwrap(), None);
    }

    #[tokio::test]
    async fn test_listing_failure_is_unavailable() {
        let (fake, store) = store();
        store.write("f", "n", "v1").await.unwrap();
        fake.fail_list_messages();

        assert!(matches!(
            store.read("f", "n").await,
            Err(StoreError::StoreUnavailable(_))
        ));
        assert!(matches!(
            store.write("f", "n", "v2").await,
            Err(StoreError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_label_failure_is_unavailable() {
        let (fake, store) = store();
        fake.fail_list_labels();
        assert!(matches!(
            store.read("f", "n").await,
            Err(StoreError::StoreUnavailable(_))
        ));
        assert_eq!(fake.calls().list_messages, 0);
    }

    #[tokio::test]
    async fn test_undecodable_body() {
        let (fake, store) = store();
        let label = fake.add_label("f");
        fake.seed_payload(&label, "n", Part::Leaf("%%%".to_string()));

        assert!(matches!(
            store.read("f", "n").await,
            Err(StoreError::Decode(_))
        ));
    }

    #[tokio::test]
    async fn test_message_gone_before_fetch() {
        let (fake, store) = store();
        store.write("f", "n", "v1").await.unwrap();
        fake.vanish_on_get();

        assert_eq!(store.read("f", "n").await.unwrap(), None);
        assert_eq!(fake.calls().get_message, 1);
    }

    #[tokio::test]
    async fn test_fetch_failure_is_unavailable() {
        let (fake, store) = store();
        store.write("f", "n", "v1").await.unwrap();
        fake.fail_gets();

        assert!(matches!(
            store.read("f", "n").await,
            Err(StoreError::StoreUnavailable(_))
        ));
    }

    #[tokio::test]
    async fn test_nested_multipart_body() {
        let (fake, store) = store();
        let label = fake.add_label("f");
        fake.seed_payload(
            &label,
            "n",
            Part::Container(vec![
                Part::Leaf(String::new()),
                Part::Container(vec![Part::Leaf(mail_codec::encode("inner"))]),
                Part::Leaf(mail_codec::encode("later")),
            ]),
        );

        assert_eq!(store.read("f", "n").await.unwrap().as_deref(), Some("inner"));
    }

    #[tokio::test]
    async fn test_remove_and_exists() {
        let (fake, store) = store();
        let label = fake.add_label("f");
        fake.seed_message(&label, "n", "a");
        fake.seed_message(&label, "n", "b");

        assert!(store.exists("f", "n").await.unwrap());
        assert_eq!(store.remove("f", "n").await.unwrap(), 2);
        assert!(!store.exists("f", "n").await.unwrap());
        assert_eq!(store.remove("f", "n").await.unwrap(), 0);
    }

    #[tokio::test]
    async fn test_subject_with_newline_is_one_name() {
        let (_, store) = store();
        store.write("f", "a\nb", "x").await.unwrap();
        assert_eq!(store.read("f", "a b").await.unwrap().as_deref(), Some("x"));
    }

    #[tokio::test]
    async fn test_empty_name_rejected() {
        let (fake, store) = store();
        assert!(matches!(
            store.write("f", "", "x").await,
            Err(StoreError::InvalidInput(_))
        ));
        assert_eq!(fake.calls().list_labels, 0);
    }

    #[tokio::test]
    async fn test_app_data_scenario() {
        let (fake, store) = store();
        assert!(fake.labels().is_empty());

        store.write("app-data", "posts", "[]").await.unwrap();
        let labels = fake.labels();
        assert_eq!(labels.len(), 1);
        assert_eq!(labels[0].name, "app-data");
        let versions = fake.messages_with_subject(&labels[0].id, "posts");
        assert_eq!(versions.len(), 1);
        assert_eq!(versions[0].body, "[]");
        assert_eq!(store.read("app-data", "posts").await.unwrap().as_deref(), Some("[]"));

        store
            .write("app-data", "posts", "[{\"uuid\":\"1\"}]")
            .await
            .unwrap();
        assert_eq!(fake.calls().delete_message, 1);
        assert_eq!(
            store.read("app-data", "posts").await.unwrap().as_deref(),
            Some("[{\"uuid\":\"1\"}]")
        );
        assert_eq!(fake.calls().create_label, 1);
    }
}
