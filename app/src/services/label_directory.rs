//! Folder name to label id resolution
//!
//! Labels are created lazily and never renamed or deleted. Resolved ids are
//! cached for the lifetime of the directory, which belongs to one store and
//! therefore to one credential.

use std::collections::HashMap;

use tokio::sync::RwLock;
use tracing::{debug, info, warn};

use crate::adapters::gmail::{ApiError, Label, MessagingApi};
use crate::types::error::{Result, StoreError};

/// How a folder was resolved by `LabelDirectory::ensure`
#[derive(Debug, Clone)]
pub enum FolderOutcome {
    Existing(String),
    Created(String),
    Failed(StoreError),
}

#[derive(Debug, Clone)]
pub struct FolderResolution {
    pub name: String,
    pub outcome: FolderOutcome,
}

impl FolderResolution {
    pub fn label_id(&self) -> Option<&str> {
        match &self.outcome {
            FolderOutcome::Existing(id) | FolderOutcome::Created(id) => Some(id),
            FolderOutcome::Failed(_) => None,
        }
    }
}

#[derive(Default)]
pub struct LabelDirectory {
    cache: RwLock<HashMap<String, String>>,
}

fn find_label<'a>(labels: &'a [Label], name: &str) -> Option<&'a Label> {
    labels.iter().find(|l| l.name == name)
}

fn unavailable(action: &str, name: &str, err: ApiError) -> StoreError {
    StoreError::StoreUnavailable(format!("{} \"{}\": {}", action, name, err))
}

fn check_name(name: &str) -> Result<()> {
    if name.trim().is_empty() {
        return Err(StoreError::InvalidInput(
            "Folder name must not be empty".to_string(),
        ));
    }
    Ok(())
}

impl LabelDirectory {
    pub fn new() -> Self {
        Self::default()
    }

    /// Label id for `name`, creating the label when it does not exist
    pub async fn resolve(&self, api: &dyn MessagingApi, name: &str) -> Result<String> {
        check_name(name)?;

        if let Some(id) = self.cached(name).await {
            debug!("Label cache hit for \"{}\"", name);
            return Ok(id);
        }

        let labels = api
            .list_labels()
            .await
            .map_err(|e| unavailable("Failed to list labels for", name, e))?;

        let id = match find_label(&labels, name) {
            Some(label) => label.id.clone(),
            None => self.create(api, name).await?.0,
        };

        self.remember(name, &id).await;
        Ok(id)
    }

    /// Resolve several folders with one label listing
    pub async fn ensure(
        &self,
        api: &dyn MessagingApi,
        names: &[String],
    ) -> Result<Vec<FolderResolution>> {
        let labels = api
            .list_labels()
            .await
            .map_err(|e| unavailable("Failed to list labels for", &names.join(", "), e))?;

        let mut resolutions = Vec::with_capacity(names.len());
        for name in names {
            let outcome = match check_name(name) {
                Err(e) => FolderOutcome::Failed(e),
                Ok(()) => match find_label(&labels, name) {
                    Some(label) => FolderOutcome::Existing(label.id.clone()),
                    None => match self.create(api, name).await {
                        Ok((id, true)) => FolderOutcome::Created(id),
                        Ok((id, false)) => FolderOutcome::Existing(id),
                        Err(e) => FolderOutcome::Failed(e),
                    },
                },
            };

            let resolution = FolderResolution {
                name: name.clone(),
                outcome,
            };
            if let Some(id) = resolution.label_id() {
                self.remember(name, id).await;
            }
            resolutions.push(resolution);
        }

        Ok(resolutions)
    }

    /// Create `name`; the flag is false when someone else created it first
    async fn create(&self, api: &dyn MessagingApi, name: &str) -> Result<(String, bool)> {
        match api.create_label(name).await {
            Ok(label) => {
                info!("Created label \"{}\" ({})", name, label.id);
                Ok((label.id, true))
            }
            Err(ApiError::Conflict(message)) => {
                warn!("Label \"{}\" already exists ({}), listing again", name, message);
                let labels = api
                    .list_labels()
                    .await
                    .map_err(|e| unavailable("Failed to list labels for", name, e))?;
                find_label(&labels, name)
                    .map(|label| (label.id.clone(), false))
                    .ok_or_else(|| {
                        StoreError::StoreUnavailable(format!(
                            "Label \"{}\" reported as existing but not listed",
                            name
                        ))
                    })
            }
            Err(e) => Err(unavailable("Failed to create label", name, e)),
        }
    }

    pub async fn cached(&self, name: &str) -> Option<String> {
        self.cache.read().await.get(name).cloned()
    }

    /// Drop every cached id
    pub async fn forget(&self) {
        self.cache.write().await.clear();
    }

    async fn remember(&self, name: &str, id: &str) {
        self.cache
            .write()
            .await
            .insert(name.to_string(), id.to_string());
    }
}
