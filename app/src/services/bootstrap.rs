//! Post sign-in setup
//!
//! An ordered list of idempotent steps run once a credential is available.
//! Every step reports human-readable progress lines; a failing step is
//! reported and skipped, the remaining steps still run.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use crate::adapters::gmail::MessagingApi;
use crate::config::AppConfig;
use crate::credentials::Credential;
use crate::services::{DocumentStore, FolderOutcome, Session};
use crate::types::error::{Result, StoreError};
use crate::types::AppState;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BootstrapStep {
    /// Make sure each folder's label exists
    EnsureFolders(Vec<String>),
    /// Load the app state document, falling back to a seed file, and write
    /// the result back
    LoadOrSeed {
        folder: String,
        subject: String,
        seed_file: Option<PathBuf>,
    },
}

impl BootstrapStep {
    pub fn name(&self) -> &'static str {
        match self {
            BootstrapStep::EnsureFolders(_) => "ensure-folders",
            BootstrapStep::LoadOrSeed { .. } => "load-or-seed",
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BootstrapReport {
    pub steps_run: usize,
    pub steps_failed: usize,
}

impl BootstrapReport {
    pub fn succeeded(&self) -> bool {
        self.steps_failed == 0
    }
}

pub struct Bootstrap {
    steps: Vec<BootstrapStep>,
}

/// Progress sink that also logs every line
struct Progress<'a> {
    sink: &'a mut dyn FnMut(&str),
}

impl Progress<'_> {
    fn line(&mut self, line: impl AsRef<str>) {
        let line = line.as_ref();
        info!("{}", line);
        (self.sink)(line);
    }
}

impl Bootstrap {
    pub fn new(steps: Vec<BootstrapStep>) -> Self {
        Self { steps }
    }

    /// Inbox and data folders, then the app state document
    pub fn from_config(config: &AppConfig) -> Self {
        Self::new(vec![
            BootstrapStep::EnsureFolders(vec![
                config.inbox_folder.clone(),
                config.data_folder.clone(),
            ]),
            BootstrapStep::LoadOrSeed {
                folder: config.data_folder.clone(),
                subject: config.repository_subject.clone(),
                seed_file: config.seed_file.clone(),
            },
        ])
    }

    pub fn steps(&self) -> &[BootstrapStep] {
        &self.steps
    }

    /// Run every step against the store built by `connect` from the
    /// session's credential.
    ///
    /// Without a credential nothing runs. `loading_complete` is set on the
    /// session when no step failed.
    pub async fn run_all<A, F>(
        &self,
        session: &mut Session,
        progress: &mut dyn FnMut(&str),
        connect: F,
    ) -> Result<BootstrapReport>
    where
        A: MessagingApi,
        F: FnOnce(&Credential) -> Result<DocumentStore<A>>,
    {
        let mut progress = Progress { sink: progress };
        let mut report = BootstrapReport::default();

        let store = match &session.credential {
            Some(credential) => connect(credential)?,
            None => {
                progress.line("Not signed in: no Gmail access token. No operations performed.");
                return Ok(report);
            }
        };

        for step in &self.steps {
            report.steps_run += 1;
            if let Err(e) = run_step(step, &store, &mut session.state, &mut progress).await {
                warn!("Bootstrap step {} failed: {:?}", step.name(), e);
                progress.line(format!("Step \"{}\" failed: {}", step.name(), e));
                report.steps_failed += 1;
            }
        }

        session.loading_complete = report.succeeded();
        info!(
            "Bootstrap finished: {} step(s), {} failed",
            report.steps_run, report.steps_failed
        );
        Ok(report)
    }
}

async fn run_step<A: MessagingApi>(
    step: &BootstrapStep,
    store: &DocumentStore<A>,
    state: &mut AppState,
    progress: &mut Progress<'_>,
) -> Result<()> {
    match step {
        BootstrapStep::EnsureFolders(names) => ensure_folders(store, names, progress).await,
        BootstrapStep::LoadOrSeed {
            folder,
            subject,
            seed_file,
        } => load_or_seed(store, folder, subject, seed_file.as_deref(), state, progress).await,
    }
}

async fn ensure_folders<A: MessagingApi>(
    store: &DocumentStore<A>,
    names: &[String],
    progress: &mut Progress<'_>,
) -> Result<()> {
    let resolutions = store.labels().ensure(store.api(), names).await?;

    let mut first_error = None;
    for resolution in resolutions {
        progress.line(format!(
            "Creating a new directory named \"{}\"",
            resolution.name
        ));
        match resolution.outcome {
            FolderOutcome::Existing(_) => {
                progress.line(format!("Directory \"{}\" already exists.", resolution.name))
            }
            FolderOutcome::Created(_) => {
                progress.line(format!("Created label \"{}\".", resolution.name))
            }
            FolderOutcome::Failed(e) => {
                progress.line(format!(
                    "Failed to create label \"{}\": {}",
                    resolution.name, e
                ));
                if first_error.is_none() {
                    first_error = Some(e);
                }
            }
        }
    }

    match first_error {
        Some(e) => Err(e),
        None => Ok(()),
    }
}

async fn load_or_seed<A: MessagingApi>(
    store: &DocumentStore<A>,
    folder: &str,
    subject: &str,
    seed_file: Option<&Path>,
    state: &mut AppState,
    progress: &mut Progress<'_>,
) -> Result<()> {
    progress.line(format!("Reading the email with the subject \"{}\"", subject));

    match store.read(folder, subject).await {
        Ok(Some(content)) => match AppState::from_json(&content) {
            Ok(loaded) => {
                progress.line(format!(
                    "Loaded app state with {} threads and {} people.",
                    loaded.thread_count(),
                    loaded.people_count()
                ));
                *state = loaded;
                return Ok(());
            }
            Err(e) => {
                warn!("App state document is not JSON: {}", e);
                progress.line("Email content was not valid JSON; will try seed file.");
            }
        },
        Ok(None) => progress.line(format!("The email \"{}\" was not found", subject)),
        Err(StoreError::Decode(e)) => {
            warn!("App state document body is unreadable: {}", e);
            progress.line("Email content was not valid JSON; will try seed file.");
        }
        Err(e) => return Err(e),
    }

    if let Some(path) = seed_file {
        load_seed_file(path, state, progress).await?;
    }

    let json = state.to_json()?;
    store.write(folder, subject, &json).await?;
    progress.line(format!("Wrote app state to the email \"{}\".", subject));
    Ok(())
}

async fn load_seed_file(
    path: &Path,
    state: &mut AppState,
    progress: &mut Progress<'_>,
) -> Result<()> {
    progress.line(format!("Reading from {}", path.display()));

    let text = match tokio::fs::read_to_string(path).await {
        Ok(text) => text,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
            progress.line(format!("File {} not found.", path.display()));
            return Ok(());
        }
        Err(e) => return Err(e.into()),
    };

    match AppState::from_json(&text) {
        Ok(loaded) => {
            *state = loaded;
            progress.line(format!("Loaded app state from {}", path.display()));
        }
        Err(_) => progress.line(format!(
            "File {} is not valid JSON; keeping current app state.",
            path.display()
        )),
    }
    Ok(())
}
