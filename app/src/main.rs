use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tokio::io::AsyncReadExt;
use tracing::error;

use social_via_email_lib::credentials::{
    ChainedCredential, CredentialSource, EnvCredential, StaticCredential,
};
use social_via_email_lib::services::{session_cookie, Bootstrap, Session};
use social_via_email_lib::{
    connect, init_logging, load_config, oauth, ApiError, AppConfig, Credential, DocumentStore,
    GmailClient, Result, StoreError,
};

/// Gmail's own inbox label
const SYSTEM_INBOX: &str = "INBOX";

#[derive(Parser, Debug)]
#[command(name = "social-via-email", author, version, about, propagate_version = true)]
struct Cli {
    #[command(subcommand)]
    command: Command,

    /// Override the default configuration file path
    #[arg(long, short, global = true, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Gmail access token; defaults to the SVE_GMAIL_TOKEN environment variable
    #[arg(long, global = true, value_name = "TOKEN")]
    token: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create the app folders and load or seed the app state
    Bootstrap,

    /// Print the authorization URL for signing in
    AuthUrl,

    #[command(flatten)]
    Mailbox(MailboxCommand),
}

/// Commands that need a signed-in mailbox
#[derive(Subcommand, Debug)]
enum MailboxCommand {
    /// Print a document
    Read {
        name: String,
        /// Folder to read from (defaults to the data folder)
        #[arg(long, short)]
        folder: Option<String>,
    },

    /// Replace a document
    Write {
        name: String,
        #[arg(long, short)]
        folder: Option<String>,
        /// Document content; read from stdin when omitted
        #[arg(long)]
        content: Option<String>,
    },

    /// Delete every version of a document
    Remove {
        name: String,
        #[arg(long, short)]
        folder: Option<String>,
    },

    /// Print the mailbox address and the newest subjects
    Inbox {
        /// List the app's inbox folder instead of the Gmail inbox
        #[arg(long)]
        app: bool,
        #[arg(long, short = 'n', default_value_t = 30)]
        max: u32,
    },

    /// Print the signed-in person and a session cookie
    Whoami,
}

#[tokio::main]
async fn main() -> ExitCode {
    init_logging();
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(e) => {
            error!("{}: {}", e.kind(), e);
            eprintln!("Error: {}", e);
            ExitCode::FAILURE
        }
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let config = load_config(cli.config.as_deref())?;

    let source = ChainedCredential::new(vec![
        Box::new(StaticCredential::new(cli.token)),
        Box::new(EnvCredential::default()),
    ]);
    let credential = source.acquire().await?;

    match cli.command {
        Command::AuthUrl => {
            let request = oauth::authorization_url(&config.oauth)?;
            println!("{}", request.url);
            println!("state: {}", request.state);
            Ok(ExitCode::SUCCESS)
        }
        Command::Bootstrap => {
            let mut session = Session::with_credential(credential);
            let report = Bootstrap::from_config(&config)
                .run_all(&mut session, &mut |line: &str| println!("{}", line), |c| {
                    connect(&config, c)
                })
                .await?;
            Ok(if report.succeeded() {
                ExitCode::SUCCESS
            } else {
                ExitCode::FAILURE
            })
        }
        Command::Mailbox(command) => {
            let credential = credential.ok_or_else(|| {
                StoreError::Auth("Not signed in: no Gmail access token".to_string())
            })?;
            run_mailbox_command(&config, &credential, command).await
        }
    }
}

async fn run_mailbox_command(
    config: &AppConfig,
    credential: &Credential,
    command: MailboxCommand,
) -> Result<ExitCode> {
    let store = connect(config, credential)?;
    let folder_or_default =
        |folder: Option<String>| folder.unwrap_or_else(|| config.data_folder.clone());

    match command {
        MailboxCommand::Read { name, folder } => {
            let folder = folder_or_default(folder);
            match store.read(&folder, &name).await? {
                Some(content) => {
                    println!("{}", content);
                    Ok(ExitCode::SUCCESS)
                }
                None => {
                    eprintln!("\"{}\" not found in \"{}\"", name, folder);
                    Ok(ExitCode::FAILURE)
                }
            }
        }
        MailboxCommand::Write {
            name,
            folder,
            content,
        } => {
            let content = match content {
                Some(content) => content,
                None => {
                    let mut buf = String::new();
                    tokio::io::stdin().read_to_string(&mut buf).await?;
                    buf
                }
            };
            store.write(&folder_or_default(folder), &name, &content).await?;
            Ok(ExitCode::SUCCESS)
        }
        MailboxCommand::Remove { name, folder } => {
            let removed = store.remove(&folder_or_default(folder), &name).await?;
            println!("Removed {} message(s)", removed);
            Ok(ExitCode::SUCCESS)
        }
        MailboxCommand::Inbox { app, max } => {
            let (address, subjects) = inbox(config, &store, app, max).await?;
            for line in inbox_lines(&address, &subjects) {
                println!("{}", line);
            }
            Ok(ExitCode::SUCCESS)
        }
        MailboxCommand::Whoami => {
            let person = store.api().userinfo().await.map_err(api_error)?;
            println!("{} <{}>", person.name, person.email);
            println!("{}", session_cookie(&person)?);
            Ok(ExitCode::SUCCESS)
        }
    }
}

async fn inbox(
    config: &AppConfig,
    store: &DocumentStore<GmailClient>,
    app: bool,
    max: u32,
) -> Result<(String, Vec<String>)> {
    let label_id = if app {
        store.labels().resolve(store.api(), &config.inbox_folder).await?
    } else {
        SYSTEM_INBOX.to_string()
    };

    let profile = store.api().profile().await.map_err(api_error)?;
    let subjects = store
        .api()
        .inbox_subjects(&label_id, max)
        .await
        .map_err(api_error)?;
    Ok((profile.email_address, subjects))
}

fn inbox_lines(address: &str, subjects: &[String]) -> Vec<String> {
    let mut lines = vec![format!("Signed in as {}", address)];
    if subjects.is_empty() {
        lines.push("No messages.".to_string());
    } else {
        lines.extend(subjects.iter().map(|s| format!("  {}", s)));
    }
    lines
}

fn api_error(e: ApiError) -> StoreError {
    match e {
        ApiError::Unauthorized => StoreError::Auth(e.to_string()),
        e => StoreError::StoreUnavailable(e.to_string()),
    }
}
