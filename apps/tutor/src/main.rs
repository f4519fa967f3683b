use std::{path::PathBuf, sync::Arc};

use anyhow::{Context, Result};
use clap::Parser;
use client_core::{
    scroll_lock::ScrollLock, spawn_workflow, AnonymousSession, DocumentFile, HttpTransferClient,
    SessionProvider, Stage, StaticSession, TutorWorkflow, WorkflowError, WorkflowHandle,
    WorkflowEvent, WorkflowOptions,
};
use tokio::{
    io::{AsyncBufReadExt, BufReader},
    sync::broadcast::{self, error::RecvError},
    task::JoinHandle,
};
use tokio_stream::{wrappers::WatchStream, StreamExt};
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

mod config;
mod render;

use config::{load_settings, Settings};
use render::Input;

#[derive(Parser, Debug)]
#[command(name = "tutor", about = "Upload a PDF, read its summary and ask questions about it")]
struct Args {
    /// PDF document to upload.
    file: PathBuf,
    /// Settings file; defaults to ./tutor.toml when present.
    #[arg(long)]
    config: Option<PathBuf>,
    #[arg(long)]
    server_url: Option<String>,
    #[arg(long)]
    access_token: Option<String>,
    /// Per-request timeout in seconds; 0 disables it.
    #[arg(long)]
    timeout_secs: Option<u64>,
    /// Request a refined summary after the first one.
    #[arg(long)]
    refine: bool,
    /// Question to ask; repeat for several. Without any, questions are read from stdin.
    #[arg(long = "ask", value_name = "QUESTION")]
    questions: Vec<String>,
    /// Print the final session state as JSON.
    #[arg(long)]
    json: bool,
}

impl Args {
    fn apply_to(&self, settings: &mut Settings) {
        if let Some(url) = &self.server_url {
            settings.server_url = url.clone();
        }
        if let Some(token) = &self.access_token {
            settings.access_token = Some(token.clone());
        }
        if let Some(secs) = self.timeout_secs {
            settings.request_timeout_secs = Some(secs);
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(std::io::stderr)
        .init();
    let args = Args::parse();

    let mut settings = load_settings(args.config.as_deref());
    args.apply_to(&mut settings);
    info!(server_url = %settings.server_url, "tutor: starting");

    let session: Arc<dyn SessionProvider> = match &settings.access_token {
        Some(token) => Arc::new(StaticSession::new(token.clone())),
        None => Arc::new(AnonymousSession),
    };
    info!(signed_in = session.is_signed_in(), "tutor: session ready");
    let transfer = HttpTransferClient::new(settings.transfer_config(), session)?;
    let workflow = TutorWorkflow::with_options(
        Arc::new(transfer),
        WorkflowOptions {
            upload_policy: settings.upload_policy(),
            progress: settings.progress_plan(),
        },
    );
    let (handle, worker) = spawn_workflow(workflow);
    let scroll_lock = ScrollLock::new();
    let notices = spawn_notice_printer(handle.subscribe_events(), scroll_lock.clone());

    let outcome = run_session(&handle, &args, &scroll_lock).await;

    // Closing the last handle stops the worker, which closes the event channel.
    drop(handle);
    let _ = worker.await;
    let _ = notices.await;
    outcome
}

async fn run_session(handle: &WorkflowHandle, args: &Args, scroll_lock: &ScrollLock) -> Result<()> {
    let file = load_document(&args.file).await?;
    upload_with_progress(handle, file, scroll_lock)
        .await
        .context("document was not accepted")?;
    print_summary(handle);

    if args.refine {
        refine(handle).await?;
    }

    if args.questions.is_empty() {
        interactive(handle).await?;
    } else {
        for question in &args.questions {
            ask(handle, question, true).await?;
        }
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&handle.state())?);
    }
    Ok(())
}

async fn load_document(path: &std::path::Path) -> Result<DocumentFile> {
    let file = DocumentFile::read(path).await?;
    Ok(match mime_guess::from_path(path).first_raw() {
        Some(mime_type) => file.with_mime_type(mime_type),
        None => file,
    })
}

/// Drives the upload while redrawing the progress bar from state updates.
async fn upload_with_progress(
    handle: &WorkflowHandle,
    file: DocumentFile,
    scroll_lock: &ScrollLock,
) -> Result<(), WorkflowError> {
    let _guard = scroll_lock.acquire();
    let mut updates = WatchStream::new(handle.watch_state());
    let submit = handle.submit_file(file);
    tokio::pin!(submit);

    let mut shown = None;
    let outcome = loop {
        tokio::select! {
            outcome = &mut submit => break outcome,
            Some(state) = updates.next() => {
                if state.stage == Stage::Uploading && shown != Some(state.upload_progress) {
                    shown = Some(state.upload_progress);
                    eprint!("\r{}", render::progress_bar(state.upload_progress, render::PROGRESS_BAR_WIDTH));
                }
            }
        }
    };
    if shown.is_some() {
        eprintln!();
    }
    outcome
}

fn print_summary(handle: &WorkflowHandle) {
    println!();
    for line in render::summary_lines(&handle.state().summary_blocks()) {
        println!("{line}");
    }
    println!();
}

async fn refine(handle: &WorkflowHandle) -> Result<()> {
    match handle.refine_summary().await {
        Ok(()) => print_summary(handle),
        // Already reported through the notice printer; the old summary stays.
        Err(WorkflowError::Retrieval(_)) => {}
        Err(err) if err.is_validation() => eprintln!("! {err}"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn ask(handle: &WorkflowHandle, question: &str, echo: bool) -> Result<()> {
    match handle.send_message(question).await {
        Ok(reply) => {
            if echo {
                if let Some(asked) = handle.state().conversation.messages().iter().rev().nth(1) {
                    println!("{}", render::message_line(asked));
                }
            }
            println!("{}", render::message_line(&reply));
        }
        Err(err) if err.is_validation() => eprintln!("! {err}"),
        Err(err) => return Err(err.into()),
    }
    Ok(())
}

async fn interactive(handle: &WorkflowHandle) -> Result<()> {
    println!("{}", render::INTERACTIVE_HELP);
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        match render::parse_input(&line) {
            Input::Question(question) => ask(handle, &question, false).await?,
            Input::Refine => refine(handle).await?,
            Input::Transcript => {
                for line in render::transcript_lines(&handle.state().conversation) {
                    println!("{line}");
                }
            }
            Input::Quit => break,
            Input::Empty => {}
            Input::Unknown(command) => eprintln!("! unknown command {command}"),
        }
    }
    Ok(())
}

fn spawn_notice_printer(
    mut events: broadcast::Receiver<WorkflowEvent>,
    scroll_lock: ScrollLock,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        loop {
            match events.recv().await {
                Ok(event) => {
                    if let Some(text) = render::notice_text(&event) {
                        // The progress bar owns the current line while locked.
                        if scroll_lock.is_locked() {
                            eprintln!();
                        }
                        eprintln!("{text}");
                    }
                }
                Err(RecvError::Lagged(skipped)) => {
                    warn!(skipped, "tutor: dropped notices");
                }
                Err(RecvError::Closed) => break,
            }
        }
    })
}
