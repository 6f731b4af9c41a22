//! CLI command execution.
//!
//! The chat command is a thin client: it drives the composition state
//! machine and streams the service's response, exactly the path a UI
//! would take.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{Context, Result};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::attachment::{media_type_for_path, AttachmentSource};
use crate::compose::Composer;
use crate::config::ServiceConfig;
use crate::models::{Conversation, Message, TurnProgress};
use crate::server;
use crate::stream::ChatTransport;

use super::args::{Cli, Commands};

/// Execute the parsed CLI command.
pub async fn execute(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Serve { port } => server::start_server(port, ServiceConfig::default()).await,
        Commands::Chat { endpoint } => run_chat(&endpoint).await,
    }
}

/// Interactive chat loop over stdin.
async fn run_chat(endpoint: &str) -> Result<()> {
    let transport = ChatTransport::new(endpoint);
    let mut composer = Composer::new();
    let mut conversation = Conversation::new();
    // The staged selection is rebuilt on every /attach or /remove, mirroring
    // a file input whose selection replaces the previous one.
    let mut selection: Vec<AttachmentSource> = Vec::new();

    println!("diagramma chat - /attach <path>, /remove <index>, /quit");
    let mut lines = BufReader::new(tokio::io::stdin()).lines();

    loop {
        if let Some(hint) = composer.placeholder() {
            println!("({hint})");
        }
        print!("> ");
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim().to_string();

        if line == "/quit" {
            break;
        }
        if let Some(path) = line.strip_prefix("/attach ") {
            attach(&mut composer, &mut selection, path.trim());
            composer.tick_placeholder();
            continue;
        }
        if let Some(index) = line.strip_prefix("/remove ") {
            remove(&mut composer, &mut selection, index.trim());
            continue;
        }

        composer.set_text(line);
        if !composer.key_enter(true) {
            continue;
        }
        if let Err(err) = submit_turn(&transport, &mut composer, &mut conversation).await {
            eprintln!("turn failed: {err}");
        } else {
            selection.clear();
        }
    }

    Ok(())
}

/// Stage one more file, keeping the whole selection consistent.
fn attach(composer: &mut Composer, selection: &mut Vec<AttachmentSource>, path: &str) {
    let path = PathBuf::from(path);
    let Some(media_type) = media_type_for_path(&path) else {
        eprintln!("unsupported file type: {}", path.display());
        return;
    };
    let name = path
        .file_name()
        .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().to_string());

    selection.push(AttachmentSource {
        name: name.clone(),
        media_type: media_type.to_string(),
        path,
    });
    match composer.stage_files(selection.clone()) {
        Ok(()) => println!("attached {name} ({media_type})"),
        Err(err) => {
            selection.pop();
            eprintln!("cannot attach: {err}");
        }
    }
}

/// Remove one staged attachment by index.
fn remove(composer: &mut Composer, selection: &mut Vec<AttachmentSource>, index: &str) {
    let Ok(index) = index.parse::<usize>() else {
        eprintln!("usage: /remove <index>");
        return;
    };
    if composer.remove_attachment(index) {
        selection.remove(index);
        println!("removed attachment {index}");
    } else {
        eprintln!("no attachment at index {index}");
    }
}

/// Submit the draft and stream the assistant's reply to stdout.
async fn submit_turn(
    transport: &ChatTransport,
    composer: &mut Composer,
    conversation: &mut Conversation,
) -> Result<()> {
    let parts = composer
        .submit_parts()
        .await
        .context("Submission rejected")?;
    conversation.push(Message::user(parts));

    let mut events = transport.send(conversation.messages());
    composer.finish_submit();
    conversation.begin_assistant();

    while let Some(event) = events.recv().await {
        if let crate::stream::StreamEvent::Delta(delta) = &event {
            print!("{delta}");
            std::io::stdout().flush()?;
        }
        match conversation.apply(event) {
            TurnProgress::Streaming => {}
            TurnProgress::Finished => {
                println!();
                return Ok(());
            }
            TurnProgress::Failed(err) => {
                println!();
                anyhow::bail!("assistant turn incomplete: {err}");
            }
        }
    }

    anyhow::bail!("stream closed without a terminal event")
}
