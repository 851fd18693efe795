//! `parley chat`: Interactive or single-message chat mode.
//!
//! The transcript lives in this process only; it is gone when the REPL
//! exits.

use std::io::Write;

use parley_config::AppConfig;
use parley_core::transcript::Transcript;
use parley_core::turn::{Role, Turn};
use parley_engine::SessionEngine;
use tokio::io::{self, AsyncBufReadExt, BufReader};

pub async fn run(message: Option<String>) -> Result<(), Box<dyn std::error::Error>> {
    let config = AppConfig::load().map_err(|e| format!("Failed to load config: {e}"))?;

    if !config.has_api_key() {
        eprintln!();
        eprintln!("  WARNING: No API key configured.");
        eprintln!("  Replies will be configuration errors until one is set:");
        eprintln!("    PARLEY_API_KEY, GOOGLE_API_KEY or GEMINI_API_KEY");
        eprintln!("  or `api_key` in {}", AppConfig::config_path().display());
        eprintln!();
    }

    let provider = parley_providers::build_from_config(&config)?;
    let engine = SessionEngine::from_config(&config, provider);
    let mut transcript = engine.new_transcript();

    if let Some(msg) = message {
        // Single message mode
        eprint!("  Thinking...");
        engine.send_message(&mut transcript, &msg).await;
        eprint!("\r              \r");
        if let Some(reply) = transcript.last() {
            println!("{}", reply.content());
        }
        return Ok(());
    }

    println!();
    println!("  Parley Interactive Mode");
    println!();
    println!("  Model:     {}", config.provider.model);
    println!("  History:   last {} turns kept", transcript.retention_bound());
    println!();
    println!("  Type your message and press Enter.");
    println!("  Commands: /history, /clear, /delete N, exit");
    println!();

    let mut lines = BufReader::new(io::stdin()).lines();

    print!("  You > ");
    std::io::stdout().flush()?;

    while let Some(line) = lines.next_line().await? {
        match parse_line(&line) {
            ReplCommand::Exit => break,
            ReplCommand::Skip => {}
            ReplCommand::History => print!("{}", render_history(engine.list_history(&transcript))),
            ReplCommand::Clear => {
                engine.clear_all(&mut transcript);
                println!("  History cleared.");
            }
            ReplCommand::Delete(index) => {
                let before = transcript.len();
                engine.delete_message(&mut transcript, index);
                if transcript.len() == before {
                    println!("  No message #{index}.");
                } else {
                    println!("  Deleted message #{index}.");
                }
            }
            ReplCommand::Usage(text) => println!("  {text}"),
            ReplCommand::Send(text) => {
                eprint!("  ...");
                engine.send_message(&mut transcript, &text).await;
                eprint!("\r     \r");
                if let Some(reply) = transcript.last() {
                    println!();
                    print_reply(reply);
                    println!();
                }
            }
        }

        print!("  You > ");
        std::io::stdout().flush()?;
    }

    println!();
    println!("  Goodbye!");
    println!();

    Ok(())
}

/// One parsed REPL input line.
#[derive(Debug, PartialEq, Eq)]
enum ReplCommand {
    Exit,
    Skip,
    History,
    Clear,
    Delete(usize),
    Usage(&'static str),
    Send(String),
}

fn parse_line(line: &str) -> ReplCommand {
    let line = line.trim();
    if line.is_empty() {
        return ReplCommand::Skip;
    }

    match line {
        "exit" | "quit" | "/exit" | "/quit" => return ReplCommand::Exit,
        "/history" => return ReplCommand::History,
        "/clear" => return ReplCommand::Clear,
        _ => {}
    }

    if let Some(arg) = line.strip_prefix("/delete") {
        return match arg.trim().parse() {
            Ok(index) => ReplCommand::Delete(index),
            Err(_) => ReplCommand::Usage("Usage: /delete N (see /history for numbers)"),
        };
    }

    ReplCommand::Send(line.to_string())
}

fn label(role: Role) -> &'static str {
    match role {
        Role::User => "You",
        Role::Assistant => "Assistant",
        Role::Error => "Error",
    }
}

fn print_reply(turn: &Turn) {
    for line in turn.content().lines() {
        println!("  {} > {line}", label(turn.role()));
    }
}

/// Numbered listing of the transcript, one line per turn.
fn render_history(transcript: &Transcript) -> String {
    if transcript.is_empty() {
        return "  (no messages)\n".to_string();
    }

    transcript
        .iter()
        .enumerate()
        .map(|(i, turn)| {
            format!(
                "  #{i} [{}] {}: {}\n",
                turn.created_at().format("%H:%M:%S"),
                label(turn.role()),
                turn.preview(80)
            )
        })
        .collect()
}
