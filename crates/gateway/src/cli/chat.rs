//! `wayfarer chat`: interactive REPL against a running gateway.
//!
//! Each line is sent through a [`ChatSession`]; the reply is printed as it
//! streams in. Slash commands manage the local conversation.

use std::io::Write;

use wf_client::{ChatSession, HttpTransport};
use wf_domain::turn::{Turn, UserProfile};

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Run the interactive chat REPL against `url`.
pub async fn chat(url: String, profile: UserProfile) -> anyhow::Result<()> {
    let transport = HttpTransport::new(url.clone())?;
    let session = ChatSession::new(transport).with_profile(profile);

    let mut rl = rustyline::DefaultEditor::new()?;

    // Welcome goes to stderr so stdout carries only replies.
    eprintln!("Wayfarer travel chat");
    eprintln!("Endpoint: {url}  |  Type /help for commands, Ctrl+D to exit");
    if let Some(name) = session.profile().and_then(|p| p.name.as_deref()) {
        eprintln!("Hello, {name}!");
    }
    eprintln!();

    loop {
        match rl.readline("you> ") {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }

                rl.add_history_entry(&line).ok();

                // ── Slash commands ────────────────────────────────
                if trimmed.starts_with('/') {
                    if handle_slash_command(trimmed, &session) {
                        break;
                    }
                    continue;
                }

                // ── User message → streamed reply ────────────────
                send_and_print(&session, trimmed).await;
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
                continue;
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    eprintln!("Safe travels!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Slash command handling
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Process a slash command. Returns `true` if the REPL should exit.
fn handle_slash_command(input: &str, session: &ChatSession<HttpTransport>) -> bool {
    let cmd = input.split_whitespace().next().unwrap_or(input);

    match cmd {
        "/exit" | "/quit" => return true,

        "/clear" => {
            session.clear_error();
            eprintln!("Error cleared.");
        }

        "/reset" => {
            session.reset();
            eprintln!("Conversation reset.");
        }

        "/history" => {
            let turns = session.turns();
            if turns.is_empty() {
                eprintln!("(no messages yet)");
            }
            for turn in &turns {
                eprintln!("{}", format_turn(turn));
            }
        }

        "/help" => {
            eprintln!("Commands:");
            eprintln!("  /clear           Dismiss the last error");
            eprintln!("  /reset           Start a fresh conversation");
            eprintln!("  /history         Show the conversation so far");
            eprintln!("  /exit, /quit     Exit the chat");
            eprintln!("  /help            Show this help");
        }

        other => {
            eprintln!("Unknown command: {other}  (type /help for a list)");
        }
    }

    false
}

fn format_turn(turn: &Turn) -> String {
    let who = if turn.is_user {
        "you"
    } else if turn.is_error() {
        "error"
    } else {
        "wayfarer"
    };
    format!("[{}] {who}: {}", turn.id, turn.content)
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Message sending
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

/// Send one message, printing the reply turn's new suffix on every update.
async fn send_and_print(session: &ChatSession<HttpTransport>, text: &str) {
    let mut printed = 0usize;
    let result = session
        .send_with(text, |turn| {
            // Content only grows, so the unseen part is a suffix.
            if let Some(fresh) = turn.content.get(printed..) {
                print!("{fresh}");
                std::io::stdout().flush().ok();
            }
            printed = turn.content.len();
        })
        .await;

    match result {
        Ok(_) => {
            println!();
            println!();
        }
        Err(e) => {
            if printed > 0 {
                println!();
            }
            eprintln!("\x1B[31m❌ {e}\x1B[0m");
        }
    }
}
