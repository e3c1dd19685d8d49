//! TUI-less "say" command

use std::error::Error;

use crate::core::session::{ConversationSession, SendOutcome};

pub async fn run_say(prompt: Vec<String>, session: &ConversationSession) -> Result<(), Box<dyn Error>> {
    let prompt = prompt.join(" ");
    if prompt.trim().is_empty() {
        eprintln!("Usage: mindchat say <prompt>");
        std::process::exit(1);
    }

    match session.send_message(&prompt).await {
        SendOutcome::Replied => {
            if let Some(reply) = session.history().iter().rev().find(|turn| turn.is_assistant()) {
                println!("{}", reply.content);
            }
            Ok(())
        }
        SendOutcome::Failed(err) => {
            eprintln!("❌ {err}");
            std::process::exit(1);
        }
        SendOutcome::Ignored | SendOutcome::Busy => {
            eprintln!("❌ Message was not sent");
            std::process::exit(1);
        }
    }
}
