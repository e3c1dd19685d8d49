//! Line-based chat screen.
//!
//! Reads one message per line from stdin, sends it through the session, and
//! prints whatever changed in the session state: new turns, the loading
//! indicator, and the current error.

use crate::commands::{help_lines, process_input, ChatCommand, CommandResult};
use crate::core::config::{ColorScheme, ConfigStore};
use crate::core::constants::API_KEY_SECRET;
use crate::core::message::{Message, TranscriptRole};
use crate::core::secrets::SecretStore;
use crate::core::session::{ConversationSession, SendOutcome, SendPolicy, SessionState};
use crate::ui::palette::Palette;
use std::error::Error;
use std::io::Write;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, BufReader};

const USER_LABEL: &str = "You";
const ASSISTANT_LABEL: &str = "Gemini";

/// Tracks what has already been printed so each render emits only the delta.
pub struct TranscriptRenderer {
    palette: Palette,
    rendered_turns: usize,
    loading_shown: bool,
    last_error: Option<String>,
}

impl TranscriptRenderer {
    pub fn new(palette: Palette) -> Self {
        Self {
            palette,
            rendered_turns: 0,
            loading_shown: false,
            last_error: None,
        }
    }

    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.palette = palette;
    }

    pub fn empty_state_lines(&self) -> Vec<String> {
        vec![
            self.palette.heading("Start a conversation"),
            self.palette
                .secondary("Ask me anything and I'll do my best to help!"),
            self.palette.secondary("Type /help for commands."),
        ]
    }

    /// Forget the last error shown, so a repeat of the same failure from the
    /// next send is printed again.
    pub fn begin_send(&mut self) {
        self.last_error = None;
    }

    pub fn render(&mut self, state: &SessionState) -> Vec<String> {
        let mut lines: Vec<String> = state
            .history
            .iter()
            .skip(self.rendered_turns)
            .map(|turn| self.turn_line(turn))
            .collect();
        self.rendered_turns = state.history.len();

        if state.is_loading() {
            if !self.loading_shown {
                lines.push(self.palette.secondary("Thinking..."));
                self.loading_shown = true;
            }
        } else {
            self.loading_shown = false;
        }

        if state.error != self.last_error {
            if let Some(error) = &state.error {
                lines.push(self.palette.error(error));
            }
            self.last_error = state.error.clone();
        }
        lines
    }

    fn turn_line(&self, turn: &Message) -> String {
        let prefix = match turn.role {
            TranscriptRole::User => self.palette.user_prefix(&format!("{USER_LABEL}:")),
            TranscriptRole::Assistant => {
                self.palette.assistant_prefix(&format!("{ASSISTANT_LABEL}:"))
            }
        };
        format!("{} {}", prefix, self.palette.text(&turn.content))
    }
}

pub struct ChatContext {
    pub session: ConversationSession,
    pub secrets: Arc<dyn SecretStore>,
    pub config: ConfigStore,
    /// Emit ANSI colors.
    pub styled: bool,
}

impl ChatContext {
    fn palette_for(&self, scheme: ColorScheme) -> Palette {
        if self.styled {
            Palette::for_scheme(scheme)
        } else {
            Palette::plain(scheme)
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum Flow {
    Continue,
    Quit,
}

/// A missing or blank stored key. Lookup failures are reported by the send.
fn needs_key_hint(secrets: &dyn SecretStore) -> bool {
    match secrets.get(API_KEY_SECRET) {
        Ok(key) => key.as_deref().map_or(true, |k| k.trim().is_empty()),
        Err(_) => false,
    }
}

fn print_lines(lines: Vec<String>) {
    for line in lines {
        println!("{line}");
    }
}

pub async fn run_chat(ctx: ChatContext) -> Result<(), Box<dyn Error>> {
    let scheme = ctx.config.color_scheme()?;
    let mut renderer = TranscriptRenderer::new(ctx.palette_for(scheme));

    print_lines(renderer.empty_state_lines());
    if needs_key_hint(ctx.secrets.as_ref()) {
        println!(
            "{}",
            renderer
                .palette()
                .secondary("No API key set yet. Use /key <api-key> to add one.")
        );
    }

    let mut input = BufReader::new(tokio::io::stdin()).lines();
    loop {
        print!("{} ", renderer.palette().primary(">"));
        std::io::stdout().flush()?;

        let Some(line) = input.next_line().await? else {
            println!();
            break;
        };

        match process_input(&line) {
            CommandResult::Command(command) => {
                if handle_command(&ctx, &mut renderer, command) == Flow::Quit {
                    break;
                }
            }
            CommandResult::ProcessAsMessage(text) => {
                send_and_render(&ctx.session, &mut renderer, &text, print_lines).await;
            }
        }
    }
    Ok(())
}

async fn send_and_render(
    session: &ConversationSession,
    renderer: &mut TranscriptRenderer,
    text: &str,
    mut emit: impl FnMut(Vec<String>),
) {
    let rejected = session.policy() == SendPolicy::RejectWhileLoading && session.is_loading();
    if !text.trim().is_empty() && !rejected {
        renderer.begin_send();
    }
    let mut updates = session.subscribe();
    let send = session.send_message(text);
    tokio::pin!(send);

    let outcome = loop {
        tokio::select! {
            outcome = &mut send => break outcome,
            changed = updates.changed() => {
                if changed.is_err() {
                    break (&mut send).await;
                }
                let state = updates.borrow_and_update().clone();
                emit(renderer.render(&state));
            }
        }
    };

    if matches!(outcome, SendOutcome::Busy) {
        emit(vec![renderer
            .palette()
            .secondary("Still waiting for the previous reply.")]);
    }
    emit(renderer.render(&session.snapshot()));
}

fn handle_command(ctx: &ChatContext, renderer: &mut TranscriptRenderer, command: ChatCommand) -> Flow {
    let palette = *renderer.palette();
    match command {
        ChatCommand::Help => print_lines(help_lines()),
        ChatCommand::Quit => return Flow::Quit,
        ChatCommand::Theme(arg) => {
            let result = match arg {
                None => ctx.config.toggle_color_scheme().map_err(|e| e.to_string()),
                Some(name) => name.parse::<ColorScheme>().and_then(|scheme| {
                    ctx.config
                        .set_color_scheme(scheme)
                        .map(|_| scheme)
                        .map_err(|e| e.to_string())
                }),
            };
            match result {
                Ok(scheme) => {
                    renderer.set_palette(ctx.palette_for(scheme));
                    println!(
                        "{}",
                        renderer.palette().secondary(&format!("Theme set to {scheme}"))
                    );
                }
                Err(err) => println!("{}", palette.error(&err)),
            }
        }
        ChatCommand::Key(None) => println!("{}", palette.secondary("Usage: /key <api-key>")),
        ChatCommand::Key(Some(value)) => match ctx.secrets.set(API_KEY_SECRET, &value) {
            Ok(()) => println!("{}", palette.secondary("API key saved successfully")),
            Err(err) => println!("{}", palette.error(&format!("Failed to save API key: {err}"))),
        },
        ChatCommand::Settings => match ctx.config.load() {
            Ok(config) => {
                let key = ctx.secrets.get(API_KEY_SECRET).ok().flatten();
                print_lines(config.summary_lines(key.as_deref()));
            }
            Err(err) => println!("{}", palette.error(&err.to_string())),
        },
    }
    Flow::Continue
}
