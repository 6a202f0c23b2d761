//! CLI channel: stdin/stdout REPL for running the workflow locally.

use std::io::Write;
use std::pin::Pin;
use std::sync::Mutex;

use async_trait::async_trait;
use futures::{stream, Stream, StreamExt};
use tokio::io::{AsyncBufReadExt, BufReader};

use crate::brand::{BrandFlow, FlowEvent, Menu, Outbound, Outbox, StageState};
use crate::error::ChannelError;

/// Identity used for the single local user.
pub const CLI_IDENTITY: &str = "local-user";

const QUIT: &str = "/quit";

pub type LineStream = Pin<Box<dyn Stream<Item = String> + Send>>;

/// Prints notices and numbered menus; numbers typed back pick menu entries.
pub struct CliChannel {
    /// Action ids of the last menu shown, in display order.
    last_actions: Mutex<Vec<String>>,
}

impl Default for CliChannel {
    fn default() -> Self {
        Self::new()
    }
}

impl CliChannel {
    pub fn new() -> Self {
        Self {
            last_actions: Mutex::new(Vec::new()),
        }
    }

    /// Non-empty, trimmed stdin lines until EOF.
    pub fn lines() -> LineStream {
        let (tx, rx) = tokio::sync::mpsc::unbounded_channel();

        tokio::spawn(async move {
            let reader = BufReader::new(tokio::io::stdin());
            let mut lines = reader.lines();

            loop {
                match lines.next_line().await {
                    Ok(Some(line)) => {
                        let line = line.trim().to_string();
                        if line.is_empty() {
                            eprint!("> ");
                            continue;
                        }
                        if tx.send(line).is_err() {
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        tracing::error!("Error reading stdin: {}", e);
                        break;
                    }
                }
            }
        });

        Box::pin(stream::unfold(rx, |mut rx| async move {
            rx.recv().await.map(|line| (line, rx))
        }))
    }

    /// Run the REPL until EOF or `/quit`.
    pub async fn run(&self, flow: &BrandFlow) -> Result<(), ChannelError> {
        let mut lines = Self::lines();

        loop {
            let Some(seed) = ask(&mut lines, "💡 Describe your idea in a sentence or two:").await else {
                return Ok(());
            };
            let Some(name) = ask(&mut lines, "🏷️ What is the project called?").await else {
                return Ok(());
            };

            // Failures were already reported through the outbox.
            if flow.start(CLI_IDENTITY, &seed, &name, self).await.is_err() {
                continue;
            }

            loop {
                eprint!("> ");
                let Some(line) = lines.next().await else {
                    return Ok(());
                };
                if line == QUIT {
                    return Ok(());
                }

                let state = flow.status(CLI_IDENTITY).await.map(|s| s.state);
                let event = self.to_event(&line, state);
                match flow.handle(CLI_IDENTITY, event, self).await {
                    Ok(Some(_)) => {}
                    Ok(None) => break,
                    Err(e) if e.is_fatal() => break,
                    Err(_) => {}
                }
            }
        }
    }

    /// Map a typed line to an event, given the session's current state.
    pub fn to_event(&self, line: &str, state: Option<StageState>) -> FlowEvent {
        let line = line.trim();
        if matches!(
            state,
            Some(StageState::AwaitingCustomInput | StageState::AwaitingComment)
        ) {
            return FlowEvent::TextInput(line.to_string());
        }

        let actions = self
            .last_actions
            .lock()
            .map(|a| a.clone())
            .unwrap_or_default();

        if let Ok(n) = line.parse::<usize>() {
            if let Some(id) = n.checked_sub(1).and_then(|i| actions.get(i)) {
                return FlowEvent::ButtonSelect(id.clone());
            }
        }
        if actions.iter().any(|id| id == line) {
            return FlowEvent::ButtonSelect(line.to_string());
        }
        FlowEvent::TextInput(line.to_string())
    }

    fn remember(&self, menu: &Menu) {
        if let Ok(mut actions) = self.last_actions.lock() {
            *actions = menu.action_ids().into_iter().map(String::from).collect();
        }
    }
}

#[async_trait]
impl Outbox for CliChannel {
    async fn send(&self, message: Outbound) -> Result<(), ChannelError> {
        let written = match &message {
            Outbound::Notice { text } => writeln!(std::io::stderr(), "{text}"),
            Outbound::Menu { menu } => {
                self.remember(menu);
                writeln!(std::io::stdout(), "\n{}\n", render_menu(menu))
            }
        };
        written.map_err(|e| ChannelError::SendFailed {
            name: "cli".to_string(),
            reason: e.to_string(),
        })
    }
}

async fn ask(lines: &mut LineStream, question: &str) -> Option<String> {
    println!("{question}");
    eprint!("> ");
    lines.next().await.filter(|line| line != QUIT)
}

/// Menu text followed by every entry, numbered from 1.
fn render_menu(menu: &Menu) -> String {
    let labels = menu
        .options
        .iter()
        .map(|o| o.label.as_str())
        .chain(menu.standing_actions.iter().map(|a| a.label.as_str()));

    let mut out = menu.text.trim_end().to_string();
    out.push('\n');
    for (n, label) in labels.enumerate() {
        out.push_str(&format!("\n  [{}] {}", n + 1, label));
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::brand::{Stage, StageOption};

    fn stage_menu() -> Menu {
        Menu::for_stage(
            Stage::Problem,
            "Pick one",
            &[
                StageOption::new("Procrastination", "Helps beat procrastination"),
                StageOption::new("Overwhelm", "Reduces overwhelm"),
            ],
        )
    }

    #[tokio::test]
    async fn numbers_pick_menu_entries() {
        let cli = CliChannel::new();
        cli.send(Outbound::menu(stage_menu())).await.unwrap();

        let state = Some(StageState::AwaitingStage1);
        assert_eq!(
            cli.to_event("2", state),
            FlowEvent::ButtonSelect("choose_stage1:1".into())
        );
        assert_eq!(cli.to_event("3", state), FlowEvent::ButtonSelect("repeat_brand".into()));
        assert_eq!(cli.to_event("9", state), FlowEvent::TextInput("9".into()));
        assert_eq!(cli.to_event("0", state), FlowEvent::TextInput("0".into()));
        assert_eq!(
            cli.to_event("custom_input:1", state),
            FlowEvent::ButtonSelect("custom_input:1".into())
        );
        assert_eq!(cli.to_event("hello", state), FlowEvent::TextInput("hello".into()));
    }

    #[tokio::test]
    async fn text_states_never_map_to_buttons() {
        let cli = CliChannel::new();
        cli.send(Outbound::menu(stage_menu())).await.unwrap();

        assert_eq!(
            cli.to_event("1", Some(StageState::AwaitingCustomInput)),
            FlowEvent::TextInput("1".into())
        );
        assert_eq!(
            cli.to_event(" Great work ", Some(StageState::AwaitingComment)),
            FlowEvent::TextInput("Great work".into())
        );
    }

    #[test]
    fn menu_lists_numbered_entries() {
        let text = render_menu(&stage_menu());
        assert!(text.starts_with("Stage 1"));
        assert!(text.contains("[1] Procrastination"));
        assert!(text.contains("[2] Overwhelm"));
        assert!(text.contains("[3] 🔄 3 more options"));
        assert!(text.contains("[5] 🏠 Menu"));
    }
}
