//! `studybuddy console`: interactive study sessions for one local user.
//!
//! Notices from the session are printed by [`ConsoleTransport`] as they
//! happen; the prompt accepts slash-commands for starting, answering and
//! stopping, and `/join` / `/leave` simulate presence changes so the
//! interrupt path can be exercised without a chat platform.

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use sb_domain::config::{Config, TimingOverrides};
use sb_domain::transport::{Location, PresenceEvent};
use sb_domain::{ChannelId, CommunityId, UserId};

use super::ConsoleArgs;
use crate::bootstrap;
use crate::runtime::{
    self, parse_answer_letters, Attachment, InterruptBridge, StartRequest, StudyRuntime,
};
use crate::transport::ConsoleTransport;

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Public entry point
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

pub async fn console(config: Arc<Config>, args: ConsoleArgs) -> anyhow::Result<()> {
    bootstrap::check_config(&config)?;
    let runtime = bootstrap::build_runtime(&config, Arc::new(ConsoleTransport))?;

    let repl = Console {
        bridge: InterruptBridge::new(runtime.clone()),
        runtime,
        user_id: UserId::from(args.user.as_str()),
        community_id: CommunityId::from(args.community.as_str()),
        channel_id: ChannelId::from("console"),
        timings: args.timing_overrides(),
    };

    let history_path = dirs::home_dir()
        .unwrap_or_default()
        .join(".studybuddy")
        .join("console_history.txt");
    if let Some(parent) = history_path.parent() {
        std::fs::create_dir_all(parent).ok();
    }
    let mut rl = rustyline::DefaultEditor::new()?;
    let _ = rl.load_history(&history_path);

    let space = repl.runtime.communities.load(&repl.community_id).await;
    eprintln!("StudyBuddy console");
    eprintln!(
        "User: {}  |  Study space: #{}  |  Type /help for commands, Ctrl+D to exit",
        repl.user_id, space.study_channel_name
    );
    eprintln!();

    loop {
        // Readline blocks; hand this worker's other tasks off so session
        // notices keep printing while the prompt waits.
        let readline = tokio::task::block_in_place(|| rl.readline("study> "));

        match readline {
            Ok(line) => {
                let trimmed = line.trim();
                if trimmed.is_empty() {
                    continue;
                }
                rl.add_history_entry(&line).ok();

                match ConsoleCommand::parse(trimmed) {
                    Ok(ConsoleCommand::Exit) => break,
                    Ok(cmd) => {
                        if let Err(e) = repl.run(cmd).await {
                            eprintln!("\x1B[31merror: {e}\x1B[0m");
                        }
                    }
                    Err(msg) => eprintln!("{msg}"),
                }
            }
            Err(rustyline::error::ReadlineError::Interrupted) => {
                eprintln!("(Use Ctrl+D or /exit to quit)");
            }
            Err(rustyline::error::ReadlineError::Eof) => break,
            Err(e) => {
                eprintln!("\x1B[31mreadline error: {e}\x1B[0m");
                break;
            }
        }
    }

    rl.save_history(&history_path).ok();
    bootstrap::drain_sessions(&repl.runtime, Duration::from_secs(2)).await;

    eprintln!("Goodbye!");
    Ok(())
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Command parsing
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

#[derive(Debug, Clone, PartialEq, Eq)]
enum ConsoleCommand {
    Study { cycles: u32, text: String },
    File { cycles: u32, path: String },
    Stop,
    Status,
    Answer(String),
    Join(String),
    Leave,
    Channel(String),
    Help,
    Exit,
}

impl ConsoleCommand {
    fn parse(input: &str) -> Result<Self, String> {
        let (cmd, rest) = input
            .split_once(char::is_whitespace)
            .map(|(c, r)| (c, r.trim()))
            .unwrap_or((input, ""));

        let cmd = match cmd {
            "/study" => {
                let (cycles, text) = cycles_and_rest(rest, "/study <cycles> <text>")?;
                Self::Study { cycles, text }
            }
            "/file" => {
                let (cycles, path) = cycles_and_rest(rest, "/file <cycles> <path>")?;
                Self::File { cycles, path }
            }
            "/stop" => Self::Stop,
            "/status" => Self::Status,
            "/answer" if !rest.is_empty() => Self::Answer(rest.to_string()),
            "/answer" => return Err("Usage: /answer <letters>  (e.g. /answer ACB)".into()),
            "/join" if !rest.is_empty() => Self::Join(rest.to_string()),
            "/join" => return Err("Usage: /join <location>".into()),
            "/leave" => Self::Leave,
            "/channel" if !rest.is_empty() => Self::Channel(rest.to_string()),
            "/channel" => return Err("Usage: /channel <name>".into()),
            "/help" => Self::Help,
            "/exit" | "/quit" => Self::Exit,
            other if other.starts_with('/') => {
                return Err(format!("Unknown command: {other}  (type /help for a list)"))
            }
            _ => return Err("Commands start with '/' (type /help for a list)".into()),
        };
        Ok(cmd)
    }
}

fn cycles_and_rest(rest: &str, usage: &str) -> Result<(u32, String), String> {
    let (cycles, tail) = rest
        .split_once(char::is_whitespace)
        .ok_or_else(|| format!("Usage: {usage}"))?;
    let cycles = cycles
        .parse()
        .map_err(|_| format!("'{cycles}' is not a number. Usage: {usage}"))?;
    let tail = tail.trim();
    if tail.is_empty() {
        return Err(format!("Usage: {usage}"));
    }
    Ok((cycles, tail.to_string()))
}

// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━
// Command execution
// ━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━━

struct Console {
    runtime: StudyRuntime,
    bridge: InterruptBridge,
    user_id: UserId,
    community_id: CommunityId,
    channel_id: ChannelId,
    timings: TimingOverrides,
}

impl Console {
    async fn run(&self, cmd: ConsoleCommand) -> anyhow::Result<()> {
        match cmd {
            ConsoleCommand::Study { cycles, text } => self.start(cycles, Some(text), None).await,
            ConsoleCommand::File { cycles, path } => {
                let bytes = tokio::fs::read(&path)
                    .await
                    .map_err(|e| anyhow::anyhow!("reading {path}: {e}"))?;
                let filename = Path::new(&path)
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or(path);
                self.start(cycles, None, Some(Attachment { filename, bytes }))
                    .await
            }
            ConsoleCommand::Stop => {
                if !runtime::stop_session(&self.runtime, &self.user_id) {
                    eprintln!("No active session.");
                }
                Ok(())
            }
            ConsoleCommand::Status => {
                self.status();
                Ok(())
            }
            ConsoleCommand::Answer(letters) => {
                self.runtime
                    .answers
                    .submit(&self.user_id, parse_answer_letters(&letters))?;
                Ok(())
            }
            ConsoleCommand::Join(name) => {
                self.move_to(Some(Location::new(name.clone(), name))).await;
                Ok(())
            }
            ConsoleCommand::Leave => {
                self.move_to(None).await;
                Ok(())
            }
            ConsoleCommand::Channel(name) => {
                let cfg = self
                    .runtime
                    .communities
                    .set_monitored_space(&self.community_id, Some(String::new()), Some(name))
                    .await?;
                eprintln!("Study space is now #{}", cfg.study_channel_name);
                Ok(())
            }
            ConsoleCommand::Help => {
                print_help();
                Ok(())
            }
            ConsoleCommand::Exit => Ok(()),
        }
    }

    async fn start(
        &self,
        cycles: u32,
        text: Option<String>,
        attachment: Option<Attachment>,
    ) -> anyhow::Result<()> {
        let req = StartRequest {
            user_id: self.user_id.clone(),
            community_id: self.community_id.clone(),
            channel_id: self.channel_id.clone(),
            cycles,
            topic: None,
            text,
            attachment,
            timings: self.timings,
        };
        // The scheduler task runs detached; progress arrives as notices.
        runtime::start_session(&self.runtime, req).await?;
        Ok(())
    }

    async fn move_to(&self, current: Option<Location>) {
        let previous = self
            .runtime
            .presence
            .location(&self.user_id, &self.community_id)
            .flatten();
        let event = PresenceEvent {
            user_id: self.user_id.clone(),
            community_id: self.community_id.clone(),
            previous,
            current: current.clone(),
        };
        self.bridge.handle(event).await;
        match current {
            Some(location) => eprintln!("\x1B[2m(you are now in #{})\x1B[0m", location.name),
            None => eprintln!("\x1B[2m(you left the voice channels)\x1B[0m"),
        }
    }

    fn status(&self) {
        let Some(session) = self.runtime.registry.get(&self.user_id) else {
            eprintln!("No active session.");
            return;
        };
        let snap = session.snapshot();
        eprintln!("Topic:    {}", snap.topic);
        eprintln!(
            "Phase:    {} (cycle {}/{})",
            snap.phase.as_str(),
            snap.current_cycle,
            snap.target_cycles
        );
        eprintln!("Elapsed:  {}m {}s", snap.elapsed_secs / 60, snap.elapsed_secs % 60);
        if !snap.quiz_scores.is_empty() {
            let scores: Vec<String> = snap
                .quiz_scores
                .iter()
                .map(|s| format!("{}/{}", s.correct, s.total))
                .collect();
            eprintln!(
                "Scores:   {}  (average {:.0}%)",
                scores.join(", "),
                snap.average_score * 100.0
            );
        }
        if snap.awaiting_answers {
            eprintln!("A quiz is waiting: /answer <letters>");
        }
    }
}

fn print_help() {
    eprintln!("Commands:");
    eprintln!("  /study <cycles> <text>  Start a session on the given text");
    eprintln!("  /file <cycles> <path>   Start a session on a .txt, .md or .pdf file");
    eprintln!("  /stop                   Stop the current session");
    eprintln!("  /status                 Show session progress");
    eprintln!("  /answer <letters>       Answer the pending quiz (e.g. /answer ACB)");
    eprintln!("  /join <location>        Simulate moving into a voice channel");
    eprintln!("  /leave                  Simulate disconnecting from voice");
    eprintln!("  /channel <name>         Change this community's study space");
    eprintln!("  /exit, /quit            Exit the console");
    eprintln!("  /help                   Show this help");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_study_with_multiword_text() {
        assert_eq!(
            ConsoleCommand::parse("/study 3 the krebs cycle"),
            Ok(ConsoleCommand::Study {
                cycles: 3,
                text: "the krebs cycle".into()
            })
        );
    }

    #[test]
    fn study_needs_cycles_and_text() {
        assert!(ConsoleCommand::parse("/study").is_err());
        assert!(ConsoleCommand::parse("/study 3").is_err());
        assert!(ConsoleCommand::parse("/study three notes").is_err());
    }

    #[test]
    fn parses_simple_commands() {
        assert_eq!(ConsoleCommand::parse("/stop"), Ok(ConsoleCommand::Stop));
        assert_eq!(ConsoleCommand::parse("/leave"), Ok(ConsoleCommand::Leave));
        assert_eq!(ConsoleCommand::parse("/quit"), Ok(ConsoleCommand::Exit));
        assert_eq!(
            ConsoleCommand::parse("/answer a c b"),
            Ok(ConsoleCommand::Answer("a c b".into()))
        );
        assert_eq!(
            ConsoleCommand::parse("/join study-vc"),
            Ok(ConsoleCommand::Join("study-vc".into()))
        );
    }

    #[test]
    fn rejects_unknown_and_bare_text() {
        assert!(ConsoleCommand::parse("/dance").is_err());
        assert!(ConsoleCommand::parse("hello").is_err());
        assert!(ConsoleCommand::parse("/channel").is_err());
    }
}
