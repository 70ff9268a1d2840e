use std::io::{self, BufRead, Write};
use std::path::PathBuf;
use std::sync::mpsc::{Receiver, Sender};
use std::sync::Arc;
use std::thread::JoinHandle;

use anyhow::{anyhow, Context};

use story_lab::engine::protocol::{EngineCommand, EngineResponse};
use story_lab::engine::worker::EngineWorker;
use story_lab::model::presets::{recommendations, GENRES};
use story_lab::{
    Character, ChatCompletionsClient, CompletionProvider, LoggingProvider, NarrativeEngine,
    StepOutcome,
};

use crate::ui::settings::AppSettings;

const TIMELINE_WIDTH: usize = 50;

/// One line of player input during the story.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PlayerCommand {
    Choice(String),
    Text(String),
    Status,
    Timeline,
    Export(PathBuf),
    Save(PathBuf),
    Reset,
    Help,
    Quit,
    Empty,
    Invalid(String),
}

/// Interpret a line against the choices currently on screen.
pub fn parse_command(line: &str, choices: &[String]) -> PlayerCommand {
    let line = line.trim();
    if line.is_empty() {
        return PlayerCommand::Empty;
    }

    if let Some(rest) = line.strip_prefix('/') {
        let (cmd, arg) = rest.split_once(' ').unwrap_or((rest, ""));
        let arg = arg.trim();
        return match cmd {
            "status" => PlayerCommand::Status,
            "timeline" => PlayerCommand::Timeline,
            "export" => PlayerCommand::Export(path_or(arg, "my_adventure.txt")),
            "save" => PlayerCommand::Save(path_or(arg, "my_adventure.json")),
            "reset" => PlayerCommand::Reset,
            "help" => PlayerCommand::Help,
            "quit" | "exit" => PlayerCommand::Quit,
            other => PlayerCommand::Invalid(format!("unknown command /{other}")),
        };
    }

    if let Ok(n) = line.parse::<usize>() {
        return match n.checked_sub(1).and_then(|i| choices.get(i)) {
            Some(choice) => PlayerCommand::Choice(choice.clone()),
            None => PlayerCommand::Invalid(format!("there is no option {n}")),
        };
    }

    PlayerCommand::Text(line.to_string())
}

fn path_or(arg: &str, default: &str) -> PathBuf {
    if arg.is_empty() {
        PathBuf::from(default)
    } else {
        PathBuf::from(arg)
    }
}

/// Parse "Name: Role" from the custom character prompt.
pub fn parse_custom_character(line: &str) -> Option<Character> {
    let (name, role) = line.split_once(':')?;
    let (name, role) = (name.trim(), role.trim());
    if name.is_empty() || role.is_empty() {
        return None;
    }
    Some(Character::new(name, role))
}

/// Genre by number or by name; empty input picks the first genre.
pub fn parse_genre(line: &str) -> Option<&'static str> {
    let line = line.trim();
    if line.is_empty() {
        return Some(GENRES[0]);
    }
    if let Ok(n) = line.parse::<usize>() {
        return n.checked_sub(1).and_then(|i| GENRES.get(i)).copied();
    }
    GENRES.iter().copied().find(|g| g.eq_ignore_ascii_case(line))
}

pub struct TerminalApp {
    cmd_tx: Sender<EngineCommand>,
    resp_rx: Receiver<EngineResponse>,
    worker: Option<JoinHandle<()>>,
    choices: Vec<String>,
}

impl TerminalApp {
    pub fn new(settings: &AppSettings) -> anyhow::Result<Self> {
        let api_key = settings.api_key();
        if api_key.is_none() {
            tracing::warn!(
                variable = %settings.api_key_env,
                "no API key found; requests will be sent without authorization"
            );
        }

        let client = ChatCompletionsClient::new(
            &settings.base_url,
            api_key,
            &settings.model,
            settings.request_timeout(),
        )
        .context("could not set up the completion client")?;

        match client.list_models() {
            Ok(status) => tracing::info!(base_url = %settings.base_url, "{status}"),
            Err(e) => {
                tracing::warn!(error = %format!("{e:#}"), "provider connectivity check failed")
            }
        }

        let client: Arc<dyn CompletionProvider> = Arc::new(client);
        let provider = Arc::new(LoggingProvider::new(client));
        let engine = NarrativeEngine::new(provider, settings.engine_config());
        let (cmd_tx, resp_rx, worker) = EngineWorker::spawn(engine);

        Ok(Self {
            cmd_tx,
            resp_rx,
            worker: Some(worker),
            choices: Vec::new(),
        })
    }

    fn request(&self, cmd: EngineCommand) -> anyhow::Result<EngineResponse> {
        self.cmd_tx
            .send(cmd)
            .map_err(|_| anyhow!("engine worker stopped"))?;
        self.resp_rx
            .recv()
            .map_err(|_| anyhow!("engine worker stopped"))
    }

    pub fn run(&mut self) -> anyhow::Result<()> {
        let stdin = io::stdin();
        let mut lines = stdin.lock().lines();

        println!("🧪 StoryLab");
        if !self.setup(&mut lines)? {
            return Ok(());
        }
        print_help();

        loop {
            let Some(line) = prompt(&mut lines, "\n> ")? else {
                break;
            };

            match parse_command(&line, &self.choices) {
                PlayerCommand::Empty => {}
                PlayerCommand::Invalid(msg) => println!("{msg}"),
                PlayerCommand::Help => print_help(),
                PlayerCommand::Quit => break,
                PlayerCommand::Choice(choice) => self.play(choice, true)?,
                PlayerCommand::Text(text) => self.play(text, false)?,
                PlayerCommand::Status => {
                    if let EngineResponse::Characters(characters) =
                        self.request(EngineCommand::CharacterState)?
                    {
                        print_characters(&characters);
                    }
                }
                PlayerCommand::Timeline => {
                    if let EngineResponse::Timeline(items) = self.request(EngineCommand::Timeline {
                        width: TIMELINE_WIDTH,
                    })? {
                        println!("📜 Story Timeline");
                        for item in items {
                            println!("  Turn {}: {}", item.turn, item.preview);
                        }
                    }
                }
                PlayerCommand::Export(path) => {
                    if let EngineResponse::Story(story) =
                        self.request(EngineCommand::ExportStory)?
                    {
                        std::fs::write(&path, story)
                            .with_context(|| format!("could not write {}", path.display()))?;
                        println!("📝 Story written to {}", path.display());
                    }
                }
                PlayerCommand::Save(path) => match self.request(EngineCommand::SaveSession)? {
                    EngineResponse::SessionJson(json) => {
                        std::fs::write(&path, json)
                            .with_context(|| format!("could not write {}", path.display()))?;
                        println!("💾 Session saved to {}", path.display());
                    }
                    EngineResponse::SessionNotSaved(reason) => {
                        println!("Could not save the session: {reason}")
                    }
                    _ => {}
                },
                PlayerCommand::Reset => {
                    self.request(EngineCommand::Reset)?;
                    self.choices.clear();
                    println!("🔄 New story with new characters.");
                    if !self.setup(&mut lines)? {
                        break;
                    }
                }
            }
        }

        Ok(())
    }

    fn play(&mut self, text: String, is_choice: bool) -> anyhow::Result<()> {
        println!("Thinking...");
        let response = self.request(EngineCommand::PlayerInput { text, is_choice })?;
        self.show(response);
        Ok(())
    }

    fn show(&mut self, response: EngineResponse) {
        match response {
            EngineResponse::Step {
                outcome,
                characters,
            } => {
                print_outcome(&outcome);
                print_characters(&characters);
                // Keep the previous choices on failure so the player can retry.
                if outcome.is_finalized() {
                    self.choices = outcome.choices().to_vec();
                }
            }
            EngineResponse::NoStory => println!("No story is running. Use /reset to start one."),
            EngineResponse::SetupFailed(e) => println!("Could not start the story: {e}"),
            _ => {}
        }
    }

    /// Returns false when input ended before a story started.
    fn setup<B: BufRead>(&mut self, lines: &mut io::Lines<B>) -> anyhow::Result<bool> {
        loop {
            println!("\nSelect a genre for your story:");
            for (i, genre) in GENRES.iter().enumerate() {
                println!("  {}. {genre}", i + 1);
            }
            let Some(line) = prompt(lines, "genre [1]: ")? else {
                return Ok(false);
            };
            let Some(genre) = parse_genre(&line) else {
                println!("Unknown genre '{}'.", line.trim());
                continue;
            };

            let mut roster = Vec::new();
            println!("\nRecommended characters:");
            for rec in recommendations(genre) {
                println!("  {} ({}): {}", rec.name, rec.role, rec.description);
            }
            let Some(answer) = prompt(lines, "Use them? [Y/n]: ")? else {
                return Ok(false);
            };
            if !answer.trim().eq_ignore_ascii_case("n") {
                roster.extend(recommendations(genre).iter().map(|r| r.to_character()));
            }

            println!("Add custom characters as `Name: Role`, empty line when done.");
            loop {
                let Some(line) = prompt(lines, "character: ")? else {
                    return Ok(false);
                };
                if line.trim().is_empty() {
                    break;
                }
                match parse_custom_character(&line) {
                    Some(character) => roster.push(character),
                    None => println!("Please enter both a name and a role."),
                }
            }

            println!("\nSetting the scene...");
            let response = self.request(EngineCommand::StartStory {
                genre: genre.to_string(),
                roster,
            })?;
            let started = matches!(response, EngineResponse::Step { .. });
            self.show(response);
            if started {
                return Ok(true);
            }
        }
    }
}

impl Drop for TerminalApp {
    fn drop(&mut self) {
        // Closing the command channel ends the worker loop.
        let (tx, _) = std::sync::mpsc::channel();
        drop(std::mem::replace(&mut self.cmd_tx, tx));
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                tracing::error!("engine worker panicked");
            }
        }
    }
}

fn prompt<B: BufRead>(lines: &mut io::Lines<B>, label: &str) -> anyhow::Result<Option<String>> {
    print!("{label}");
    io::stdout().flush()?;
    lines.next().transpose().context("could not read input")
}

fn print_outcome(outcome: &StepOutcome) {
    println!("\n{}", outcome.narrative());
    if !outcome.choices().is_empty() {
        println!("\nChoose your next action:");
        for (i, choice) in outcome.choices().iter().enumerate() {
            println!("  {}. {choice}", i + 1);
        }
    }
}

fn print_characters(characters: &[Character]) {
    println!("\n🧙 Character Status");
    for c in characters {
        println!("  {} ({}) 📍 {}", c.name, c.role, c.location);
    }
}

fn print_help() {
    println!(
        "\nType a number to pick an option or write your own action.\n\
         Commands: /status /timeline /export [path] /save [path] /reset /help /quit"
    );
}
