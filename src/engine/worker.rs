use std::sync::mpsc::{self, Receiver, Sender};
use std::thread::{self, JoinHandle};

use crate::engine::engine::NarrativeEngine;
use crate::engine::protocol::{EngineCommand, EngineResponse, StepOutcome};
use crate::model::session::Session;

/// Runs the engine on its own thread, one command at a time.
///
/// Commands are handled strictly in order, so a step always completes
/// before the next one starts.
pub struct EngineWorker {
    rx: Receiver<EngineCommand>,
    tx: Sender<EngineResponse>,
    engine: NarrativeEngine,
    session: Option<Session>,
}

impl EngineWorker {
    pub fn new(
        engine: NarrativeEngine,
        rx: Receiver<EngineCommand>,
        tx: Sender<EngineResponse>,
    ) -> Self {
        Self {
            rx,
            tx,
            engine,
            session: None,
        }
    }

    /// Spawn a worker thread and hand back its channels.
    pub fn spawn(
        engine: NarrativeEngine,
    ) -> (
        Sender<EngineCommand>,
        Receiver<EngineResponse>,
        JoinHandle<()>,
    ) {
        let (cmd_tx, cmd_rx) = mpsc::channel();
        let (resp_tx, resp_rx) = mpsc::channel();

        let handle = thread::spawn(move || {
            let mut worker = EngineWorker::new(engine, cmd_rx, resp_tx);
            worker.run();
        });

        (cmd_tx, resp_rx, handle)
    }

    pub fn run(&mut self) {
        while let Ok(cmd) = self.rx.recv() {
            let response = self.handle(cmd);
            if self.tx.send(response).is_err() {
                tracing::debug!("front end hung up, stopping engine worker");
                break;
            }
        }
    }

    fn handle(&mut self, cmd: EngineCommand) -> EngineResponse {
        match cmd {
            EngineCommand::StartStory { genre, roster } => {
                match self.engine.start_session(&genre, roster) {
                    Ok(mut session) => {
                        let outcome = self.engine.open_scene(&mut session);
                        let response = step_response(&session, outcome);
                        self.session = Some(session);
                        response
                    }
                    Err(e) => EngineResponse::SetupFailed(e),
                }
            }

            EngineCommand::PlayerInput { text, is_choice } => {
                let Some(session) = self.session.as_mut() else {
                    return EngineResponse::NoStory;
                };
                let outcome = self.engine.run_step(session, &text, is_choice);
                step_response(session, outcome)
            }

            EngineCommand::CharacterState => match &self.session {
                Some(session) => EngineResponse::Characters(session.character_state()),
                None => EngineResponse::NoStory,
            },

            EngineCommand::Timeline { width } => match &self.session {
                Some(session) => EngineResponse::Timeline(session.transcript().timeline(width)),
                None => EngineResponse::NoStory,
            },

            EngineCommand::ExportStory => match &self.session {
                Some(session) => EngineResponse::Story(session.transcript().export_story()),
                None => EngineResponse::NoStory,
            },

            EngineCommand::SaveSession => match &self.session {
                Some(session) => match session.to_json() {
                    Ok(json) => EngineResponse::SessionJson(json),
                    Err(e) => EngineResponse::SessionNotSaved(e.to_string()),
                },
                None => EngineResponse::NoStory,
            },

            EngineCommand::Reset => {
                self.session = None;
                EngineResponse::ResetDone
            }
        }
    }
}

fn step_response(session: &Session, outcome: StepOutcome) -> EngineResponse {
    EngineResponse::Step {
        outcome: Box::new(outcome),
        characters: session.character_state(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::engine::EngineConfig;
    use crate::engine::testing::MockProvider;
    use crate::model::character::Character;
    use std::sync::Arc;

    #[test]
    fn worker_serves_a_story() {
        let provider = Arc::new(MockProvider::new());
        provider.queue_text("Dawn breaks.\n--- Options ---\n1. 🌅 Wake up");
        provider.queue_text("Elara walked to the Old Mill.\n--- Options ---\n1. 🚪 Knock");

        let engine = NarrativeEngine::new(provider, EngineConfig::default());
        let (tx, rx, handle) = EngineWorker::spawn(engine);

        tx.send(EngineCommand::PlayerInput {
            text: "hello".into(),
            is_choice: false,
        })
        .unwrap();
        assert!(matches!(rx.recv().unwrap(), EngineResponse::NoStory));

        tx.send(EngineCommand::StartStory {
            genre: "Fantasy".into(),
            roster: vec![
                Character::new("Elara", "Adventurer"),
                Character::new("Kael", "Ranger"),
            ],
        })
        .unwrap();
        let EngineResponse::Step { outcome, .. } = rx.recv().unwrap() else {
            panic!("expected opening step");
        };
        assert_eq!(outcome.choices(), ["🌅 Wake up"]);

        tx.send(EngineCommand::PlayerInput {
            text: "🌅 Wake up".into(),
            is_choice: true,
        })
        .unwrap();
        let EngineResponse::Step { characters, .. } = rx.recv().unwrap() else {
            panic!("expected step");
        };
        assert_eq!(characters[0].location, "Old Mill");

        tx.send(EngineCommand::ExportStory).unwrap();
        let EngineResponse::Story(story) = rx.recv().unwrap() else {
            panic!("expected story");
        };
        assert!(story.contains("*[I chose: Wake up]*"));

        drop(tx);
        handle.join().unwrap();
    }
}
