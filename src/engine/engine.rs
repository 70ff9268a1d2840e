use std::sync::Arc;

use crate::engine::llm_client::{CompletionProvider, CompletionRequest};
use crate::engine::narrative_parser::{parse_narrative, OPTIONS_SEPARATOR};
use crate::engine::prompt_builder::PromptBuilder;
use crate::engine::protocol::{StepError, StepOutcome, StepPhase, StepReport, ToolRound};
use crate::engine::tools::{self, ToolDefinition};
use crate::engine::world_tracker::{ReconciliationPolicy, WorldTracker};
use crate::model::character::{Character, CharacterRegistry, SetupError};
use crate::model::event_result::WorldUpdateReport;
use crate::model::llm_decode::decode_tool_call;
use crate::model::message::Turn;
use crate::model::session::Session;

#[derive(Debug, Clone, PartialEq)]
pub struct EngineConfig {
    pub temperature: f32,
    /// Must match what the system prompt tells the model to emit.
    pub separator: String,
    pub policy: ReconciliationPolicy,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            temperature: 0.7,
            separator: OPTIONS_SEPARATOR.to_string(),
            policy: ReconciliationPolicy::default(),
        }
    }
}

/// Drives narrative steps against a completion provider.
///
/// Stateless between steps: all conversation state lives in the `Session`
/// passed to each call.
pub struct NarrativeEngine {
    provider: Arc<dyn CompletionProvider>,
    config: EngineConfig,
    schema: Vec<ToolDefinition>,
}

impl NarrativeEngine {
    pub fn new(provider: Arc<dyn CompletionProvider>, config: EngineConfig) -> Self {
        Self {
            provider,
            config,
            schema: tools::capability_schema(),
        }
    }

    /// Validate the cast and seed a new conversation with its system turn.
    pub fn start_session(
        &self,
        genre: &str,
        roster: Vec<Character>,
    ) -> Result<Session, SetupError> {
        let registry = CharacterRegistry::from_roster(roster)?;
        let system_prompt =
            PromptBuilder::system_prompt(genre, &registry, &self.config.separator);
        let world = WorldTracker::new(registry, self.config.policy);

        tracing::info!(
            genre,
            characters = world.registry().len(),
            policy = ?world.policy(),
            "story session started"
        );
        Ok(Session::new(genre, system_prompt, world))
    }

    /// Generate the starting scene (turn 0).
    pub fn open_scene(&self, session: &mut Session) -> StepOutcome {
        let prompt =
            PromptBuilder::opening_prompt(session.world.registry(), &self.config.separator);
        let outcome = self.resolve(session, prompt);
        record_outcome(session, &outcome);
        outcome
    }

    /// Run one player step: free text, or a choice picked from the last list.
    pub fn run_step(&self, session: &mut Session, input: &str, is_choice: bool) -> StepOutcome {
        session.transcript.record_player_input(session.turn + 1, input, is_choice);
        session.turn += 1;

        let prompt = if is_choice {
            PromptBuilder::choice_prompt(input, &self.config.separator)
        } else {
            PromptBuilder::free_text_prompt(input, &self.config.separator)
        };

        let outcome = self.resolve(session, prompt);
        record_outcome(session, &outcome);
        outcome
    }

    fn request(&self, messages: Vec<Turn>) -> CompletionRequest {
        CompletionRequest {
            messages,
            tools: self.schema.clone(),
            temperature: self.config.temperature,
        }
    }

    fn resolve(&self, session: &mut Session, prompt: String) -> StepOutcome {
        session.world.begin_step();
        let mut world = WorldUpdateReport::default();

        tracing::debug!(turn = session.turn, phase = %StepPhase::AwaitingModel);
        let user_turn = Turn::user(prompt);
        let mut messages = session.history.snapshot().to_vec();
        messages.push(user_turn.clone());

        // The user turn only lands in history once the provider has answered.
        let response = match self.provider.complete(&self.request(messages)) {
            Ok(response) => response,
            Err(e) => return fail(session, StepError::ProviderCall(e), world),
        };
        session.history.append(user_turn);

        let Some(call) = response.tool_calls.first().cloned() else {
            session.history.append(Turn::assistant(response.content.clone()));
            return self.finalize(session, &response.content, None, world);
        };

        tracing::debug!(tool = %call.name(), phase = %StepPhase::ToolRequested);
        let ignored_calls = response.tool_calls.len() - 1;
        if ignored_calls > 0 {
            tracing::warn!(
                executed = %call.id,
                ignored = ignored_calls,
                "model requested several tool calls; only the first is executed"
            );
        }
        session.history.append(Turn::assistant_with_calls(
            response.content,
            response.tool_calls,
        ));

        let decoded = match decode_tool_call(&call) {
            Ok(decoded) => decoded,
            Err(e) => return fail(session, e, world),
        };

        tracing::debug!(tool = decoded.kind.name(), phase = %StepPhase::ExecutingTool);
        let (capability, acknowledgment) = match tools::execute(&decoded) {
            Ok(executed) => executed,
            Err(e) => return fail(session, e, world),
        };

        if let Some(update) = session.world.apply_authoritative(&capability) {
            world.push(update);
        }
        session.history.append(Turn::tool_result(&call, acknowledgment.clone()));

        let tool_round = ToolRound {
            call_id: call.id.clone(),
            tool: capability.short_name(),
            result: acknowledgment,
            ignored_calls,
        };

        tracing::debug!(phase = %StepPhase::AwaitingModelSecond);
        let second = match self
            .provider
            .complete(&self.request(session.history.snapshot().to_vec()))
        {
            Ok(second) => second,
            Err(e) => return fail(session, StepError::ProviderCall(e), world),
        };

        if !second.tool_calls.is_empty() {
            tracing::warn!(
                count = second.tool_calls.len(),
                "tool calls in the follow-up response are not executed"
            );
        }
        session.history.append(Turn::assistant(second.content.clone()));

        self.finalize(session, &second.content, Some(tool_round), world)
    }

    fn finalize(
        &self,
        session: &mut Session,
        text: &str,
        tool_round: Option<ToolRound>,
        mut world: WorldUpdateReport,
    ) -> StepOutcome {
        world
            .results
            .extend(session.world.apply_heuristic(text).results);

        let parsed = parse_narrative(text, &self.config.separator);
        tracing::debug!(
            phase = %StepPhase::Finalized,
            choices = parsed.choices.len(),
            world_updates = world.results.len()
        );

        StepOutcome::Finalized(StepReport {
            narrative: parsed.narrative,
            options_block: parsed.options_block,
            choices: parsed.choices,
            tool_round,
            world,
            history: session.history.snapshot().to_vec(),
        })
    }
}

fn fail(session: &Session, error: StepError, world: WorldUpdateReport) -> StepOutcome {
    tracing::warn!(phase = %StepPhase::Failed, %error, "narrative step failed");
    StepOutcome::Failed {
        error,
        world,
        history: session.history.snapshot().to_vec(),
    }
}

fn record_outcome(session: &mut Session, outcome: &StepOutcome) {
    let turn = session.turn;
    match outcome {
        StepOutcome::Finalized(report) => {
            session
                .transcript
                .record_narration(turn, &report.narrative, &report.choices)
        }
        StepOutcome::Failed { error, .. } => {
            session.transcript.record_failure(turn, &error.to_string())
        }
    }
}
