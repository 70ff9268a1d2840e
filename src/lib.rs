//! Narrative orchestration engine: drives a tool-augmented conversation with
//! a chat-completions provider, tracks where characters are, and splits each
//! answer into prose and the player's next choices.

pub mod engine;
pub mod model;

pub use engine::engine::{EngineConfig, NarrativeEngine};
pub use engine::llm_client::{
    ChatCompletionsClient, CompletionProvider, CompletionRequest, CompletionResponse,
    LoggingProvider, ProviderError, ProviderErrorKind,
};
pub use engine::narrative_parser::{parse_narrative, ParsedResponse, OPTIONS_SEPARATOR};
pub use engine::protocol::{StepError, StepOutcome, StepReport, ToolRound};
pub use engine::world_tracker::{ReconciliationPolicy, WorldTracker};
pub use model::character::{Character, CharacterRegistry, SetupError};
pub use model::session::Session;
