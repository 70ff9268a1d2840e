pub mod capability;
pub mod character;
pub mod event_result;
pub mod history;
pub mod llm_decode;
pub mod message;
pub mod presets;
pub mod session;
pub mod transcript;
