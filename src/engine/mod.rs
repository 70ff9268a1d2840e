pub mod engine;
pub mod protocol;
pub mod world_tracker;

pub mod prompt_builder;
pub mod llm_client;
pub mod narrative_parser;
pub mod tools;
pub mod testing;
pub mod worker;
