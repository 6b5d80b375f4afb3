// Caption generation: prompt composition and the run orchestrator.
// All text-generation calls go through llm_client::TextGenerator.

pub mod composer;
pub mod handlers;
pub mod orchestrator;
pub mod prompts;
