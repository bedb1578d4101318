// Prompt-execution pipeline: context construction, outcome resolution,
// aggregation and run orchestration. All backend calls go through llm_client.

pub mod aggregate;
pub mod context;
pub mod outcome;
pub mod runner;
