pub mod generator_client;
pub mod orchestrator;

pub use generator_client::{ClientError, GenerationResult, GeneratorClient};
pub use orchestrator::{now_millis, Orchestrator, RunParams, RunReport, TaskFailure, TaskOutcome};
