pub mod api;
pub mod server;
pub mod words;

pub use api::{ApiError, GenerationRequest, GenerationResponse, GeneratorState, TASK_INDEX_HEADER};
pub use server::{create_router, run_server, serve};
pub use words::{generate, LoremWords, WordSource};
