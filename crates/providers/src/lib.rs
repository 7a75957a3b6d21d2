pub mod openai_compat;
pub mod traits;
pub(crate) mod sse;
pub mod util;

// Re-exports for convenience.
pub use openai_compat::OpenAiCompatProvider;
pub use traits::{ChatRequest, LlmProvider};
