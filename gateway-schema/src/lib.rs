pub mod anthropic;
pub mod gemini;
pub mod native;
pub mod openai;

pub use anthropic::MessagesRequest;
pub use native::{AntigravityRequestBody, AntigravityRequestMeta};
pub use openai::ChatCompletionRequest;
