mod error;
mod messages_request;

pub use error::{AnthropicErrorBody, AnthropicErrorObject};
pub use messages_request::{
    AnthropicContentBlock, AnthropicMessage, AnthropicTool, MessagesRequest,
};
