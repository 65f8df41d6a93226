mod chat_request;
mod error;
mod model_list;

pub use chat_request::{
    ChatCompletionRequest, ChatMessage, ChatMessageContent, ChatMessageContentPart, FunctionCall,
    ToolCall, ToolDeclaration,
};
pub use error::{OpenaiErrorBody, OpenaiErrorObject};
pub use model_list::{OpenaiModel, OpenaiModelList};
