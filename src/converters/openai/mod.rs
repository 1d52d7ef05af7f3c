pub mod openai_choice;
pub mod openai_message;
pub mod openai_request;
pub mod openai_response;
pub mod openai_response_message;

pub use openai_choice::OpenAIChoice;
pub use openai_message::OpenAIMessage;
pub use openai_request::OpenAIRequest;
pub use openai_response::{NO_RESPONSE_PLACEHOLDER, OpenAIResponse};
pub use openai_response_message::OpenAIResponseMessage;
