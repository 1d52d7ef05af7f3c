pub mod helpers;
pub mod gemini;
pub mod openai;
