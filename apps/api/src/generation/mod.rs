//! AI flashcard generation pipeline: prompt construction, one structured
//! OpenRouter call, audit persistence, proposal mapping.

pub mod handlers;
pub mod prompts;
pub mod service;
