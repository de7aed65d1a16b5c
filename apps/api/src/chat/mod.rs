// Résumé chat: prompt composition, the blocking-stream bridge, and the chat endpoints.
// All provider calls go through llm_client; no direct HTTP calls here.

pub mod bridge;
pub mod handlers;
pub mod prompts;

/// Token budget for chat answers.
pub const CHAT_MAX_TOKENS: u32 = 2048;
