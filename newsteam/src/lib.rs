//! Headline fetching and LLM summarization.
//!
//! [`pipeline::NewsPipeline`] ties a [`news::NewsSource`] to an
//! [`llm::LlmProvider`]; `console` and `server` are the two front ends.

pub mod console;
pub mod llm;
pub mod news;
pub mod pipeline;
pub mod server;
