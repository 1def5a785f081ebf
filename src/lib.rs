//! Claim verification against a reference document.
//!
//! The core pipeline turns a context and a candidate response into a
//! model-ready prompt with exact per-sentence offsets, then parses the
//! model's markup output (or an embedding classifier's vectors) back into
//! structured claims with citations and confidence scores in `[0, 1]`.

pub mod config;
pub mod error;
pub mod llm;
pub mod parse;
pub mod pipeline;
pub mod prompt;
pub mod score;
pub mod segment;
pub mod server;
pub mod types;

pub use error::VerifyError;
pub use types::{Citation, Claim, VerifyRequest, VerifyResponse};
