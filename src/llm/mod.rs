use anyhow::Result;

use crate::types::TokenLogProb;

pub mod openai;

/// A chat completion plus the per-token logprob records the confidence
/// scorer needs.
#[derive(Debug, Clone)]
pub struct Generation {
    pub text: String,
    pub logprobs: Vec<TokenLogProb>,
}

/// Transport for the generative verification path.
#[async_trait::async_trait]
pub trait Generator: Send + Sync {
    async fn generate(&self, prompt: &str) -> Result<Generation>;
}

/// Transport for the classifier verification path. Returns one embedding per
/// prompt, in prompt order, whatever order the underlying calls complete in.
#[async_trait::async_trait]
pub trait Embedder: Send + Sync {
    async fn embed_many(&self, prompts: Vec<String>) -> Result<Vec<Vec<f64>>>;
}

/// A transport able to serve either verification strategy.
pub trait Transport: Generator + Embedder {}

impl<T: Generator + Embedder> Transport for T {}
