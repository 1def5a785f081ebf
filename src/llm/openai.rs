use anyhow::{Context, Result};
use async_openai::{
    config::OpenAIConfig,
    types::{
        ChatCompletionRequestMessage, ChatCompletionRequestUserMessageArgs,
        CreateChatCompletionRequestArgs, CreateEmbeddingRequestArgs,
    },
    Client,
};
use futures::{stream, StreamExt};

use super::{Embedder, Generation, Generator};
use crate::config::ModelConfig;
use crate::types::{TokenLogProb, TopLogProb};

/// How many top alternatives to request per generated token. Three is
/// enough to recover both support-label probabilities.
const TOP_LOGPROBS: u8 = 3;

/// OpenAI-compatible transport for one configured model endpoint.
#[derive(Clone)]
pub struct OpenAiTransport {
    client: Client<OpenAIConfig>,
    model: String,
    max_concurrency: usize,
}

impl OpenAiTransport {
    pub fn new(
        model: String,
        base_url: Option<String>,
        api_key: Option<String>,
        max_concurrency: usize,
    ) -> Self {
        let mut cfg = OpenAIConfig::default();
        if let Some(url) = base_url {
            cfg = cfg.with_api_base(url);
        }
        if let Some(key) = api_key {
            cfg = cfg.with_api_key(key);
        }
        let client = Client::with_config(cfg);
        Self { client, model, max_concurrency }
    }

    pub fn for_model(model: &ModelConfig, max_concurrency: usize) -> Self {
        Self::new(
            model.name.clone(),
            Some(model.api_url.clone()),
            model.api_key.clone(),
            max_concurrency,
        )
    }
}

#[async_trait::async_trait]
impl Generator for OpenAiTransport {
    async fn generate(&self, prompt: &str) -> Result<Generation> {
        let messages: Vec<ChatCompletionRequestMessage> = vec![
            ChatCompletionRequestUserMessageArgs::default()
                .content(prompt)
                .build()?
                .into(),
        ];
        let req = CreateChatCompletionRequestArgs::default()
            .model(self.model.clone())
            .messages(messages)
            .temperature(0.0)
            .logprobs(true)
            .top_logprobs(TOP_LOGPROBS)
            .build()?;

        let resp = self.client.chat().create(req).await?;
        let choice = resp
            .choices
            .into_iter()
            .next()
            .context("completion response has no choices")?;

        let text = choice.message.content.unwrap_or_default();
        let logprobs = choice
            .logprobs
            .and_then(|l| l.content)
            .unwrap_or_default()
            .into_iter()
            .map(|t| TokenLogProb {
                token: t.token,
                logprob: f64::from(t.logprob),
                top_logprobs: t
                    .top_logprobs
                    .into_iter()
                    .map(|a| TopLogProb { token: a.token, logprob: f64::from(a.logprob) })
                    .collect(),
            })
            .collect();

        Ok(Generation { text, logprobs })
    }
}

#[async_trait::async_trait]
impl Embedder for OpenAiTransport {
    async fn embed_many(&self, prompts: Vec<String>) -> Result<Vec<Vec<f64>>> {
        let reqs = prompts.into_iter().enumerate().map(|(idx, input)| {
            let client = self.client.clone();
            let model = self.model.clone();
            async move {
                let req = CreateEmbeddingRequestArgs::default()
                    .model(model)
                    .input(input)
                    .build()?;
                let resp = client.embeddings().create(req).await?;
                let first = resp
                    .data
                    .into_iter()
                    .next()
                    .context("embedding response has no data")?;
                let vector = first.embedding.into_iter().map(f64::from).collect::<Vec<_>>();
                Ok::<_, anyhow::Error>((idx, vector))
            }
        });

        // Dispatch concurrently, then restore prompt order: completion order
        // is not request order.
        let mut out = stream::iter(reqs)
            .buffer_unordered(self.max_concurrency)
            .collect::<Vec<_>>()
            .await;
        out.sort_by_key(|r| r.as_ref().map(|(i, _)| *i).unwrap_or(usize::MAX));

        let mut vectors = Vec::with_capacity(out.len());
        for r in out {
            let (_, v) = r?;
            vectors.push(v);
        }
        Ok(vectors)
    }
}
