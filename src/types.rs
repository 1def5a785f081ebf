use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, BTreeSet};

/// Half-open `[start, end)` byte offsets into a specific source string.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TextSpan {
    pub start: usize,
    pub end: usize,
}

/// A trimmed, non-empty sentence plus the span it occupies in its source.
/// Trimming elides boundary whitespace from `text` only; the span covers
/// exactly the trimmed characters in the source string.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Sentence {
    pub text: String,
    pub span: TextSpan,
}

/// Dense 1-based sentence id to span, in production order.
pub type OffsetMap = BTreeMap<u32, TextSpan>;

/// A composed generative prompt plus the offset maps needed to resolve the
/// model's sentence references back to character positions.
#[derive(Debug, Clone)]
pub struct AnnotatedPrompt {
    pub prompt: String,
    pub context_offsets: OffsetMap,
    pub response_offsets: OffsetMap,
}

/// One classifier prompt per response sentence, plus the response offsets.
#[derive(Debug, Clone)]
pub struct ClassifierPrompts {
    pub prompts: Vec<String>,
    pub response_offsets: OffsetMap,
}

/// One claim as parsed out of a generative model's markup response, before
/// a confidence score is attached.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParsedClaim {
    pub claim_id: u32,
    pub claim_text: String,
    pub subclaims: Vec<String>,
    pub citation_ids: BTreeSet<u32>,
    pub explanation: String,
    pub supported: bool,
}

/// A verified claim in the original response text, ready for presentation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Claim {
    pub start_offset: usize,
    pub end_offset: usize,
    pub citation_ids: Vec<String>,
    pub score: f64,
    pub rationale: String,
}

/// A context sentence span offered as evidence for one or more claims.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Citation {
    pub start_offset: usize,
    pub end_offset: usize,
    pub id: String,
}

/// The artifact handed to the presentation layer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyResponse {
    pub claims: Vec<Claim>,
    pub citations: BTreeMap<String, Citation>,
}

/// An inbound verification request: `input` is the candidate response text
/// whose claims are checked against `context`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VerifyRequest {
    pub input: String,
    pub context: String,
    pub model: Option<String>,
}

/// One generated token with its top-k alternatives, as reported by the
/// completion endpoint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenLogProb {
    pub token: String,
    pub logprob: f64,
    #[serde(default)]
    pub top_logprobs: Vec<TopLogProb>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TopLogProb {
    pub token: String,
    pub logprob: f64,
}

/// Partial mapping from a restricted label vocabulary to linear probability.
/// Entries are independently derived from top-k logprobs and are not
/// renormalized, so values need not sum to 1.
pub type TokenProbability = BTreeMap<String, f64>;
