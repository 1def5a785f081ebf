use std::collections::BTreeMap;

use anyhow::Result;
use tracing::debug;

use crate::config::ModelConfig;
use crate::error::VerifyError;
use crate::llm::{Embedder, Generator, Transport};
use crate::parse::parse_claims;
use crate::prompt::{build_classifier, build_generative};
use crate::score::{
    check_alignment, classifier_probabilities, token_probabilities, SUPPORT_VOCAB,
};
use crate::types::{
    AnnotatedPrompt, Citation, Claim, ClassifierPrompts, ParsedClaim, TokenProbability,
    VerifyResponse,
};

/// Merges parsed claims with their positionally aligned probability maps and
/// resolves sentence references against the prompt's offset maps.
///
/// Citations are emitted only for context sentences actually referenced by
/// at least one claim; a cited id outside the context map is dropped from
/// the citation table but kept on the claim.
pub fn assemble_generative(
    parsed: Vec<ParsedClaim>,
    probabilities: Vec<TokenProbability>,
    prompt: &AnnotatedPrompt,
) -> Result<VerifyResponse, VerifyError> {
    check_alignment(parsed.len(), probabilities.len())?;

    let mut claims = Vec::with_capacity(parsed.len());
    let mut citations = BTreeMap::new();
    for (claim, map) in parsed.into_iter().zip(probabilities) {
        let span = prompt
            .response_offsets
            .get(&claim.claim_id)
            .ok_or(VerifyError::ClaimOffsetMissing { claim_id: claim.claim_id })?;
        let score = map
            .get("supported")
            .copied()
            .ok_or(VerifyError::MissingScore { claim_id: claim.claim_id })?;

        for cited in &claim.citation_ids {
            if let Some(cite_span) = prompt.context_offsets.get(cited) {
                citations.entry(cited.to_string()).or_insert(Citation {
                    start_offset: cite_span.start,
                    end_offset: cite_span.end,
                    id: cited.to_string(),
                });
            }
        }

        claims.push(Claim {
            start_offset: span.start,
            end_offset: span.end,
            citation_ids: claim.citation_ids.iter().map(u32::to_string).collect(),
            score,
            rationale: claim.explanation,
        });
    }

    Ok(VerifyResponse { claims, citations })
}

/// Builds the per-sentence result of the classifier path. Sentence order
/// follows the offset map; the supported probabilities are positionally
/// aligned to the prompts that produced them.
pub fn assemble_classifier(
    prompts: &ClassifierPrompts,
    supported: &[f64],
) -> Result<VerifyResponse, VerifyError> {
    check_alignment(prompts.response_offsets.len(), supported.len())?;

    let claims = prompts
        .response_offsets
        .values()
        .zip(supported)
        .map(|(span, score)| Claim {
            start_offset: span.start,
            end_offset: span.end,
            citation_ids: Vec::new(),
            score: *score,
            rationale: String::new(),
        })
        .collect();

    Ok(VerifyResponse { claims, citations: BTreeMap::new() })
}

/// Runs the generative strategy end to end: prompt build, one completion
/// call, markup parse, logprob scoring, assembly.
pub async fn verify_generative(
    transport: &dyn Generator,
    context: &str,
    response: &str,
) -> Result<VerifyResponse> {
    let prompt = build_generative(context, response, None)?;
    let generation = transport.generate(&prompt.prompt).await?;
    let parsed = parse_claims(&generation.text)?;
    let probabilities = token_probabilities(&generation.logprobs, &SUPPORT_VOCAB);
    debug!(claims = parsed.len(), "parsed generative verification output");
    Ok(assemble_generative(parsed, probabilities, &prompt)?)
}

/// Runs the classifier strategy end to end: one prompt per response
/// sentence, batched embedding calls, per-sentence scoring.
pub async fn verify_classifier(
    transport: &dyn Embedder,
    model: &ModelConfig,
    context: &str,
    response: &str,
) -> Result<VerifyResponse> {
    let prompts = build_classifier(context, response)?;
    let embeddings = transport.embed_many(prompts.prompts.clone()).await?;
    let supported: Vec<f64> = embeddings
        .iter()
        .map(|e| classifier_probabilities(e, model.calibration)[0])
        .collect();
    debug!(sentences = supported.len(), "scored classifier sentences");
    Ok(assemble_classifier(&prompts, &supported)?)
}

/// Verifies `response` against `context`, selecting the strategy by model
/// capability.
pub async fn verify(
    transport: &dyn Transport,
    model: &ModelConfig,
    context: &str,
    response: &str,
) -> Result<VerifyResponse> {
    if model.is_embedding_model {
        verify_classifier(transport, model, context, response).await
    } else {
        verify_generative(transport, context, response).await
    }
}
