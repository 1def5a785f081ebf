use serde::{Deserialize, Serialize};

use crate::error::VerifyError;
use crate::types::{TokenLogProb, TokenProbability};

/// The restricted vocabulary a generative verifier labels claims with.
pub const SUPPORT_VOCAB: [&str; 2] = ["supported", "unsupported"];

/// Two-parameter Platt scaling applied to a classifier model's logit margin.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct PlattCalibration {
    pub a: f64,
    pub b: f64,
}

fn normalize(token: &str) -> String {
    token.trim().to_ascii_lowercase()
}

fn in_vocab(vocab: &[&str], token: &str) -> bool {
    vocab.iter().any(|v| *v == token)
}

/// Extracts one probability map per support-label position in the generated
/// token stream.
///
/// A position qualifies when its token matches a vocabulary member after
/// trimming and lowercasing. For each qualifying position the top-k
/// alternatives are filtered to the vocabulary and their logprobs converted
/// to linear probabilities. The maps stay partial: a vocabulary member
/// absent from the top-k contributes no entry, and no renormalization is
/// applied across the classes.
pub fn token_probabilities(tokens: &[TokenLogProb], vocab: &[&str]) -> Vec<TokenProbability> {
    let mut maps = Vec::new();
    for record in tokens {
        if !in_vocab(vocab, &normalize(&record.token)) {
            continue;
        }
        let mut map = TokenProbability::new();
        for alt in &record.top_logprobs {
            let candidate = normalize(&alt.token);
            if in_vocab(vocab, &candidate) {
                map.insert(candidate, alt.logprob.exp());
            }
        }
        maps.push(map);
    }
    maps
}

/// Checks the positional alignment between parsed claims and extracted
/// probability maps. The two sequences must never be zipped on a mismatch.
pub fn check_alignment(claims: usize, scores: usize) -> Result<(), VerifyError> {
    if claims != scores {
        return Err(VerifyError::Alignment { claims, scores });
    }
    Ok(())
}

/// Derives `[p_supported, p_unsupported]` from a classifier embedding.
///
/// The first two vector components are the class logits, supported first.
/// Without calibration they go through a two-way softmax; with calibration
/// the logit margin goes through `sigmoid(a * margin + b)`.
pub fn classifier_probabilities(
    embedding: &[f64],
    calibration: Option<PlattCalibration>,
) -> [f64; 2] {
    let supported_logit = embedding.first().copied().unwrap_or(0.0);
    let unsupported_logit = embedding.get(1).copied().unwrap_or(0.0);
    let supported = match calibration {
        Some(c) => sigmoid(c.a * (supported_logit - unsupported_logit) + c.b),
        None => softmax2(supported_logit, unsupported_logit),
    };
    [supported, 1.0 - supported]
}

fn sigmoid(z: f64) -> f64 {
    1.0 / (1.0 + (-z).exp())
}

fn softmax2(a: f64, b: f64) -> f64 {
    let m = a.max(b);
    let ea = (a - m).exp();
    let eb = (b - m).exp();
    ea / (ea + eb)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TopLogProb;

    fn label_token(token: &str, alts: &[(&str, f64)]) -> TokenLogProb {
        TokenLogProb {
            token: token.to_string(),
            logprob: alts.first().map(|a| a.1).unwrap_or(0.0),
            top_logprobs: alts
                .iter()
                .map(|(t, lp)| TopLogProb { token: t.to_string(), logprob: *lp })
                .collect(),
        }
    }

    #[test]
    fn extracts_one_map_per_label_position() {
        let tokens = vec![
            label_token("<", &[]),
            label_token("supported", &[("supported", -0.1), ("unsupported", -2.5)]),
            label_token(">", &[]),
            label_token(" Unsupported", &[("unsupported", -0.3), ("nonsense", -4.0)]),
        ];
        let maps = token_probabilities(&tokens, &SUPPORT_VOCAB);
        assert_eq!(maps.len(), 2);
        assert!((maps[0]["supported"] - (-0.1f64).exp()).abs() < 1e-12);
        assert!((maps[0]["unsupported"] - (-2.5f64).exp()).abs() < 1e-12);
        // Out-of-vocabulary alternatives contribute nothing.
        assert_eq!(maps[1].len(), 1);
        assert!(maps[1].contains_key("unsupported"));
    }

    #[test]
    fn missing_class_yields_partial_map() {
        let tokens = vec![label_token("supported", &[("supported", -0.05)])];
        let maps = token_probabilities(&tokens, &SUPPORT_VOCAB);
        assert_eq!(maps.len(), 1);
        assert!(!maps[0].contains_key("unsupported"));
    }

    #[test]
    fn alignment_mismatch_is_fatal() {
        assert!(check_alignment(2, 2).is_ok());
        let err = check_alignment(3, 2).unwrap_err();
        assert!(matches!(err, VerifyError::Alignment { claims: 3, scores: 2 }));
    }

    #[test]
    fn classifier_probabilities_stay_in_unit_interval() {
        for emb in [
            vec![0.0, 0.0],
            vec![10.0, -10.0],
            vec![-500.0, 500.0],
            vec![3.2],
            vec![],
        ] {
            let [s, u] = classifier_probabilities(&emb, None);
            assert!((0.0..=1.0).contains(&s));
            assert!((0.0..=1.0).contains(&u));
            assert!((s + u - 1.0).abs() < 1e-9);
        }
    }

    #[test]
    fn calibration_reshapes_the_margin() {
        let emb = vec![2.0, -1.0];
        let cal = PlattCalibration { a: 0.5, b: -1.0 };
        let [s, _] = classifier_probabilities(&emb, Some(cal));
        let expected = 1.0 / (1.0 + (-(0.5 * 3.0 - 1.0f64)).exp());
        assert!((s - expected).abs() < 1e-12);
        assert!((0.0..=1.0).contains(&s));
    }
}
