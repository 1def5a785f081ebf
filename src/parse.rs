use std::collections::BTreeSet;

use crate::error::VerifyError;
use crate::types::ParsedClaim;

/// Terminates one claim segment in the model's markup output.
const SEGMENT_END: &str = "<end||r>";
/// Separates the tokens inside one claim segment.
const TOKEN_DELIM: &str = "><";

/// One comma-separated clause of a `|cite|` payload.
///
/// The clause grammar is a closed set: a numeric range (either `-` or the
/// word `to` as separator), a single integer, or anything else. Unparseable
/// clauses (the model frequently emits `None`) contribute no citation ids
/// and are not an error.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CitationClause {
    Range(u32, u32),
    Single(u32),
    Unparseable,
}

impl CitationClause {
    /// Parses one clause after its `|` and `s` characters are stripped.
    fn parse(raw: &str) -> Self {
        let stripped: String = raw.chars().filter(|c| *c != '|' && *c != 's').collect();
        if let Some((lo, hi)) = stripped.split_once('-') {
            return match (lo.trim().parse(), hi.trim().parse()) {
                (Ok(lo), Ok(hi)) => CitationClause::Range(lo, hi),
                _ => CitationClause::Unparseable,
            };
        }
        if let Some((lo, hi)) = stripped.split_once("to") {
            return match (lo.trim().parse(), hi.trim().parse()) {
                (Ok(lo), Ok(hi)) => CitationClause::Range(lo, hi),
                _ => CitationClause::Unparseable,
            };
        }
        match stripped.trim().parse() {
            Ok(n) => CitationClause::Single(n),
            Err(_) => CitationClause::Unparseable,
        }
    }

    fn expand_into(self, ids: &mut BTreeSet<u32>) {
        match self {
            CitationClause::Range(lo, hi) => ids.extend(lo..=hi),
            CitationClause::Single(n) => {
                ids.insert(n);
            }
            CitationClause::Unparseable => {}
        }
    }
}

/// Expands a citation payload such as `|s1-s4|` or `|s1|,|s2|` into the set
/// of cited sentence ids.
pub fn parse_citations(payload: &str) -> BTreeSet<u32> {
    let mut ids = BTreeSet::new();
    for clause in payload.split(',') {
        CitationClause::parse(clause).expand_into(&mut ids);
    }
    ids
}

/// Parses every `<end||r>`-terminated claim segment of a generative model's
/// output, keeping per-segment results so a single malformed segment does
/// not hide the rest.
pub fn parse_segments(response: &str) -> Vec<Result<ParsedClaim, VerifyError>> {
    response
        .split(SEGMENT_END)
        .filter(|s| !s.is_empty())
        .enumerate()
        .map(|(i, s)| parse_segment(s, i))
        .collect()
}

/// Parses a full markup response into claims, failing on the first
/// malformed segment.
pub fn parse_claims(response: &str) -> Result<Vec<ParsedClaim>, VerifyError> {
    parse_segments(response).into_iter().collect()
}

fn malformed(segment: usize, reason: &str) -> VerifyError {
    VerifyError::MalformedMarkup { segment, reason: reason.to_string() }
}

/// Takes the text between the pipes of a `<|r{id}|` tag, drops the tag
/// character, and parses the remaining digits.
fn claim_id_from_tag(token: &str, segment: usize) -> Result<u32, VerifyError> {
    let tag = token
        .split('|')
        .nth(1)
        .ok_or_else(|| malformed(segment, "claim tag has no pipe-delimited body"))?;
    tag.strip_prefix('r')
        .ok_or_else(|| malformed(segment, "claim tag does not start with 'r'"))?
        .parse()
        .map_err(|_| malformed(segment, "claim tag carries no parseable id"))
}

fn parse_segment(segment_text: &str, segment: usize) -> Result<ParsedClaim, VerifyError> {
    let tokens: Vec<&str> = segment_text.split(TOKEN_DELIM).collect();
    if tokens.len() < 3 {
        return Err(malformed(segment, "segment has fewer than three tokens"));
    }

    let claim_id = claim_id_from_tag(tokens[0], segment)?;
    let claim_text = tokens[1].to_string();
    if !tokens[2].starts_with("|subclaims|") {
        return Err(malformed(segment, "missing |subclaims| marker"));
    }

    let mut subclaims = Vec::new();
    let mut resume = tokens.len();
    for (i, token) in tokens.iter().enumerate().skip(3) {
        if token.starts_with("end||subclaims") {
            resume = i + 1;
            break;
        }
        subclaims.push(token.to_string());
    }

    // Labeled markers may appear in any order; a repeated marker's last
    // occurrence wins, so the scan never stops early.
    let mut citation_payload: Option<usize> = None;
    let mut explanation: Option<usize> = None;
    let mut supported: Option<bool> = None;
    for (i, token) in tokens.iter().enumerate().skip(resume) {
        if token.starts_with("|cite|") {
            citation_payload = Some(i + 1);
        } else if token.starts_with("|explain|") {
            explanation = Some(i + 1);
        } else if token.starts_with("|supported|") {
            supported = Some(true);
        } else if token.starts_with("|unsupported|") {
            supported = Some(false);
        }
    }

    let citation_payload = citation_payload
        .and_then(|i| tokens.get(i))
        .ok_or_else(|| malformed(segment, "missing |cite| payload"))?;
    let explanation = explanation
        .and_then(|i| tokens.get(i))
        .ok_or_else(|| malformed(segment, "missing |explain| payload"))?;
    let supported =
        supported.ok_or_else(|| malformed(segment, "missing support label"))?;

    Ok(ParsedClaim {
        claim_id,
        claim_text,
        subclaims,
        citation_ids: parse_citations(citation_payload),
        explanation: explanation.to_string(),
        supported,
    })
}
