use thiserror::Error;

/// Faults the verification core can surface to its caller.
///
/// None of these may be collapsed into an empty claim list; a parsing or
/// alignment defect has to stay visible to the rest of the system.
#[derive(Debug, Error)]
pub enum VerifyError {
    /// A claim segment in the model's markup output is missing a required
    /// marker or carries an unparseable claim-id tag. The segment index is
    /// zero-based over the non-empty segments of the response.
    #[error("malformed claim segment {segment}: {reason}")]
    MalformedMarkup { segment: usize, reason: String },

    /// The number of parsed claims and the number of extracted per-claim
    /// token-probability maps differ. The two sequences are positionally
    /// aligned and must never be zipped on a length mismatch.
    #[error("{claims} parsed claims but {scores} token-probability maps")]
    Alignment { claims: usize, scores: usize },

    /// A parsed claim id has no entry in the response offset map.
    #[error("claim {claim_id} has no response offset entry")]
    ClaimOffsetMissing { claim_id: u32 },

    /// A parsed claim's token-probability map has no "supported" entry, so
    /// no score can be produced for it.
    #[error("no supported-probability for claim {claim_id}")]
    MissingScore { claim_id: u32 },

    /// A segmented sentence could not be re-located in its source string at
    /// or after the search cursor. Indicates the input text was mutated
    /// inside a sentence, not just trimmed at its edges.
    #[error("sentence {text:?} not found at or after byte {cursor}")]
    OffsetNotFound { text: String, cursor: usize },
}
