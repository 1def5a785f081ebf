use unicode_segmentation::UnicodeSegmentation;

use crate::error::VerifyError;
use crate::types::{OffsetMap, Sentence, TextSpan};

/// Boundary units shorter than this (after trimming) are merged into the
/// following unit under [`SegmentPolicy::MinLenMerge`].
const MIN_SENTENCE_LEN: usize = 8;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentPolicy {
    /// Keep every boundary-delimited unit whose trimmed length is > 0.
    Standard,
    /// Units of trimmed length <= 8 chars are held as a pending prefix and
    /// merged into the next qualifying unit. A short prefix left over at end
    /// of input is dropped.
    MinLenMerge,
}

/// Splits `text` on UAX #29 sentence boundaries and maps every resulting
/// sentence back to its exact span in `text`.
///
/// Offsets are recovered by re-scanning the source with a monotonically
/// advancing cursor, so spans are non-decreasing and duplicate substrings
/// elsewhere in the text cannot mislead the search. A sentence that cannot
/// be found at or after the cursor is an input-integrity fault and surfaces
/// as [`VerifyError::OffsetNotFound`].
pub fn segment(text: &str, policy: SegmentPolicy) -> Result<Vec<Sentence>, VerifyError> {
    locate(text, boundary_units(text, policy))
}

/// Builds the dense 1-based id -> span map for sentences in production order.
pub fn offset_map(sentences: &[Sentence]) -> OffsetMap {
    sentences
        .iter()
        .enumerate()
        .map(|(i, s)| (i as u32 + 1, s.span))
        .collect()
}

fn boundary_units(text: &str, policy: SegmentPolicy) -> Vec<String> {
    match policy {
        SegmentPolicy::Standard => text
            .split_sentence_bounds()
            .map(|u| u.trim().to_string())
            .filter(|u| !u.is_empty())
            .collect(),
        SegmentPolicy::MinLenMerge => {
            let mut out = Vec::new();
            // Pending keeps the raw text (inter-sentence whitespace included)
            // so the merged unit stays a contiguous substring of the source.
            let mut pending = String::new();
            for unit in text.split_sentence_bounds() {
                pending.push_str(unit);
                if pending.trim().chars().count() > MIN_SENTENCE_LEN {
                    out.push(pending.trim().to_string());
                    pending.clear();
                }
            }
            out
        }
    }
}

fn locate(text: &str, units: Vec<String>) -> Result<Vec<Sentence>, VerifyError> {
    let mut cursor = 0usize;
    let mut out = Vec::with_capacity(units.len());
    for unit in units {
        match text[cursor..].find(&unit) {
            Some(rel) => {
                let start = cursor + rel;
                let end = start + unit.len();
                cursor = end;
                out.push(Sentence {
                    text: unit,
                    span: TextSpan { start, end },
                });
            }
            None => return Err(VerifyError::OffsetNotFound { text: unit, cursor }),
        }
    }
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn reconstruct(text: &str, sentences: &[Sentence]) -> String {
        let mut out = String::new();
        let mut cursor = 0usize;
        for s in sentences {
            out.push_str(&text[cursor..s.span.start]);
            out.push_str(&s.text);
            cursor = s.span.end;
        }
        out.push_str(&text[cursor..]);
        out
    }

    #[test]
    fn segments_basic_unicode() {
        let txt = "Hello world.  Καλημέρα κόσμε!  你好。";
        let s = segment(txt, SegmentPolicy::Standard).unwrap();
        assert!(s.len() >= 3);
        assert_eq!(s[0].text, "Hello world.");
        assert_eq!(&txt[s[0].span.start..s[0].span.end], "Hello world.");
    }

    #[test]
    fn decimals_and_lowercase_continuations_do_not_split() {
        let txt = "He paid 4.5 dollars, e.g. with coins. He left.";
        let s = segment(txt, SegmentPolicy::Standard).unwrap();
        assert_eq!(s.len(), 2);
        assert_eq!(s[0].text, "He paid 4.5 dollars, e.g. with coins.");
    }

    #[test]
    fn round_trip_reconstructs_source() {
        let txt = "  First one.   Second one!\n\nThird?  ";
        for policy in [SegmentPolicy::Standard, SegmentPolicy::MinLenMerge] {
            let s = segment(txt, policy).unwrap();
            assert_eq!(reconstruct(txt, &s), txt);
        }
    }

    #[test]
    fn spans_are_monotone_and_disjoint() {
        let txt = "A cat. A cat. A cat. Still a cat.";
        let s = segment(txt, SegmentPolicy::Standard).unwrap();
        for w in s.windows(2) {
            assert!(w[0].span.end <= w[1].span.start);
        }
        // Duplicate substrings must each resolve to their own occurrence.
        let starts: Vec<_> = s.iter().map(|x| x.span.start).collect();
        assert_eq!(starts.len(), 4);
        assert!(starts.windows(2).all(|w| w[0] < w[1]));
    }

    #[test]
    fn min_len_merge_absorbs_short_units() {
        let txt = "Ok. This is a longer sentence.";
        let s = segment(txt, SegmentPolicy::MinLenMerge).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].text, "Ok. This is a longer sentence.");
        assert_eq!(s[0].span, TextSpan { start: 0, end: txt.len() });
    }

    #[test]
    fn trailing_short_prefix_is_dropped() {
        let txt = "This is a longer sentence. Ok.";
        let s = segment(txt, SegmentPolicy::MinLenMerge).unwrap();
        assert_eq!(s.len(), 1);
        assert_eq!(s[0].text, "This is a longer sentence.");
    }

    #[test]
    fn unlocatable_sentence_is_an_error() {
        let err = locate("abc", vec!["zzz".to_string()]).unwrap_err();
        assert!(matches!(err, VerifyError::OffsetNotFound { cursor: 0, .. }));
    }

    #[test]
    fn offset_map_ids_are_dense_from_one() {
        let txt = "One sentence here. Another sentence there.";
        let s = segment(txt, SegmentPolicy::Standard).unwrap();
        let map = offset_map(&s);
        assert_eq!(map.keys().copied().collect::<Vec<_>>(), vec![1, 2]);
        assert_eq!(map[&1], s[0].span);
    }
}
