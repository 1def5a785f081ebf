use std::fmt::Write;

use crate::error::VerifyError;
use crate::segment::{offset_map, segment, SegmentPolicy};
use crate::types::{AnnotatedPrompt, ClassifierPrompts, Sentence};

pub const DEFAULT_INSTRUCTION: &str =
    "Make one or more claims about information in the documents.";

/// Tags each sentence with its 1-based position:
/// `<|{tag}{i}|><{text}><end||{tag}>`, concatenated without separators.
pub fn annotate(sentences: &[Sentence], tag: &str) -> String {
    let mut out = String::new();
    for (i, s) in sentences.iter().enumerate() {
        // Writing to a String cannot fail.
        let _ = write!(out, "<|{tag}{}|><{}><end||{tag}>", i + 1, s.text);
    }
    out
}

/// Composes the generative verification prompt from a context document and a
/// candidate response, keeping the offset maps needed to resolve the model's
/// sentence references back to character spans.
pub fn build_generative(
    context: &str,
    response: &str,
    instruction: Option<&str>,
) -> Result<AnnotatedPrompt, VerifyError> {
    let context_sentences = segment(context, SegmentPolicy::Standard)?;
    let response_sentences = segment(response, SegmentPolicy::Standard)?;
    let instruction = instruction.unwrap_or(DEFAULT_INSTRUCTION).trim();

    let prompt = format!(
        "<|context|>{}<end||context><|request|><{}><end||request><|response|>{}<end||response>",
        annotate(&context_sentences, "s"),
        instruction,
        annotate(&response_sentences, "r"),
    );

    Ok(AnnotatedPrompt {
        prompt,
        context_offsets: offset_map(&context_sentences),
        response_offsets: offset_map(&response_sentences),
    })
}

/// Builds one classifier prompt per response sentence. The response is
/// segmented under the minimum-length merge policy so the per-sentence
/// classifier never scores a fragment like "Ok." on its own.
pub fn build_classifier(
    context: &str,
    response: &str,
) -> Result<ClassifierPrompts, VerifyError> {
    let sentences = segment(response, SegmentPolicy::MinLenMerge)?;
    let context = context.trim();
    let prompts = sentences
        .iter()
        .map(|s| format!("<context>\n{context}\n</context>\n\n<claims>\n{}\n</claims>", s.text))
        .collect();

    Ok(ClassifierPrompts {
        prompts,
        response_offsets: offset_map(&sentences),
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::TextSpan;

    #[test]
    fn annotate_tags_positions_from_one() {
        let sentences = vec![
            Sentence { text: "First.".into(), span: TextSpan { start: 0, end: 6 } },
            Sentence { text: "Second.".into(), span: TextSpan { start: 7, end: 14 } },
        ];
        assert_eq!(
            annotate(&sentences, "s"),
            "<|s1|><First.><end||s><|s2|><Second.><end||s>"
        );
    }

    #[test]
    fn generative_prompt_layout() {
        let built = build_generative("Cats are mammals.", "Cats are reptiles.", None).unwrap();
        assert_eq!(
            built.prompt,
            "<|context|><|s1|><Cats are mammals.><end||s><end||context>\
             <|request|><Make one or more claims about information in the documents.><end||request>\
             <|response|><|r1|><Cats are reptiles.><end||r><end||response>"
        );
        assert_eq!(built.context_offsets[&1], TextSpan { start: 0, end: 17 });
        assert_eq!(built.response_offsets[&1], TextSpan { start: 0, end: 18 });
    }

    #[test]
    fn generative_prompt_trims_custom_instruction() {
        let built = build_generative("A fact.", "A claim.", Some("  Check this.  ")).unwrap();
        assert!(built.prompt.contains("<|request|><Check this.><end||request>"));
    }

    #[test]
    fn classifier_prompts_one_per_sentence() {
        let built = build_classifier(
            "  The sky is blue today.  ",
            "The sky is blue. The sky is enormous.",
        )
        .unwrap();
        assert_eq!(built.prompts.len(), 2);
        assert_eq!(
            built.prompts[0],
            "<context>\nThe sky is blue today.\n</context>\n\n<claims>\nThe sky is blue.\n</claims>"
        );
        assert_eq!(built.response_offsets.len(), 2);
        assert_eq!(built.response_offsets[&2], TextSpan { start: 17, end: 37 });
    }
}
