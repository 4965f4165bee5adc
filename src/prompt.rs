//! Prompt text sent to the model.

use crate::payload::EncodedPayload;

const SCHEMA_JSON: &str = r#"Return ONLY strict minified JSON with this schema:
{
  "themes": [{"name": "string", "evidence": ["file_or_snippet_ref"...]}],
  "future_identities": [{"title": "string", "why": "string"}],
  "affirmations": ["string", "string", "string"],
  "action_prompts": ["string", "string"]
}"#;

const SCENES_SCHEMA_JSON: &str = r#"Return ONLY strict minified JSON with this schema:
{
  "themes": [{"name": "string", "evidence": ["file_or_snippet_ref"...]}],
  "future_identities": [{"title": "string", "why": "string"}],
  "affirmations": ["string", "string", "string"],
  "action_prompts": ["string", "string"],
  "vision_board_scenes": [{"theme": "string", "success_visualization": "string", "image_description": "string"}]
}"#;

const GUIDELINES: &str = r#"Guidelines:
- Prefer concrete, domain-specific themes (e.g., "Quant Finance", "AI Engineering", "Classical Music")
- Each theme should cite 1-3 evidence refs (file names or short phrases).
- Affirmations should be short, present-tense, identity-based ("I am…" "I consistently…").
- Action prompts are 1-sentence nudges the user can do today."#;

const SCENES_GUIDELINE: &str = "- Vision board scenes (up to 4) describe one photographic image per theme, \
with no text in the picture.";

const SPARSE_NOTE: &str = "Note: no readable text could be extracted, so each entry below carries \
only its file name. Treat this evidence as weak and keep inferences modest.";

/// Options controlling what the prompt asks for.
#[derive(Debug, Clone, Default)]
pub struct PromptOptions {
    /// Ask for `vision_board_scenes` as well
    pub include_scenes: bool,
}

/// Build the theme-mining prompt around an encoded payload.
pub fn themes_prompt(payload: &EncodedPayload, options: &PromptOptions) -> String {
    let schema = if options.include_scenes {
        SCENES_SCHEMA_JSON
    } else {
        SCHEMA_JSON
    };

    let mut prompt = String::with_capacity(payload.json.len() + 1500);
    prompt.push_str(
        "You are an identity mining & motivation assistant.\n\
         You receive local file names and short snippets (private; never exfiltrate).\n\
         Infer the user's strongest themes and aspirational identities.\n\
         Ground your inferences in the evidence you see.\n\n",
    );
    prompt.push_str(schema);
    prompt.push_str("\n\n");
    prompt.push_str(GUIDELINES);
    prompt.push('\n');
    if options.include_scenes {
        prompt.push_str(SCENES_GUIDELINE);
        prompt.push('\n');
    }
    prompt.push('\n');
    if payload.sparse {
        prompt.push_str(SPARSE_NOTE);
        prompt.push_str("\n\n");
    }
    prompt.push_str(&format!(
        "Here are {} sampled files/snippets as JSON:\n",
        payload.records.len()
    ));
    prompt.push_str(&payload.json);
    prompt.push('\n');
    prompt
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::payload::{encode, encode_fallback, FileRecord, ShrinkLimits};
    use std::path::PathBuf;

    #[test]
    fn test_prompt_embeds_payload_and_schema() {
        let payload = encode(
            &[FileRecord::new("/n/a.md", "a.md", "practice scales")],
            &ShrinkLimits::default(),
        );
        let prompt = themes_prompt(&payload, &PromptOptions::default());
        assert!(prompt.contains(&payload.json));
        assert!(prompt.contains("\"future_identities\""));
        assert!(prompt.contains("Here are 1 sampled files"));
        assert!(!prompt.contains("vision_board_scenes"));
        assert!(!prompt.contains("only its file name"));
    }

    #[test]
    fn test_prompt_with_scenes() {
        let payload = encode(&[], &ShrinkLimits::default());
        let prompt = themes_prompt(
            &payload,
            &PromptOptions {
                include_scenes: true,
            },
        );
        assert!(prompt.contains("vision_board_scenes"));
        assert!(prompt.contains("image_description"));
    }

    #[test]
    fn test_sparse_payload_is_flagged() {
        let payload = encode_fallback(&[PathBuf::from("/d/novel-outline.pdf")], &ShrinkLimits::default());
        let prompt = themes_prompt(&payload, &PromptOptions::default());
        assert!(prompt.contains("only its file name"));
        assert!(prompt.contains("novel-outline"));
    }
}
