//! The structured analysis recovered from the model.
//!
//! The parsed JSON is kept verbatim; nothing is validated up front. Typed
//! views read each recognized key defensively, so a missing key or a value
//! of the wrong shape reads as empty instead of failing the render.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// A theme inferred from the sampled files.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Theme {
    pub name: String,
    pub evidence: Vec<String>,
}

/// An aspirational identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FutureIdentity {
    pub title: String,
    pub why: String,
}

/// A scene description used for collage imagery.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VisionScene {
    pub theme: String,
    pub success_visualization: String,
    pub image_description: String,
}

/// Model output as parsed JSON.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct AnalysisResult(Value);

impl AnalysisResult {
    pub fn new(value: Value) -> Self {
        Self(value)
    }

    /// The underlying JSON value, unchanged.
    pub fn as_value(&self) -> &Value {
        &self.0
    }

    /// Entries of `themes` with a non-empty name.
    pub fn themes(&self) -> Vec<Theme> {
        self.objects("themes")
            .filter_map(|t| {
                let name = text(t.get("name"));
                if name.is_empty() {
                    return None;
                }
                Some(Theme {
                    name,
                    evidence: strings(t.get("evidence")),
                })
            })
            .collect()
    }

    /// Entries of `future_identities` with a non-empty title.
    pub fn future_identities(&self) -> Vec<FutureIdentity> {
        self.objects("future_identities")
            .filter_map(|fi| {
                let title = text(fi.get("title"));
                if title.is_empty() {
                    return None;
                }
                Some(FutureIdentity {
                    title,
                    why: text(fi.get("why")),
                })
            })
            .collect()
    }

    pub fn affirmations(&self) -> Vec<String> {
        strings(self.0.get("affirmations"))
    }

    pub fn action_prompts(&self) -> Vec<String> {
        strings(self.0.get("action_prompts"))
    }

    /// Entries of `vision_board_scenes` that describe an image.
    pub fn vision_board_scenes(&self) -> Vec<VisionScene> {
        self.objects("vision_board_scenes")
            .filter_map(|s| {
                let image_description = text(s.get("image_description"));
                if image_description.is_empty() {
                    return None;
                }
                Some(VisionScene {
                    theme: text(s.get("theme")),
                    success_visualization: text(s.get("success_visualization")),
                    image_description,
                })
            })
            .collect()
    }

    /// True when none of the recognized sections has content.
    pub fn is_empty(&self) -> bool {
        self.themes().is_empty()
            && self.future_identities().is_empty()
            && self.affirmations().is_empty()
            && self.action_prompts().is_empty()
    }

    fn objects<'a>(&'a self, key: &str) -> impl Iterator<Item = &'a serde_json::Map<String, Value>> {
        self.0
            .get(key)
            .and_then(Value::as_array)
            .into_iter()
            .flatten()
            .filter_map(Value::as_object)
    }
}

/// String field, with numbers and booleans rendered as text.
fn text(value: Option<&Value>) -> String {
    match value {
        Some(Value::String(s)) => s.trim().to_string(),
        Some(v @ (Value::Number(_) | Value::Bool(_))) => v.to_string(),
        _ => String::new(),
    }
}

/// Non-empty strings of an array field. A bare string counts as one entry.
fn strings(value: Option<&Value>) -> Vec<String> {
    match value {
        Some(Value::Array(items)) => items
            .iter()
            .map(|v| text(Some(v)))
            .filter(|s| !s.is_empty())
            .collect(),
        Some(Value::String(s)) if !s.trim().is_empty() => vec![s.trim().to_string()],
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_typed_views() {
        let analysis = AnalysisResult::new(json!({
            "themes": [{"name": "Quant Finance", "evidence": ["alpha.py", "notes.md"]}],
            "future_identities": [{"title": "Systematic Trader", "why": "You backtest everything."}],
            "affirmations": ["I ship research weekly."],
            "action_prompts": ["Write one hypothesis today."],
            "vision_board_scenes": [{
                "theme": "Quant Finance",
                "success_visualization": "A calm trading desk",
                "image_description": "sunlit desk with three monitors"
            }]
        }));

        let themes = analysis.themes();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].name, "Quant Finance");
        assert_eq!(themes[0].evidence, vec!["alpha.py", "notes.md"]);
        assert_eq!(analysis.future_identities()[0].title, "Systematic Trader");
        assert_eq!(analysis.affirmations(), vec!["I ship research weekly."]);
        assert_eq!(analysis.action_prompts().len(), 1);
        assert_eq!(analysis.vision_board_scenes()[0].theme, "Quant Finance");
        assert!(!analysis.is_empty());
    }

    #[test]
    fn test_missing_keys_read_as_empty() {
        let analysis = AnalysisResult::new(json!({}));
        assert!(analysis.themes().is_empty());
        assert!(analysis.future_identities().is_empty());
        assert!(analysis.affirmations().is_empty());
        assert!(analysis.action_prompts().is_empty());
        assert!(analysis.vision_board_scenes().is_empty());
        assert!(analysis.is_empty());
    }

    #[test]
    fn test_wrong_shapes_are_skipped() {
        let analysis = AnalysisResult::new(json!({
            "themes": [{"evidence": ["orphan"]}, "not an object", {"name": "Music", "evidence": "cello.jpg"}],
            "future_identities": {"title": "not an array"},
            "affirmations": [1, null, "I practice daily.", ""],
            "action_prompts": "Call a mentor."
        }));

        let themes = analysis.themes();
        assert_eq!(themes.len(), 1);
        assert_eq!(themes[0].evidence, vec!["cello.jpg"]);
        assert!(analysis.future_identities().is_empty());
        assert_eq!(analysis.affirmations(), vec!["1", "I practice daily."]);
        assert_eq!(analysis.action_prompts(), vec!["Call a mentor."]);
    }

    #[test]
    fn test_non_object_top_level() {
        let analysis = AnalysisResult::new(json!([1, 2, 3]));
        assert!(analysis.is_empty());
        assert_eq!(analysis.as_value(), &json!([1, 2, 3]));
    }
}
