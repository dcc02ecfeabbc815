//! Instruction text sent to the provider by each engine

use crate::types::MIN_CONFIDENCE;

pub const ANALYSIS_TEMPERATURE: f64 = 0.2;
pub const UPDATE_TEMPERATURE: f64 = 0.2;
pub const ENHANCE_TEMPERATURE: f64 = 0.7;

pub const ANALYSIS_SYSTEM_PROMPT: &str = r#"You are a precise text analysis system. Identify where the properties of a JSON structure are mentioned in a piece of text.

For every property of the JSON structure (nested properties use dotted paths such as "address.city"):
1. Look for an exact or semantically equivalent mention in the text.
2. Score your confidence from 0 to 100:
   - exact match: 90-100
   - semantic match: 60-89
   - partial match: 30-59
   - low confidence: 0-29
3. Report the property path, the matched text, its character span in the text (start inclusive, end exclusive), the confidence and the match type (exact, semantic or partial).

Respond with a single JSON object and nothing else, in exactly this shape:
{
  "matches": [{
    "property": "name",
    "matchedText": "John Smith",
    "position": { "start": 0, "end": 10 },
    "confidence": 95,
    "matchType": "exact"
  }]
}"#;

pub const UPDATE_SYSTEM_PROMPT: &str = r#"You update JSON documents with values found in text.

Rules:
- Use the original JSON as the base and keep its exact structure and nesting.
- Update only the properties listed in the matches.
- Keep every other property and its value exactly as it is.
- Keep the type of every existing value; convert matched text where needed (for example "30" becomes 30 for a number field).
- Clean and normalize matched values where appropriate.

Respond with the complete updated JSON object and nothing else."#;

pub const ENHANCE_SYSTEM_PROMPT: &str = r#"You enrich JSON documents with additional, contextually accurate details.

Rules:
- Work out the domain and context from the existing values and the supplied matches.
- Only fill fields that are empty or clearly incomplete.
- Never overwrite a populated field and never remove a property.
- Keep the structure, property names and the type of every existing value.
- Only add details that are realistic and logically connected to the existing data.

Respond with the complete enhanced JSON object and nothing else."#;

pub fn analysis_user_prompt(raw_schema: &str, text: &str) -> String {
    format!(
        "Analyze this text against the JSON structure.\n\nJSON Structure:\n{}\n\nText to Analyze:\n{}\n\nReturn the results in the exact format specified, with the \"matches\" array containing all found matches.",
        raw_schema, text
    )
}

pub fn update_user_prompt(raw_json: &str, match_data: &str) -> String {
    format!(
        "Update this JSON structure with the following matches.\n\nOriginal JSON:\n{}\n\nMatches to apply (all have confidence >= {}%):\n{}\n\nReturn only the updated JSON structure. Preserve all original properties, update only matched properties and keep the exact types of values.",
        raw_json, MIN_CONFIDENCE, match_data
    )
}

pub fn enhance_user_prompt(raw_json: &str, match_context: &str) -> String {
    format!(
        "Enhance this JSON with meaningful, contextual details.\n\nJSON with applied matches:\n{}\n\nContext from matches:\n{}\n\nReturn ONLY a valid JSON object with no additional text or explanation.",
        raw_json, match_context
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_analysis_prompt_embeds_inputs() {
        let prompt = analysis_user_prompt(r#"{"name":""}"#, "John Smith is 30");
        assert!(prompt.contains(r#"{"name":""}"#));
        assert!(prompt.contains("John Smith is 30"));
    }

    #[test]
    fn test_system_prompt_names_bands_and_shape() {
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("90-100"));
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("0-29"));
        assert!(ANALYSIS_SYSTEM_PROMPT.contains("\"matchedText\""));
        assert!(update_user_prompt("{}", "[]").contains(">= 30%"));
    }
}
