//! System prompt and output-format instructions.
//!
//! The format instructions embed the JSON schema of [`ResearchResponse`] so the
//! model knows exactly which object to produce inside the `<result>` tags.
//!
//! [`ResearchResponse`]: crate::response::ResearchResponse

use serde_json::{json, Value};

/// Default research-assistant instructions. `{format_instructions}` is replaced
/// by [`format_instructions`].
pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a research assistant that will help generate a research paper. \
Answer the user query and use necessary tools. \
IMPORTANT: Your final response MUST be a valid JSON object. \
Escape any double quotes within string values (e.g., use \\\" instead of \"). \
Wrap the final output in <result> tags.\n{format_instructions}";

const FORMAT_PREAMBLE: &str = r#"The output should be formatted as a JSON instance that conforms to the JSON schema below.

As an example, for the schema {"properties": {"foo": {"title": "Foo", "description": "a list of strings", "type": "array", "items": {"type": "string"}}}, "required": ["foo"]}
the object {"foo": ["bar", "baz"]} is a well-formatted instance of the schema. The object {"properties": {"foo": ["bar", "baz"]}} is not well-formatted.

Here is the output schema:"#;

/// JSON schema of the structured research response.
pub fn response_schema() -> Value {
    json!({
        "properties": {
            "topic": {
                "description": "The main topic of the research",
                "title": "Topic",
                "type": "string"
            },
            "summary": {
                "description": "A comprehensive summary of the findings",
                "title": "Summary",
                "type": "string"
            },
            "sources": {
                "description": "List of sources used",
                "items": { "type": "string" },
                "title": "Sources",
                "type": "array"
            },
            "tools_used": {
                "description": "List of tools used by the agent",
                "items": { "type": "string" },
                "title": "Tools Used",
                "type": "array"
            }
        },
        "required": ["topic", "summary", "sources", "tools_used"]
    })
}

/// Instructions telling the model how to shape its final answer.
pub fn format_instructions() -> String {
    format!("{FORMAT_PREAMBLE}\n```\n{}\n```", response_schema())
}

/// Fill a prompt template's `{format_instructions}` slot.
pub fn render_system_prompt(template: &str) -> String {
    template.replace("{format_instructions}", &format_instructions())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_schema_requires_all_fields() {
        let schema = response_schema();
        let required: Vec<&str> = schema["required"]
            .as_array()
            .unwrap()
            .iter()
            .filter_map(Value::as_str)
            .collect();
        assert_eq!(required, ["topic", "summary", "sources", "tools_used"]);
        assert_eq!(schema["properties"]["sources"]["type"], "array");
    }

    #[test]
    fn test_format_instructions_embed_schema() {
        let instructions = format_instructions();
        assert!(instructions.starts_with("The output should be formatted as a JSON instance"));
        assert!(instructions.contains("\"tools_used\""));
        assert!(instructions.ends_with("```"));
    }

    #[test]
    fn test_default_prompt_rendered() {
        let prompt = render_system_prompt(DEFAULT_SYSTEM_PROMPT);
        assert!(prompt.starts_with("You are a research assistant"));
        assert!(prompt.contains("Wrap the final output in <result> tags.\nThe output should"));
        assert!(!prompt.contains("{format_instructions}"));
    }
}
