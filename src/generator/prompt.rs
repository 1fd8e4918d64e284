//! Instruction template sent to the model for every question.

pub const DEFAULT_TOPIC: &str = "General Knowledge";

const TEMPLATE: &str = r#"You are a subject matter expert on the topic: {topic}

Follow the instructions to create a quiz question:
1. Generate a question based on the topic provided and context as key "question"
2. Provide 4 multiple choice answers to the question as a list of key-value pairs "choices"
3. Provide the correct answer for the question from the list of answers as key "answer"
4. Provide an explanation as to why the answer is correct as key "explanation"

You must respond as a JSON object with the following structure:
{
    "question": "<question>",
    "choices": [
        {"key": "A", "value": "<choice>"},
        {"key": "B", "value": "<choice>"},
        {"key": "C", "value": "<choice>"},
        {"key": "D", "value": "<choice>"}
    ],
    "answer": "<answer key from choices list>",
    "explanation": "<explanation as to why the answer is correct>"
}

Context: {context}
"#;

/// Empty or blank topics fall back to [`DEFAULT_TOPIC`].
pub fn normalize_topic(topic: &str) -> String {
    let topic = topic.trim();
    if topic.is_empty() {
        DEFAULT_TOPIC.to_string()
    } else {
        topic.to_string()
    }
}

/// Fill the template. Each placeholder is substituted once, so braces in
/// the topic or the context are copied through literally.
pub fn render_prompt(topic: &str, context: &str) -> String {
    match TEMPLATE.split_once("{context}") {
        Some((head, tail)) => {
            let mut prompt = head.replace("{topic}", topic);
            prompt.push_str(context);
            prompt.push_str(tail);
            prompt
        }
        None => TEMPLATE.replace("{topic}", topic),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_topic() {
        assert_eq!(normalize_topic(""), "General Knowledge");
        assert_eq!(normalize_topic("   "), "General Knowledge");
        assert_eq!(normalize_topic(" Rust "), "Rust");
    }

    #[test]
    fn test_render_prompt_embeds_topic_and_context() {
        let prompt = render_prompt("Cell biology", "Mitochondria make ATP.");
        assert!(prompt.starts_with("You are a subject matter expert on the topic: Cell biology"));
        assert!(prompt.trim_end().ends_with("Context: Mitochondria make ATP."));
        assert!(prompt.contains(r#"{"key": "D", "value": "<choice>"}"#));
    }

    #[test]
    fn test_topic_placeholders_left_alone() {
        let prompt = render_prompt("{context}", "SECRET CONTEXT");
        let first_line = prompt.lines().next().unwrap();
        assert_eq!(first_line, "You are a subject matter expert on the topic: {context}");
        assert_eq!(prompt.matches("SECRET CONTEXT").count(), 1);
        assert!(prompt.trim_end().ends_with("Context: SECRET CONTEXT"));
    }

    #[test]
    fn test_context_placeholders_left_alone() {
        let prompt = render_prompt("T", "literal {topic} in the document");
        assert!(prompt.contains("literal {topic} in the document"));
    }
}
