//! Prompt assembly.
//!
//! A prompt is the task's fixed template followed by the request fields. The only substitutions
//! made are the literal request values; the schema documentation in the template is never
//! rewritten. Template placeholders are filled before the user's text is attached, so text that
//! happens to contain `{word}` or `{language}` reaches the model untouched.

use crate::task::TaskKind;

const LANGUAGE_PLACEHOLDER: &str = "{language}";
const WORD_PLACEHOLDER: &str = "{word}";

/// Build the instruction string for one analysis call.
///
/// # Arguments
/// * `task` - Selects the template and which request fields are included.
/// * `text` - The passage to analyse, or the single word for morphology. Included verbatim.
/// * `language` - Natural language the model must answer in.
/// * `doc_date` - Document date used to anchor relative dates. Only the event/timeline prompt
///   carries it, and it is written even when absent (as an empty value).
pub fn build_prompt(task: TaskKind, text: &str, language: &str, doc_date: Option<&str>) -> String {
    let descriptor = task.descriptor();
    let mut prompt = String::with_capacity(descriptor.template.len() + text.len() + 256);

    if descriptor.inline_input {
        prompt.push_str(&fill_placeholders(
            descriptor.template.trim_end(),
            &[(LANGUAGE_PLACEHOLDER, language), (WORD_PLACEHOLDER, text)],
        ));
        prompt.push('\n');
    } else {
        prompt.push_str(descriptor.template.trim_end());
        prompt.push('\n');

        if descriptor.includes_document_date {
            prompt.push_str("\nDocument Date: ");
            prompt.push_str(doc_date.unwrap_or(""));
            prompt.push('\n');
        }

        prompt.push_str("\nHere is the text to analyze:\n");
        prompt.push_str(text);
        prompt.push('\n');
    }

    prompt.push_str(&language_directive(language));
    prompt
}

/// Substitute every placeholder in one left-to-right pass; inserted values are never rescanned.
fn fill_placeholders(template: &str, values: &[(&str, &str)]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let tail = &rest[start..];
        match values.iter().find(|(placeholder, _)| tail.starts_with(placeholder)) {
            Some((placeholder, value)) => {
                out.push_str(value);
                rest = &tail[placeholder.len()..];
            }
            None => {
                out.push('{');
                rest = &tail[1..];
            }
        }
    }
    out.push_str(rest);
    out
}

/// The closing instruction pinning the answer's natural language.
pub fn language_directive(language: &str) -> String {
    format!(
        "\nIMPORTANT: MAKE SURE THE OUTPUT/ANALYSIS IS WRITTEN IN THIS LANGUAGE: {}\n",
        language
    )
}
