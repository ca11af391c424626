//! Instruction prompt for fragment translation.
//!
//! The renderer only understands a small Markdown dialect, so the prompt
//! spells that dialect out explicitly. Keeping the prompt here, and not
//! inline in the client, lets tests inspect it and lets callers override it
//! via [`crate::config::TranslationConfig::system_prompt`] without touching
//! the retry logic.

/// Default instruction template.
///
/// `{source}` and `{target}` are replaced with the configured language names.
pub const DEFAULT_TRANSLATION_PROMPT: &str = r#"Translate the following scientific or technical text from {source} to {target}, returning the result as well-structured Markdown.

INSTRUCTIONS:
- Structure the text using only these Markdown elements:
  * # for main titles
  * ## for secondary headings
  * ### for tertiary headings
  * **text** for bold
  * *text* for italic
  * Lists with dashes (-) or numbering (1., 2.)
  * Markdown pipe tables where the source has tabular data
  * > for quotations

- Keep original technical and scientific terminology where appropriate
- Preserve the hierarchical structure and organisation of the original
- Translate faithfully: do not add, omit or interpret information
- Use a formal, academic register in {target}
- Respect paragraphs and meaningful line breaks
- Keep equations, references and other special elements as they are

IMPORTANT: Return ONLY the translated text in Markdown, with no additional commentary and no code fences (such as ```markdown).

TEXT TO TRANSLATE:
"#;

/// Build the full request prompt for one fragment.
///
/// A custom template may use the same `{source}` / `{target}` placeholders;
/// the fragment text is always appended after it.
pub fn translation_prompt(
    template: Option<&str>,
    source_language: &str,
    target_language: &str,
    fragment: &str,
) -> String {
    let template = template.unwrap_or(DEFAULT_TRANSLATION_PROMPT);
    let mut prompt = template
        .replace("{source}", source_language)
        .replace("{target}", target_language);
    if !prompt.ends_with('\n') {
        prompt.push('\n');
    }
    prompt.push_str(fragment);
    prompt
}
