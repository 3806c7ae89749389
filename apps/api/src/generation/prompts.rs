// Prompt constants for the flashcard generation pipeline.

/// System prompt for flashcard generation. The response shape is enforced
/// separately via structured output; the prompt carries the content rules.
pub const GENERATION_SYSTEM: &str = "You are an expert author of educational flashcards. \
Analyze the provided source text and produce a set of high-quality flashcards.\n\
\n\
Rules:\n\
- Each flashcard must focus on exactly one key concept or fact\n\
- The question (front) must be clear and specific\n\
- The answer (back) must be concise but complete\n\
- Avoid true/false questions - prefer questions that require understanding\n\
- Write the flashcards in the language of the source text\n\
- Generate between 5 and 15 flashcards, depending on the content and length of the source text\n\
\n\
Return the response as JSON matching the schema.";

/// User prompt template. Replace `{source_text}` before sending. The
/// delimiters keep instructions visually separate from the pasted text.
pub const GENERATION_PROMPT_TEMPLATE: &str = "Analyze the following text and generate an appropriate set of educational flashcards:\n\
\n\
---\n\
{source_text}\n\
---\n\
\n\
Generate the flashcards as JSON.";

/// Fills the user prompt with the raw source text.
pub fn build_user_prompt(source_text: &str) -> String {
    GENERATION_PROMPT_TEMPLATE.replace("{source_text}", source_text)
}
