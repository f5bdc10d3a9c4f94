// Shared prompt fragments.
// Each module that calls the LLM keeps its own prompts.rs alongside it;
// this file holds only the cross-cutting pieces.

/// Output discipline appended to every instruction that expects publishable text.
pub const BODY_ONLY_INSTRUCTION: &str = "Do not add meta-commentary, labels, headings, \
    quotation marks or a signature. Output only the text itself.";

/// Reminder that memory is background, not a script.
pub const MEMORY_USE_INSTRUCTION: &str = "Reference your memory only where it is genuinely \
    relevant. Never recite it.";
