use crate::error::PipelineError;

pub const MIN_PROMPT_CHARS: usize = 10;
pub const MAX_PROMPT_CHARS: usize = 500;

/// Lower-case phrases that mark prompt-extraction or jailbreak attempts.
pub const BLOCKED_PHRASES: &[&str] = &[
    "ignore your instructions",
    "ignore previous instructions",
    "ignore all previous instructions",
    "disregard your instructions",
    "reveal your prompt",
    "system prompt",
];

/// Length bounds first, then the denylist. First failure wins.
pub fn validate(prompt: &str) -> Result<(), PipelineError> {
    let len = prompt.chars().count();
    if len < MIN_PROMPT_CHARS {
        return Err(PipelineError::PromptTooShort { len, min: MIN_PROMPT_CHARS, max: MAX_PROMPT_CHARS });
    }
    if len > MAX_PROMPT_CHARS {
        return Err(PipelineError::PromptTooLong { len, min: MIN_PROMPT_CHARS, max: MAX_PROMPT_CHARS });
    }

    let lowered = prompt.to_lowercase();
    if let Some(phrase) = BLOCKED_PHRASES.iter().find(|p| lowered.contains(*p)) {
        return Err(PipelineError::BlockedPhrase(phrase.to_string()));
    }
    Ok(())
}
