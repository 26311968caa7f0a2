// Shared prompt fragments used by more than one generation template.
// Per-task templates live in generation/prompts.rs.

/// Appended to every structured (JSON array) prompt.
pub const JSON_ARRAY_ONLY_INSTRUCTION: &str = "\
Return ONLY the JSON array. \
Do not include any explanations, markdown formatting, code fences, \
or any other text outside the JSON array.";

/// Rules shared by the experience and education bullet templates.
pub const BULLET_STYLE_RULES: &str = "\
Each bullet point should:
- Start with strong action verbs
- Be concise and impactful
- Use the \u{2022} character followed by a space, one bullet per line (use \\n between bullets)";

/// Placeholder used for identity fields the user left blank.
pub const NOT_SPECIFIED: &str = "Not specified";
pub const START_DATE_PLACEHOLDER: &str = "Start date";
pub const END_DATE_PLACEHOLDER: &str = "End date";
pub const NO_DESCRIPTION_PLACEHOLDER: &str = "None provided";
