// Shared prompt fragments. Feature-specific prompts live next to the feature
// (see ai/prompts.rs).

/// Output must be usable as-is inside a CV.
pub const PLAIN_OUTPUT_SYSTEM: &str = "You are an expert CV writer. \
    Respond with the requested content only. \
    Do NOT add greetings, explanations or markdown headings. \
    Do NOT wrap the answer in code fences.";

/// Keeps generated bullets ATS-friendly.
pub const ATS_STYLE_INSTRUCTION: &str = "\
    Write for applicant tracking systems: start each bullet with a strong action verb, \
    use standard industry keywords, avoid tables, emojis and special characters, \
    and quantify outcomes with numbers or percentages wherever plausible.";
