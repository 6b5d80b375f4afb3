// Shared prompt fragments used by more than one generation path.
// Each service that needs LLM calls defines its own prompts.rs alongside it.

/// Keeps the service from wrapping its answer in commentary.
pub const OUTPUT_ONLY_INSTRUCTION: &str =
    "Output only the requested text. Do not add explanations, preambles or closing remarks.";

/// Compliance guardrail for cosmetics and wellness copy.
pub const CLAIMS_INSTRUCTION: &str = "\
Only use claims that appear in the supplied source material. \
Never state product effects as guaranteed outcomes.";
