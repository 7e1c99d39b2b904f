// Deterministic copy tweaks for visa-service ads.
//
// Each rule is a whole-word, case-insensitive swap. The rewriter applies the
// first rule that changes the text and stops there, so order matters: e.g.
// Dubai->UAE is listed before UAE->Dubai so the pair never cancels out.

use regex::Regex;

/// (pattern, replacement) in priority order. Patterns are regex fragments that
/// get wrapped in `(?i)\b...\b`.
pub const DEFAULT_SUBSTITUTIONS: &[(&str, &str)] = &[
    // Time-related synonyms
    (r"24 Hours?", "1 Day"),
    (r"24hr?", "Same Day"),
    (r"Fast", "Quick"),
    (r"Quick", "Rapid"),
    (r"Express", "Priority"),
    (r"Urgent", "Priority"),
    (r"Instant", "Immediate"),
    (r"Same-Day", "Today"),
    // Action words
    (r"Apply", "Submit"),
    (r"Get", "Obtain"),
    (r"Start", "Begin"),
    (r"Bring", "Invite"),
    // Service descriptions
    (r"Trusted", "Reliable"),
    (r"Secure", "Safe"),
    (r"Hassle-Free", "Simple"),
    (r"Easy", "Simple"),
    (r"Prompt", "Swift"),
    (r"Available", "Offered"),
    // Process terms
    (r"Processing", "Handling"),
    (r"Application", "Submission"),
    (r"Approvals", "Confirmations"),
    (r"Service", "Support"),
    // Location variations
    (r"Dubai", "UAE"),
    (r"UAE", "Dubai"),
];

/// Words prepended when no substitution applies.
pub const DEFAULT_DESCRIPTORS: &[&str] = &[
    "Online",
    "Digital",
    "Official",
    "Authorized",
    "Certified",
    "Professional",
    "Verified",
    "Licensed",
    "Expert",
];

/// A compiled whole-word substitution.
#[derive(Debug, Clone)]
pub struct SubstitutionRule {
    pattern: Regex,
    replacement: String,
}

impl SubstitutionRule {
    pub fn new(pattern: &str, replacement: &str) -> Result<Self, regex::Error> {
        let pattern = Regex::new(&format!(r"(?i)\b{}\b", pattern))?;
        Ok(Self {
            pattern,
            replacement: replacement.to_string(),
        })
    }

    /// Returns the rewritten text only if the rule actually changed something.
    pub fn apply(&self, text: &str) -> Option<String> {
        if !self.pattern.is_match(text) {
            return None;
        }

        let replaced = self
            .pattern
            .replace_all(text, regex::NoExpand(&self.replacement))
            .into_owned();
        (replaced != text).then_some(replaced)
    }
}

pub fn default_rules() -> Result<Vec<SubstitutionRule>, regex::Error> {
    DEFAULT_SUBSTITUTIONS
        .iter()
        .map(|(pattern, replacement)| SubstitutionRule::new(pattern, replacement))
        .collect()
}
