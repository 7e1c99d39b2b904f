// Produces a "new creative" variant of existing ad copy that still fits the
// platform's character limits.
//
// Flow per text:
//   1. first matching substitution rule wins
//   2. too long?  -> external rewrite (fallback: hard truncation)
//   3. nothing substituted? -> prepend a random descriptor, shorten if needed
//
// Lengths are counted in chars, which is what the platform counts.

use async_trait::async_trait;
use rand::seq::SliceRandom;
use thiserror::Error;

use super::rewrite_rules::{default_rules, SubstitutionRule, DEFAULT_DESCRIPTORS};

/// Google's limits for the two text slots we rewrite.
pub const HEADLINE_MAX_CHARS: usize = 30;
pub const DESCRIPTION_MAX_CHARS: usize = 90;

#[derive(Debug, Error)]
pub enum RewriteError {
    #[error("Rewrite provider error: {0}")]
    Provider(String),

    #[error("No rewrite provider configured")]
    Unavailable,

    #[error("Invalid substitution rule: {0}")]
    Rule(String),
}

/// Which slot a piece of text belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TextContext {
    Headline,
    Description,
}

impl TextContext {
    pub fn max_chars(&self) -> usize {
        match self {
            TextContext::Headline => HEADLINE_MAX_CHARS,
            TextContext::Description => DESCRIPTION_MAX_CHARS,
        }
    }

    /// Human wording used in the rewrite prompt.
    pub fn label(&self) -> &'static str {
        match self {
            TextContext::Headline => "ad headline",
            TextContext::Description => "ad description",
        }
    }
}

/// What we ask the external service to do.
#[derive(Debug, Clone)]
pub struct RewriteRequest {
    pub text: String,
    pub max_chars: usize,
    pub context: TextContext,
}

impl RewriteRequest {
    pub fn prompt(&self) -> String {
        format!(
            "Rewrite the following {} to be under {} characters, keep it natural, relevant, and readable:\n\"{}\"",
            self.context.label(),
            self.max_chars,
            self.text
        )
    }
}

/// External paraphrasing service. Treated as unreliable and optional.
#[async_trait]
pub trait RewriteProvider: Send + Sync {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError>;
}

#[async_trait]
impl RewriteProvider for Box<dyn RewriteProvider> {
    async fn rewrite(&self, request: &RewriteRequest) -> Result<String, RewriteError> {
        (**self).rewrite(request).await
    }
}

/// Used when no API key is configured; every shortening falls back to truncation.
pub struct NoRewriteProvider;

#[async_trait]
impl RewriteProvider for NoRewriteProvider {
    async fn rewrite(&self, _request: &RewriteRequest) -> Result<String, RewriteError> {
        Err(RewriteError::Unavailable)
    }
}

pub struct TextRewriter<R: RewriteProvider> {
    provider: R,
    rules: Vec<SubstitutionRule>,
    descriptors: Vec<String>,
}

impl<R: RewriteProvider> TextRewriter<R> {
    /// Rewriter with the built-in visa-service substitution table.
    pub fn new(provider: R) -> Result<Self, RewriteError> {
        let rules = default_rules().map_err(|e| RewriteError::Rule(e.to_string()))?;
        Ok(Self::with_rules(
            provider,
            rules,
            DEFAULT_DESCRIPTORS.iter().map(|d| d.to_string()).collect(),
        ))
    }

    pub fn with_rules(provider: R, rules: Vec<SubstitutionRule>, descriptors: Vec<String>) -> Self {
        Self {
            provider,
            rules,
            descriptors,
        }
    }

    /// Rewrite `original` for the given slot, using the slot's default limit.
    pub async fn rewrite_for(&self, original: &str, context: TextContext) -> String {
        self.rewrite(original, context.max_chars(), context).await
    }

    /// Rewrite `original` so it differs from the input and fits in `max_chars`.
    ///
    /// Never fails: every external problem degrades to truncation. The result
    /// is empty only when the input was.
    pub async fn rewrite(&self, original: &str, max_chars: usize, context: TextContext) -> String {
        if original.is_empty() {
            return String::new();
        }

        let substituted = self.apply_first_substitution(original);
        if let Some(changed) = &substituted {
            tracing::debug!(from = original, to = changed.as_str(), "Substituted ad copy");
        }
        let applied = substituted.is_some();
        let text = substituted.unwrap_or_else(|| original.to_string());

        if char_len(&text) > max_chars {
            return self.shorten(&text, max_chars, context).await;
        }
        if applied {
            return text;
        }

        let decorated = match self.pick_descriptor() {
            Some(descriptor) => format!("{} {}", descriptor, text),
            None => text,
        };
        if char_len(&decorated) > max_chars {
            return self.shorten(&decorated, max_chars, context).await;
        }

        tracing::debug!(from = original, to = decorated.as_str(), "Added descriptor to ad copy");
        decorated
    }

    fn apply_first_substitution(&self, text: &str) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.apply(text))
    }

    fn pick_descriptor(&self) -> Option<&str> {
        self.descriptors
            .choose(&mut rand::thread_rng())
            .map(|d| d.as_str())
    }

    async fn shorten(&self, text: &str, max_chars: usize, context: TextContext) -> String {
        let request = RewriteRequest {
            text: text.to_string(),
            max_chars,
            context,
        };

        match self.provider.rewrite(&request).await {
            Ok(reply) => {
                let cleaned = strip_quotes(&reply);
                if cleaned.is_empty() {
                    tracing::warn!("Rewrite service returned empty text, truncating instead");
                    truncate_chars(text, max_chars)
                } else {
                    truncate_chars(cleaned, max_chars)
                }
            }
            Err(RewriteError::Unavailable) => truncate_chars(text, max_chars),
            Err(e) => {
                tracing::warn!("Rewrite failed, falling back to truncation: {}", e);
                truncate_chars(text, max_chars)
            }
        }
    }
}

pub fn char_len(text: &str) -> usize {
    text.chars().count()
}

/// Cut to at most `max_chars`, dropping trailing whitespace the cut exposed.
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if char_len(text) <= max_chars {
        return text.to_string();
    }

    let cut: String = text.chars().take(max_chars).collect();
    let trimmed = cut.trim_end();
    if trimmed.is_empty() {
        cut
    } else {
        trimmed.to_string()
    }
}

fn strip_quotes(reply: &str) -> &str {
    reply
        .trim()
        .trim_matches(|c| matches!(c, '"' | '\'' | '“' | '”'))
        .trim()
}
