pub mod rewrite_rules;
pub mod text_rewriter;

pub use text_rewriter::{
    NoRewriteProvider, RewriteError, RewriteProvider, RewriteRequest, TextContext, TextRewriter,
};
