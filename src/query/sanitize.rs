use crate::query::models::QueryStatement;
use regex::Regex;
use std::sync::LazyLock;
use tracing::debug;

// Only a standalone "sql" tag belongs to the fence; a word glued to it is the query
static CODE_FENCE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)```(?:sql\b)?").expect("valid fence pattern"));
static BLOCK_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?s)/\*.*?\*/").expect("valid block comment pattern"));
static LINE_COMMENT: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"--[^\n]*").expect("valid line comment pattern"));

pub const TERMINATOR: char = ';';

/// One named rewrite applied to raw model output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SanitizeStep {
    /// Drops markdown fence markers, "```sql" (any case) and bare "```".
    StripCodeFences,
    /// Drops `/* ... */` blocks (across lines) and `--` comments up to end of line.
    StripComments,
    /// Keeps the text before the first `;` and re-appends exactly one `;`.
    /// A statement without a terminator is taken whole.
    FirstStatementOnly,
    /// Collapses every whitespace run, newlines included, to one space.
    CollapseWhitespace,
}

/// Order matters: comments may hide a `;`, so they go before truncation.
pub const PIPELINE: [SanitizeStep; 4] = [
    SanitizeStep::StripCodeFences,
    SanitizeStep::StripComments,
    SanitizeStep::FirstStatementOnly,
    SanitizeStep::CollapseWhitespace,
];

impl SanitizeStep {
    pub fn name(&self) -> &'static str {
        match self {
            SanitizeStep::StripCodeFences => "strip_code_fences",
            SanitizeStep::StripComments => "strip_comments",
            SanitizeStep::FirstStatementOnly => "first_statement_only",
            SanitizeStep::CollapseWhitespace => "collapse_whitespace",
        }
    }

    pub fn apply(&self, text: &str) -> String {
        match self {
            SanitizeStep::StripCodeFences => CODE_FENCE.replace_all(text, "").trim().to_string(),
            SanitizeStep::StripComments => {
                let without_blocks = BLOCK_COMMENT.replace_all(text, "");
                LINE_COMMENT.replace_all(&without_blocks, "").into_owned()
            }
            SanitizeStep::FirstStatementOnly => {
                let statement = text.split(TERMINATOR).next().unwrap_or_default();
                format!("{}{}", statement, TERMINATOR)
            }
            SanitizeStep::CollapseWhitespace => collapse_whitespace(text),
        }
    }
}

pub fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Runs every step of [`PIPELINE`] in order.
///
/// Returns `None` when nothing but the terminator survives, e.g. a reply made only of
/// comments or fences.
pub fn sanitize(raw: &str) -> Option<QueryStatement> {
    let sql = PIPELINE.iter().fold(raw.to_string(), |text, step| {
        let next = step.apply(&text);
        debug!("{}: {:?}", step.name(), next);
        next
    });

    if sql.trim_end_matches(TERMINATOR).trim().is_empty() {
        return None;
    }
    Some(QueryStatement::from_sanitized(sql))
}
