//! Turns a stream of lexical matches into an ordered list approximating
//! "declaration/definition first, then references" (spec §4.D Ranker).

use crate::search::executor::GrepMatch;
use crate::search::heuristics::score_match;

/// A `GrepMatch` with its absolute path and computed score.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RankedMatch {
    pub path: String,
    pub line: u32,
    pub column: i64,
    pub text: String,
    pub score: i64,
}

/// Rank `matches` (already resolved to absolute paths) for `needle`.
///
/// Drops any match at `(cursor_file, cursor_line)` (the user is already
/// there). Adds a `+10` bonus to matches in `preferred_path`, used by
/// hover/references to bias toward the current file — `definition`
/// intentionally passes `None` here (spec §9).
#[must_use]
pub fn rank(
    matches: Vec<GrepMatch>,
    needle: &str,
    cursor_file: Option<&str>,
    cursor_line: Option<u32>,
    preferred_path: Option<&str>,
) -> Vec<RankedMatch> {
    let mut ranked: Vec<RankedMatch> = matches
        .into_iter()
        .filter(|m| {
            !(cursor_file.is_some_and(|f| f == m.path) && cursor_line == Some(m.line))
        })
        .map(|m| {
            let mut score = score_match(&m.text, m.column, needle);
            if preferred_path.is_some_and(|p| p == m.path) {
                score += 10;
            }
            RankedMatch {
                path: m.path,
                line: m.line,
                column: m.column,
                text: m.text,
                score,
            }
        })
        .collect();

    ranked.sort_by(|a, b| {
        b.score
            .cmp(&a.score)
            .then_with(|| a.path.cmp(&b.path))
            .then_with(|| a.line.cmp(&b.line))
            .then_with(|| a.column.cmp(&b.column))
    });
    ranked
}
