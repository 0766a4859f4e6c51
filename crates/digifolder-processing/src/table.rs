//! Plain-text table heuristics and CSV reconstruction

use regex::Regex;
use std::sync::LazyLock;

static COLUMN_GAP: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"\s{2,}|\t").unwrap());
static NUMBER_RUN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"(\d+\s+){2,}").unwrap());
static DELIMITED: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"[|,;]\s*\w+").unwrap());

/// Column-like spacing plus either aligned numbers or delimiter characters.
pub fn looks_like_table(text: &str) -> bool {
    COLUMN_GAP.is_match(text) && (NUMBER_RUN.is_match(text) || DELIMITED.is_match(text))
}

/// One CSV row per line, columns split on runs of two or more spaces or tabs.
pub fn reconstruct_csv(text: &str) -> String {
    text.split('\n')
        .map(|line| COLUMN_GAP.split(line).collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n")
}

/// Line by line, every whitespace-separated token becomes a cell.
pub fn naive_csv(text: &str) -> String {
    text.split('\n')
        .map(|line| line.split_whitespace().collect::<Vec<_>>().join(","))
        .collect::<Vec<_>>()
        .join("\n")
}
