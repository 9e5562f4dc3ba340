//! Calculation header parsing.
//!
//! Headers are free text written by the input generator. The registry needs two
//! things from them: a normalized prefix that identifies the calculation setup, and
//! the optional `Fragments ... end` block that declares the atom partition used by the
//! energy decomposition. Both are extracted here so that header format changes stay
//! local to this module.

use crate::core::models::fragmentation::Fragmentation;
use serde::Deserialize;
use std::collections::HashSet;
use thiserror::Error;

pub const DEFAULT_PREFIX_LENGTH: usize = 55;

const FRAGMENTS_OPENER: &str = "fragments";
const BLOCK_TERMINATOR: &str = "end";

#[derive(Debug, Error, PartialEq, Eq)]
pub enum HeaderError {
    #[error("Malformed fragment declaration on line {line}: invalid index '{token}'")]
    InvalidIndex { line: usize, token: String },
    #[error("Malformed fragment declaration on line {line}: unterminated brace group")]
    UnterminatedGroup { line: usize },
    #[error("Malformed fragment declaration on line {line}: atom {index} is already assigned")]
    RepeatedIndex { line: usize, index: usize },
    #[error("Fragment index {index} exceeds the geometry's {atoms} atoms")]
    IndexOutOfRange { index: usize, atoms: usize },
}

/// Rules for reducing a header to its comparable prefix.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "kebab-case", deny_unknown_fields, default)]
pub struct HeaderRules {
    /// Lines starting with any of these (case-insensitive) are skipped entirely,
    /// e.g. memory settings that do not change the result.
    pub ignored_prefixes: Vec<String>,
    /// The first line starting with any of these (case-insensitive) ends the
    /// comparable part, e.g. parallelisation settings and the geometry section.
    pub terminator_prefixes: Vec<String>,
    /// Number of normalized characters that take part in the comparison.
    pub prefix_length: usize,
}

impl Default for HeaderRules {
    fn default() -> Self {
        Self {
            ignored_prefixes: vec!["%maxcore".to_string()],
            terminator_prefixes: vec!["%pal".to_string(), "*".to_string()],
            prefix_length: DEFAULT_PREFIX_LENGTH,
        }
    }
}

fn starts_with_any(line: &str, prefixes: &[String]) -> bool {
    let lowered = line.to_lowercase();
    prefixes
        .iter()
        .any(|p| !p.is_empty() && lowered.starts_with(&p.to_lowercase()))
}

fn is_fragments_opener(trimmed: &str) -> bool {
    trimmed.eq_ignore_ascii_case(FRAGMENTS_OPENER)
}

fn is_block_terminator(trimmed: &str) -> bool {
    trimmed.eq_ignore_ascii_case(BLOCK_TERMINATOR)
}

/// Reduces a header to the upper-cased alphanumeric characters of its comparable
/// part, truncated to `rules.prefix_length` characters.
///
/// The fragments block is excluded: fragment indices are compared separately, under
/// the atom correspondence found by the matcher.
pub fn normalize(text: &str, rules: &HeaderRules) -> String {
    let mut normalized = String::new();
    let mut in_fragments = false;

    for line in text.lines() {
        let trimmed = line.trim();
        if in_fragments {
            if is_block_terminator(trimmed) {
                in_fragments = false;
            }
            continue;
        }
        if is_fragments_opener(trimmed) {
            in_fragments = true;
            continue;
        }
        if starts_with_any(trimmed, &rules.terminator_prefixes) {
            break;
        }
        if starts_with_any(trimmed, &rules.ignored_prefixes) {
            continue;
        }
        normalized.extend(
            trimmed
                .chars()
                .filter(|c| c.is_alphanumeric())
                .flat_map(char::to_uppercase),
        );
    }

    normalized.chars().take(rules.prefix_length).collect()
}

fn parse_index(token: &str, line: usize) -> Result<usize, HeaderError> {
    match token.parse::<usize>() {
        Ok(0) | Err(_) => Err(HeaderError::InvalidIndex {
            line,
            token: token.to_string(),
        }),
        Ok(index) => Ok(index),
    }
}

fn parse_group(content: &str, line: usize) -> Result<Vec<usize>, HeaderError> {
    let mut group = Vec::new();
    for token in content
        .split(|c: char| c.is_whitespace() || c == ',')
        .filter(|t| !t.is_empty())
    {
        match token.split_once(':') {
            Some((start, end)) => {
                let start = parse_index(start, line)?;
                let end = parse_index(end, line)?;
                if end < start {
                    return Err(HeaderError::InvalidIndex {
                        line,
                        token: token.to_string(),
                    });
                }
                group.extend(start..=end);
            }
            None => group.push(parse_index(token, line)?),
        }
    }
    Ok(group)
}

/// Extracts the declared fragmentation from a header.
///
/// Inside a `Fragments` ... `end` block every line of the form `<n> {i j k} end`
/// declares one group of 1-based atom indices; `a:b` denotes an inclusive range.
/// Lines without braces inside the block are ignored. A header without such a block
/// yields an empty fragmentation. Groups must be disjoint.
pub fn parse_fragmentation(text: &str) -> Result<Fragmentation, HeaderError> {
    let mut groups = Vec::new();
    let mut seen = HashSet::new();
    let mut in_fragments = false;

    for (idx, line) in text.lines().enumerate() {
        let line_num = idx + 1;
        let trimmed = line.trim();
        if !in_fragments {
            in_fragments = is_fragments_opener(trimmed);
            continue;
        }
        if is_block_terminator(trimmed) {
            break;
        }
        let Some(open) = trimmed.find('{') else {
            continue;
        };
        let close = trimmed[open..]
            .find('}')
            .map(|offset| open + offset)
            .ok_or(HeaderError::UnterminatedGroup { line: line_num })?;
        let group = parse_group(&trimmed[open + 1..close], line_num)?;
        if let Some(&index) = group.iter().find(|&&index| !seen.insert(index)) {
            return Err(HeaderError::RepeatedIndex {
                line: line_num,
                index,
            });
        }
        groups.push(group);
    }

    Ok(Fragmentation::new(groups))
}
