//! Line model for a single source file
//!
//! A file is split on `\n` only, so joining the lines back with `\n`
//! reproduces the input byte for byte (including a trailing newline and any
//! `\r` carried at the end of CRLF lines).

/// One line of the working buffer
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Line {
    pub text: String,
    /// 0-indexed line number in the untransformed file, None for injected lines
    pub origin: Option<usize>,
}

impl Line {
    pub fn injected(text: String) -> Self {
        Line { text, origin: None }
    }
}

pub fn split_lines(text: &str) -> Vec<Line> {
    text.split('\n')
        .enumerate()
        .map(|(idx, line)| Line {
            text: line.to_string(),
            origin: Some(idx),
        })
        .collect()
}

pub fn join_lines(lines: &[Line]) -> String {
    lines
        .iter()
        .map(|l| l.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

/// Byte offset at which each line starts
pub fn line_starts(text: &str) -> Vec<usize> {
    std::iter::once(0)
        .chain(text.match_indices('\n').map(|(idx, _)| idx + 1))
        .collect()
}

/// Whether the file uses CRLF line endings
pub fn uses_crlf(text: &str) -> bool {
    text.contains("\r\n")
}

/// Leading whitespace of a line
pub fn indentation(line: &str) -> &str {
    let trimmed = line.trim_start_matches([' ', '\t']);
    &line[..line.len() - trimmed.len()]
}
