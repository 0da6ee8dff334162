//! Resolution statement injection

use crate::config::Convention;
use crate::source::{indentation, Line};

/// Number of lines added by one injection
pub const INJECTED_LINES: usize = 3;

/// The blank separator, marker comment and resolution statement, indented
/// like `anchor_text`
pub fn injected_lines(convention: &Convention, anchor_text: &str, crlf: bool) -> [String; INJECTED_LINES] {
    let indent = indentation(anchor_text);
    let eol = if crlf { "\r" } else { "" };
    [
        eol.to_string(),
        format!("{}{}{}", indent, convention.comment, eol),
        format!("{}{}{}", indent, convention.resolution_statement(), eol),
    ]
}

/// Splice `injected` into `lines` immediately after position `after`
///
/// Lines before and after the splice point are moved, never edited.
pub fn inject_after(lines: &mut Vec<Line>, after: usize, injected: [String; INJECTED_LINES]) {
    let at = (after + 1).min(lines.len());
    lines.splice(at..at, injected.into_iter().map(Line::injected));
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::source::{join_lines, split_lines};

    #[test]
    fn test_injected_lines_follow_anchor_indent() {
        let lines = injected_lines(
            &Convention::default(),
            "    const session = await getServerSession(authOptions);",
            false,
        );
        assert_eq!(
            lines,
            [
                String::new(),
                "    // Await params (Next.js 15 requirement)".to_string(),
                "    const { id } = await params;".to_string(),
            ]
        );
    }

    #[test]
    fn test_injected_lines_keep_crlf() {
        let lines = injected_lines(&Convention::default(), "\tx", true);
        assert_eq!(lines[0], "\r");
        assert_eq!(lines[2], "\tconst { id } = await params;\r");
    }

    #[test]
    fn test_inject_adds_exactly_three_lines() {
        let mut lines = split_lines("a\nb\nc");
        inject_after(
            &mut lines,
            1,
            ["".to_string(), "// x".to_string(), "y;".to_string()],
        );
        assert_eq!(lines.len(), 6);
        assert_eq!(join_lines(&lines), "a\nb\n\n// x\ny;\nc");
        assert_eq!(lines[5].origin, Some(2));
        assert_eq!(lines[3].origin, None);
    }

    #[test]
    fn test_inject_after_last_line() {
        let mut lines = split_lines("a");
        inject_after(&mut lines, 0, ["".to_string(), "b".to_string(), "c".to_string()]);
        assert_eq!(join_lines(&lines), "a\n\nb\nc");
    }
}
