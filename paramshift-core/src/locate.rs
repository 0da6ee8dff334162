//! Insertion-point location
//!
//! Both strategies start from the anchor statement (the session lookup) and
//! look for the line that ends the authorization check that follows it:
//!
//! - `Locator::Block` reads the statement right after the anchor. It must be
//!   an `if` whose condition mentions the session identifier. Braced and
//!   braceless consequents are both accepted, `else` / `else if` clauses are
//!   followed to the end, and the length of the check does not matter.
//! - `Locator::Window` scans a fixed number of lines after the anchor for a
//!   line that starts or ends with `}` and does not mention the session
//!   identifier.
//!
//! Global invariants enforced:
//! - At most one insertion point per function
//! - An insertion point never leaves the function body
//! - No qualified reference sits between the body start and the insertion point

use crate::blocks::BlockIndex;
use crate::config::Convention;
use crate::references::contains_reference;
use crate::region::{line_of, FunctionRegion, SkipReason};
use crate::source::line_starts;

/// Insertion-point strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Locator {
    Block,
    Window { size: usize },
}

/// Where a resolution statement goes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InsertionPoint {
    /// 0-indexed line of the anchor statement
    pub anchor_line: usize,
    /// 0-indexed line the statement is inserted after
    pub line: usize,
}

/// Read-only view of one untransformed file
#[derive(Debug)]
pub struct ScanContext<'a> {
    pub src: &'a str,
    pub lines: Vec<&'a str>,
    pub line_starts: Vec<usize>,
    pub index: BlockIndex,
}

impl<'a> ScanContext<'a> {
    pub fn new(src: &'a str) -> Self {
        ScanContext {
            src,
            lines: src.split('\n').collect(),
            line_starts: line_starts(src),
            index: BlockIndex::build(src),
        }
    }
}

impl Locator {
    pub fn as_str(&self) -> &'static str {
        match self {
            Locator::Block => "block",
            Locator::Window { .. } => "window",
        }
    }

    /// Find the insertion point for one function
    pub fn locate(
        &self,
        ctx: &ScanContext<'_>,
        region: &FunctionRegion,
        convention: &Convention,
    ) -> Result<InsertionPoint, SkipReason> {
        let body = region
            .body
            .and_then(|idx| ctx.index.get(idx))
            .ok_or(SkipReason::UnbalancedBody)?;

        let anchor_line = (body.open_line..=region.end_line)
            .find(|&line| ctx.lines[line].contains(convention.anchor.as_str()))
            .ok_or(SkipReason::AnchorNotFound)?;

        let line = match self {
            Locator::Block => locate_block_end(ctx, region, convention, anchor_line)?,
            Locator::Window { size } => {
                locate_in_window(ctx, region, convention, anchor_line, *size)?
            }
        };

        // Anything above the binding would read it before it is declared
        let exposed = (body.open_line..=line)
            .any(|l| contains_reference(ctx.lines[l], &convention.param, &convention.field));
        if exposed {
            return Err(SkipReason::ReferenceBeforeInsertion);
        }

        Ok(InsertionPoint { anchor_line, line })
    }
}

fn locate_block_end(
    ctx: &ScanContext<'_>,
    region: &FunctionRegion,
    convention: &Convention,
    anchor_line: usize,
) -> Result<usize, SkipReason> {
    let anchor_offset = ctx.line_starts[anchor_line]
        + ctx.lines[anchor_line]
            .find(convention.anchor.as_str())
            .unwrap_or(0);

    let end = check_end(ctx, anchor_offset, &convention.session_ident)
        .ok_or(SkipReason::NoAuthorizationBlock)?;
    let close_line = line_of(&ctx.line_starts, end);
    if close_line >= region.end_line {
        return Err(SkipReason::NoAuthorizationBlock);
    }

    Ok(close_line)
}

/// Byte offset of the last byte of the `if` statement following the anchor
fn check_end(ctx: &ScanContext<'_>, anchor_offset: usize, session: &str) -> Option<usize> {
    let src = ctx.src;
    let bytes = src.as_bytes();

    let anchor_end = statement_end(bytes, anchor_offset)?;
    let keyword = skip_space(bytes, anchor_end + 1);
    if !starts_with_keyword(bytes, keyword, "if") {
        return None;
    }
    let (open, close) = condition(bytes, keyword + 2)?;
    if !src[open..close].contains(session) {
        return None;
    }

    let mut clause = skip_space(bytes, close + 1);
    loop {
        let end = clause_end(ctx, clause)?;
        let next = skip_space(bytes, end + 1);
        if !starts_with_keyword(bytes, next, "else") {
            return Some(end);
        }
        let after_else = skip_space(bytes, next + 4);
        clause = if starts_with_keyword(bytes, after_else, "if") {
            let (_, close) = condition(bytes, after_else + 2)?;
            skip_space(bytes, close + 1)
        } else {
            after_else
        };
    }
}

/// End of a braced block or a single braceless statement starting at `pos`
fn clause_end(ctx: &ScanContext<'_>, pos: usize) -> Option<usize> {
    if ctx.src.as_bytes().get(pos) == Some(&b'{') {
        let idx = ctx.index.block_at(pos)?;
        ctx.index.get(idx)?.close
    } else {
        statement_end(ctx.src.as_bytes(), pos)
    }
}

/// Span of the parenthesized condition following a keyword ending at `from`
fn condition(bytes: &[u8], from: usize) -> Option<(usize, usize)> {
    let open = skip_space(bytes, from);
    if bytes.get(open) != Some(&b'(') {
        return None;
    }
    Some((open, matching_paren(bytes, open)?))
}

fn starts_with_keyword(bytes: &[u8], pos: usize, keyword: &str) -> bool {
    let end = pos + keyword.len();
    bytes.get(pos..end) == Some(keyword.as_bytes())
        && !bytes
            .get(end)
            .is_some_and(|&b| b.is_ascii_alphanumeric() || b == b'_' || b == b'$')
}

/// Index just past a string, template or comment starting at `i`
fn skip_opaque(bytes: &[u8], i: usize) -> Option<usize> {
    match (bytes[i], bytes.get(i + 1)) {
        (b'"' | b'\'' | b'`', _) => Some(skip_literal(bytes, i)),
        (b'/', Some(b'/')) => Some(find_from(bytes, i, b"\n").unwrap_or(bytes.len())),
        (b'/', Some(b'*')) => Some(find_from(bytes, i + 2, b"*/").map_or(bytes.len(), |e| e + 2)),
        _ => None,
    }
}

fn skip_literal(bytes: &[u8], start: usize) -> usize {
    let quote = bytes[start];
    let mut i = start + 1;
    while i < bytes.len() {
        match bytes[i] {
            b'\\' => i += 1,
            b if b == quote => return i + 1,
            b'\n' if quote != b'`' => return i,
            _ => {}
        }
        i += 1;
    }
    bytes.len()
}

fn find_from(bytes: &[u8], from: usize, needle: &[u8]) -> Option<usize> {
    bytes
        .get(from..)?
        .windows(needle.len())
        .position(|w| w == needle)
        .map(|p| p + from)
}

/// Skip whitespace and comments
fn skip_space(bytes: &[u8], mut i: usize) -> usize {
    while i < bytes.len() {
        if bytes[i].is_ascii_whitespace() {
            i += 1;
        } else if bytes[i] == b'/' && matches!(bytes.get(i + 1), Some(b'/' | b'*')) {
            i = skip_opaque(bytes, i).unwrap_or(bytes.len());
        } else {
            break;
        }
    }
    i
}

fn matching_paren(bytes: &[u8], open: usize) -> Option<usize> {
    let mut depth = 0usize;
    let mut i = open;
    while i < bytes.len() {
        if let Some(next) = skip_opaque(bytes, i) {
            i = next;
            continue;
        }
        match bytes[i] {
            b'(' => depth += 1,
            b')' => {
                depth = depth.saturating_sub(1);
                if depth == 0 {
                    return Some(i);
                }
            }
            _ => {}
        }
        i += 1;
    }
    None
}

/// Offset of the `;` or line break ending the statement that starts at `from`
///
/// A line break ends it only where automatic semicolon insertion would: at
/// nesting level zero, when neither side of the break continues an expression.
fn statement_end(bytes: &[u8], from: usize) -> Option<usize> {
    const CONTINUES_BEFORE: &[u8] = b"=+-*/%&|^<>!?:,.";
    const CONTINUES_AFTER: &[u8] = b".?:+-*/%&|=,<>";

    let mut depth = 0usize;
    let mut last_code: Option<u8> = None;
    let mut i = from;
    while i < bytes.len() {
        if let Some(next) = skip_opaque(bytes, i) {
            if bytes[i] != b'/' {
                last_code = Some(bytes[i]);
            }
            i = next;
            continue;
        }
        let b = bytes[i];
        match b {
            b'(' | b'[' | b'{' => depth += 1,
            b')' | b']' | b'}' => {
                // Closing the enclosing block means the statement never ended
                depth = depth.checked_sub(1)?;
            }
            b';' if depth == 0 => return Some(i),
            b'\n' if depth == 0 => {
                let next = skip_space(bytes, i);
                let open_before = last_code.map_or(true, |c| CONTINUES_BEFORE.contains(&c));
                let open_after = bytes.get(next).map_or(true, |c| CONTINUES_AFTER.contains(c));
                if !open_before && !open_after {
                    return Some(i);
                }
            }
            _ => {}
        }
        if !b.is_ascii_whitespace() {
            last_code = Some(b);
        }
        i += 1;
    }
    None
}

fn locate_in_window(
    ctx: &ScanContext<'_>,
    region: &FunctionRegion,
    convention: &Convention,
    anchor_line: usize,
    size: usize,
) -> Result<usize, SkipReason> {
    let session = convention.session_ident.as_str();
    // The function's own closing brace is never a candidate
    let last = (anchor_line + size).min(region.end_line.saturating_sub(1));

    ((anchor_line + 1)..=last)
        .find(|&line| {
            let text = ctx.lines[line].trim();
            (text.starts_with('}') || text.ends_with('}')) && !text.contains(session)
        })
        .ok_or(SkipReason::InsertionWindowExhausted)
}
