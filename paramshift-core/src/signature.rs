//! Handler signature matching and rewriting
//!
//! Recognizes exactly one shape:
//!
//! ```typescript
//! export async function GET(request: NextRequest, { params }: { params: { id: string } })
//! ```
//!
//! and rewrites it to
//!
//! ```typescript
//! export async function GET(request: NextRequest, { params }: { params: Promise<{ id: string }> })
//! ```
//!
//! Global invariants enforced:
//! - A signature already wrapped never matches, so rewriting is idempotent
//! - Only the record type span changes; binding syntax and whitespace are kept

use crate::config::Convention;
use anyhow::{Context, Result};
use regex::Regex;

const SIGNATURE_TEMPLATE: &str = r"(?:export\s+)?(?:default\s+)?(?:async\s+)?function\s+(?P<name>[A-Za-z_$][\w$]*)\s*\(\s*[A-Za-z_$][\w$]*(?:\s*:\s*[\w$.]+)?\s*,\s*\{\s*@PARAM@\s*\}\s*:\s*\{\s*@PARAM@\s*:\s*(?P<record>\{\s*@FIELD@\s*:\s*[^{}<>;,]+?;?\s*\})\s*;?\s*\}\s*,?\s*\)";

/// One occurrence of the old signature shape
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SignatureMatch {
    /// Handler function name
    pub name: String,
    /// Byte offset where the declaration starts
    pub start: usize,
    /// Byte offset just past the closing parenthesis of the parameter list
    pub end: usize,
    /// Byte span of the plain record type (`{ id: string }`)
    pub record_start: usize,
    pub record_end: usize,
}

/// Compiled signature pattern for one convention
#[derive(Debug, Clone)]
pub struct SignatureMatcher {
    regex: Regex,
}

impl SignatureMatcher {
    pub fn new(convention: &Convention) -> Result<Self> {
        let pattern = SIGNATURE_TEMPLATE
            .replace("@PARAM@", &regex::escape(&convention.param))
            .replace("@FIELD@", &regex::escape(&convention.field));
        let regex = Regex::new(&pattern).context("failed to compile signature pattern")?;
        Ok(SignatureMatcher { regex })
    }

    /// Find every old-shape signature in `src`, in source order
    ///
    /// Finding none is a valid outcome (already migrated, or convention absent).
    pub fn find(&self, src: &str) -> Vec<SignatureMatch> {
        self.regex
            .captures_iter(src)
            .filter_map(|caps| {
                let whole = caps.get(0)?;
                let name = caps.name("name")?;
                let record = caps.name("record")?;
                Some(SignatureMatch {
                    name: name.as_str().to_string(),
                    start: whole.start(),
                    end: whole.end(),
                    record_start: record.start(),
                    record_end: record.end(),
                })
            })
            .collect()
    }
}

/// Wrap the record type of each match in `wrapper<...>`
///
/// Every other byte of `src` is copied through untouched.
pub fn rewrite_signatures<'a, I>(src: &str, matches: I, wrapper: &str) -> String
where
    I: IntoIterator<Item = &'a SignatureMatch>,
{
    let mut spans: Vec<(usize, usize)> = matches
        .into_iter()
        .map(|m| (m.record_start, m.record_end))
        .collect();
    spans.sort_unstable();

    let mut out = String::with_capacity(src.len() + spans.len() * (wrapper.len() + 2));
    let mut cursor = 0;
    for (start, end) in spans {
        out.push_str(&src[cursor..start]);
        out.push_str(wrapper);
        out.push('<');
        out.push_str(&src[start..end]);
        out.push('>');
        cursor = end;
    }
    out.push_str(&src[cursor..]);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn matcher() -> SignatureMatcher {
        SignatureMatcher::new(&Convention::default()).unwrap()
    }

    #[test]
    fn test_matches_single_line_signature() {
        let src = "function H(request: Req, { params }: { params: { id: string } }) {}";
        let matches = matcher().find(src);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "H");
        assert_eq!(&src[matches[0].record_start..matches[0].record_end], "{ id: string }");
        assert_eq!(&src[matches[0].start..matches[0].end], &src[..src.len() - 3]);
    }

    #[test]
    fn test_rewrites_single_line_signature() {
        let src = "function H(request: Req, { params }: { params: { id: string } }) {}";
        let matches = matcher().find(src);
        assert_eq!(
            rewrite_signatures(src, &matches, "Promise"),
            "function H(request: Req, { params }: { params: Promise<{ id: string }> }) {}"
        );
    }

    #[test]
    fn test_matches_multi_line_export() {
        let src = r#"export async function DELETE(
  request: NextRequest,
  { params }: { params: { id: string } }
) {
  return null;
}"#;
        let matches = matcher().find(src);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "DELETE");
        assert_eq!(&src[matches[0].end - 1..matches[0].end], ")");
    }

    #[test]
    fn test_already_wrapped_signature_does_not_match() {
        let src = "export async function GET(\n  request: NextRequest,\n  { params }: { params: Promise<{ id: string }> }\n) {}";
        assert!(matcher().find(src).is_empty());
    }

    #[test]
    fn test_other_shapes_do_not_match() {
        for src in [
            "function H(request: Req) {}",
            "function H({ params }: { params: { id: string } }) {}",
            "function H(request: Req, { params }: { params: { slug: string } }) {}",
            "function H(request: Req, { params }: { params: { id: string; slug: string } }) {}",
            "function H(request: Req, { query }: { query: { id: string } }) {}",
            "const H = (request: Req, { params }: { params: { id: string } }) => {}",
        ] {
            assert!(matcher().find(src).is_empty(), "should not match: {}", src);
        }
    }

    #[test]
    fn test_untyped_request_and_trailing_comma() {
        let src = "async function PATCH(req, { params }: { params: { id: string } },) {}";
        let matches = matcher().find(src);
        assert_eq!(matches.len(), 1);
        assert_eq!(matches[0].name, "PATCH");
    }

    #[test]
    fn test_multiple_signatures_rewritten_in_place() {
        let src = "function A(r: R, { params }: { params: { id: string } }) {}\n\
                   function B(r: R, { params }: { params: { id: string } }) {}";
        let matches = matcher().find(src);
        assert_eq!(matches.len(), 2);
        let out = rewrite_signatures(src, &matches, "Promise");
        assert_eq!(out.matches("Promise<{ id: string }>").count(), 2);
        assert_eq!(out.lines().count(), src.lines().count());
    }

    #[test]
    fn test_custom_convention() {
        let convention = Convention {
            param: "context".to_string(),
            field: "slug".to_string(),
            ..Convention::default()
        };
        let m = SignatureMatcher::new(&convention).unwrap();
        let src = "function H(request: Req, { context }: { context: { slug: string } }) {}";
        let matches = m.find(src);
        assert_eq!(matches.len(), 1);
        assert_eq!(
            rewrite_signatures(src, &matches, "Deferred"),
            "function H(request: Req, { context }: { context: Deferred<{ slug: string }> }) {}"
        );
    }

    #[test]
    fn test_rewrite_with_no_matches_is_identity() {
        let src = "const x = 1;\n";
        let none: Vec<SignatureMatch> = Vec::new();
        assert_eq!(rewrite_signatures(src, &none, "Promise"), src);
    }
}
