//! Pure whole-file transformation
//!
//! Global invariants enforced:
//! - No I/O; the output is a function of the input text and the convention
//! - Signatures are only rewritten for functions that will be injected,
//!   unless the convention asks to keep unresolved signatures
//! - References are rewritten after every injection has been placed
//! - A file without a matching signature is returned unchanged

use crate::config::{Convention, UnresolvedPolicy};
use crate::inject::{inject_after, injected_lines};
use crate::locate::ScanContext;
use crate::references::rewrite_references;
use crate::region::{build_regions, FunctionRegion, RegionState};
use crate::signature::{rewrite_signatures, SignatureMatcher};
use crate::source::{join_lines, split_lines, uses_crlf};
use anyhow::Result;

/// Result of transforming one file's text
#[derive(Debug, Clone)]
pub struct Transformation {
    pub text: String,
    /// One entry per matched handler, in source order
    pub regions: Vec<FunctionRegion>,
}

impl Transformation {
    fn unchanged(text: &str, regions: Vec<FunctionRegion>) -> Self {
        Transformation {
            text: text.to_string(),
            regions,
        }
    }

    /// Number of resolution statements injected
    pub fn injected(&self) -> usize {
        self.regions
            .iter()
            .filter(|r| r.state == RegionState::Injected)
            .count()
    }
}

/// Compiled transformation for one convention
#[derive(Debug, Clone)]
pub struct Engine {
    convention: Convention,
    matcher: SignatureMatcher,
}

impl Engine {
    pub fn new(convention: Convention) -> Result<Self> {
        let matcher = SignatureMatcher::new(&convention)?;
        Ok(Engine {
            convention,
            matcher,
        })
    }

    pub fn convention(&self) -> &Convention {
        &self.convention
    }

    /// Transform the full text of one file
    pub fn transform(&self, src: &str) -> Transformation {
        let matches = self.matcher.find(src);
        if matches.is_empty() {
            return Transformation::unchanged(src, Vec::new());
        }

        let ctx = ScanContext::new(src);
        let mut regions = build_regions(src, matches, &ctx.index, &ctx.line_starts);

        // Decide every insertion point before touching the text
        for region in &mut regions {
            match self.convention.locator.locate(&ctx, region, &self.convention) {
                Ok(point) => {
                    region.insertion = Some(point);
                    region.mark_signature_rewritten();
                }
                Err(reason) => match self.convention.on_unresolved {
                    UnresolvedPolicy::Revert => region.mark_skipped(reason),
                    UnresolvedPolicy::Keep => {
                        region.unresolved = Some(reason);
                        region.mark_signature_rewritten();
                    }
                },
            }
        }

        if regions.iter().all(|r| matches!(r.state, RegionState::Skipped(_))) {
            return Transformation::unchanged(src, regions);
        }

        let rewritten = rewrite_signatures(
            src,
            regions
                .iter()
                .filter(|r| r.state == RegionState::SignatureRewritten)
                .map(|r| &r.signature),
            &self.convention.wrapper,
        );

        // Wrapping a type never adds a line, so original line numbers still hold
        let mut lines = split_lines(&rewritten);
        let crlf = uses_crlf(src);
        for region in regions.iter_mut().rev() {
            if let Some(point) = region.insertion {
                let injected = injected_lines(&self.convention, ctx.lines[point.anchor_line], crlf);
                inject_after(&mut lines, point.line, injected);
                region.mark_injected();
            }
        }

        // Functions left synchronous keep their qualified references
        let reverted: Vec<&FunctionRegion> = regions
            .iter()
            .filter(|r| matches!(r.state, RegionState::Skipped(_)))
            .collect();
        for line in &mut lines {
            let keep = line
                .origin
                .is_some_and(|origin| reverted.iter().any(|r| r.covers(origin)));
            if keep {
                continue;
            }
            if let std::borrow::Cow::Owned(text) =
                rewrite_references(&line.text, &self.convention.param, &self.convention.field)
            {
                line.text = text;
            }
        }

        Transformation {
            text: join_lines(&lines),
            regions,
        }
    }
}
