//! Per-function migration state
//!
//! Every matched handler gets one `FunctionRegion`. Its state only moves
//! forward:
//!
//! ```text
//! Pending ──> SignatureRewritten ──> Injected
//!    │
//!    └──────> Skipped(reason)
//! ```
//!
//! A region left in `SignatureRewritten` carries the reason its resolution
//! statement could not be placed in `unresolved`.

use crate::blocks::BlockIndex;
use crate::locate::InsertionPoint;
use crate::signature::SignatureMatch;

/// Why a matched handler did not receive a resolution statement
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SkipReason {
    /// No anchor statement inside the function body
    AnchorNotFound,
    /// Window locator ran out of lines before finding the end of the check
    InsertionWindowExhausted,
    /// Block locator found no authorization block after the anchor
    NoAuthorizationBlock,
    /// Function body has no matching closing brace
    UnbalancedBody,
    /// A qualified reference sits above the insertion point and would be
    /// read before the resolved binding is declared
    ReferenceBeforeInsertion,
}

impl SkipReason {
    pub fn as_str(&self) -> &'static str {
        match self {
            SkipReason::AnchorNotFound => "anchor-not-found",
            SkipReason::InsertionWindowExhausted => "insertion-window-exhausted",
            SkipReason::NoAuthorizationBlock => "no-authorization-block",
            SkipReason::UnbalancedBody => "unbalanced-body",
            SkipReason::ReferenceBeforeInsertion => "reference-before-insertion",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RegionState {
    Pending,
    SignatureRewritten,
    Injected,
    Skipped(SkipReason),
}

impl RegionState {
    pub fn as_str(&self) -> &'static str {
        match self {
            RegionState::Pending => "pending",
            RegionState::SignatureRewritten => "signature-rewritten",
            RegionState::Injected => "injected",
            RegionState::Skipped(_) => "skipped",
        }
    }
}

/// Line span of one matched handler, from declaration to closing brace
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FunctionRegion {
    pub signature: SignatureMatch,
    /// 0-indexed line of the declaration
    pub decl_line: usize,
    /// Block index of the function body
    pub body: Option<usize>,
    /// 0-indexed line of the body's closing brace (last line if unbalanced)
    pub end_line: usize,
    pub state: RegionState,
    pub insertion: Option<InsertionPoint>,
    /// Set when the signature was rewritten without a resolution statement
    pub unresolved: Option<SkipReason>,
}

impl FunctionRegion {
    pub fn name(&self) -> &str {
        &self.signature.name
    }

    /// Whether the untransformed line `line` belongs to this function
    pub fn covers(&self, line: usize) -> bool {
        (self.decl_line..=self.end_line).contains(&line)
    }

    pub fn mark_signature_rewritten(&mut self) {
        debug_assert_eq!(self.state, RegionState::Pending);
        self.state = RegionState::SignatureRewritten;
    }

    pub fn mark_injected(&mut self) {
        debug_assert_eq!(self.state, RegionState::SignatureRewritten);
        debug_assert!(self.insertion.is_some());
        self.state = RegionState::Injected;
    }

    pub fn mark_skipped(&mut self, reason: SkipReason) {
        debug_assert_eq!(self.state, RegionState::Pending);
        self.state = RegionState::Skipped(reason);
    }

    /// Reason the function ended up without a resolution statement, if any
    pub fn skip_reason(&self) -> Option<SkipReason> {
        match self.state {
            RegionState::Skipped(reason) => Some(reason),
            _ => self.unresolved,
        }
    }
}

/// 0-indexed line containing byte `offset`
pub fn line_of(line_starts: &[usize], offset: usize) -> usize {
    line_starts.partition_point(|&start| start <= offset).saturating_sub(1)
}

/// Build one region per signature match, in source order
pub fn build_regions(
    src: &str,
    matches: Vec<SignatureMatch>,
    index: &BlockIndex,
    line_starts: &[usize],
) -> Vec<FunctionRegion> {
    let last_line = line_starts.len().saturating_sub(1);

    matches
        .into_iter()
        .map(|signature| {
            let decl_line = line_of(line_starts, signature.start);

            // The body is the first block after the parameter list, unless a
            // `;` ends the declaration first (overload signature)
            let body = index.first_open_from(signature.end).filter(|&idx| {
                index.get(idx).is_some_and(|block| {
                    block.close.is_some() && !src[signature.end..block.open].contains(';')
                })
            });
            let end_line = body
                .and_then(|idx| index.get(idx))
                .and_then(|block| block.close_line)
                .unwrap_or(last_line);

            FunctionRegion {
                signature,
                decl_line,
                body,
                end_line,
                state: RegionState::Pending,
                insertion: None,
                unresolved: None,
            }
        })
        .collect()
}
