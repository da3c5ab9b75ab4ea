//! Instruction-list tokens and flow linkage.
//!
//! Tokens live in exactly one place: the [`crate::Program`] instruction
//! list. Flow openers and closers are linked to each other through
//! [`InsnIdx`] indices rather than references, so the `prev`/`next`/`root`/
//! `end` back-links never form ownership cycles (the list owns everything).
//! `position` always equals the token's index; region splices during
//! preprocessing renumber it together with all links.

use slc_util::{define_idx, SourceInfo, Symbol};

use crate::op::Op;

define_idx!(
    /// Index of a token in the instruction list
    InsnIdx
);

/// A name captured by `let`/`with` or a named procedure argument
#[derive(Clone, Debug, PartialEq)]
pub struct Binding {
    pub name: Symbol,
    pub info: SourceInfo,
}

/// Linkage attached to flow openers, chain members and closers
#[derive(Clone, Debug, PartialEq)]
pub struct FlowInfo {
    /// The outermost opener of the chain (an `if` for `if/elif/else/end`);
    /// never null once the resolver has seen the token
    pub root: InsnIdx,
    /// The immediately preceding element in the chain
    pub prev: Option<InsnIdx>,
    /// The following element in the chain
    pub next: Option<InsnIdx>,
    /// The closing `end` of the block
    pub end: Option<InsnIdx>,
    /// Whether the chain terminates with an `else`
    pub has_else: bool,
    /// Captured names (`let`/`with` binder list)
    pub names: Vec<Binding>,
}

impl FlowInfo {
    /// Flow info for a fresh opener rooted at itself
    pub fn rooted(root: InsnIdx) -> Self {
        Self {
            root,
            prev: None,
            next: None,
            end: None,
            has_else: false,
            names: Vec::new(),
        }
    }

    /// Flow info for a chain member
    pub fn chained(root: InsnIdx, prev: InsnIdx) -> Self {
        Self {
            prev: Some(prev),
            ..Self::rooted(root)
        }
    }
}

/// A single token of the instruction list
#[derive(Clone, Debug, PartialEq)]
pub struct Token {
    /// What this token does
    pub op: Op,
    /// Flow linkage, present on flow tokens after resolution
    pub flow: Option<Box<FlowInfo>>,
    /// Source provenance
    pub info: SourceInfo,
    /// Index in the instruction list; assigned on append, kept dense
    pub position: InsnIdx,
}

impl Token {
    pub fn new(op: Op, info: SourceInfo) -> Self {
        Self {
            op,
            flow: None,
            info,
            position: InsnIdx(0),
        }
    }

    /// The flow linkage; panics on non-flow tokens (parser invariant)
    pub fn flow(&self) -> &FlowInfo {
        self.flow
            .as_deref()
            .expect("flow token without resolved linkage")
    }

    pub fn flow_mut(&mut self) -> &mut FlowInfo {
        self.flow
            .as_deref_mut()
            .expect("flow token without resolved linkage")
    }

    /// A copy of this token suitable for macro expansion: flow linkage is
    /// dropped (the copy is re-resolved at the expansion site) and the
    /// provenance is re-parented at the call site.
    pub fn expanded_copy(&self, call_site: &SourceInfo) -> Token {
        Token {
            op: self.op.clone(),
            flow: None,
            info: SourceInfo::nested(self.info.span, call_site.clone()),
            position: InsnIdx(0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use slc_util::Span;

    #[test]
    fn test_expanded_copy_reparents() {
        let body_tok = Token::new(Op::Push(1), SourceInfo::new(Span::new(10, 11, 2, 1)));
        let call_site = SourceInfo::new(Span::new(50, 53, 7, 4));
        let copy = body_tok.expanded_copy(&call_site);
        assert_eq!(copy.op, Op::Push(1));
        assert!(copy.flow.is_none());
        assert_eq!(copy.info.span, body_tok.info.span);
        assert_eq!(copy.info.parent.as_deref().unwrap().span, call_site.span);
    }

    #[test]
    fn test_flow_rooted() {
        let flow = FlowInfo::rooted(InsnIdx(3));
        assert_eq!(flow.root, InsnIdx(3));
        assert_eq!(flow.prev, None);
        assert!(!flow.has_else);
    }
}
