//! Function arena and call graph.
//!
//! Every declared function (including nested ones) gets one [`FunctionNode`]
//! record addressed by an opaque [`FuncId`]. Phases own disjoint field
//! subsets: reference analysis fills `references`, the graph builder fills
//! the edge sets, propagation owns `decision`, policy resolution owns
//! `policy` and `preconditions`.

use rustc_hash::{FxHashMap, FxHashSet};
use serde::Serialize;

use crate::model::{FunctionBody, FunctionDecl, SigId, SourceLoc};
use crate::references::{Reference, UsageKind};

/// Opaque identity of a function record in the arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct FuncId(pub u32);

/// Per-function conversion verdict.
///
/// `Ignore` and `ToAsync` are final: once resolved, a node never reverts.
/// `Unknown` defers to propagation and is itself a valid terminal state when
/// configuration pins a function unconverted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum Decision {
    /// The seeding predicate has not run yet.
    Unseeded,
    /// Never converted.
    Ignore,
    /// Undecided; resolved by propagation or pinned by configuration.
    Unknown,
    /// Converted to the asynchronous calling convention.
    ToAsync,
}

/// Rewrite-shaping flags derived per converted function.
#[derive(Debug, Clone, Default, Serialize)]
pub struct PolicyFlags {
    /// No wrapper syntax: nothing in the body is awaited, or there is no
    /// body at all.
    pub omit_async: bool,
    /// An early-throwing returned call must keep propagating through the
    /// original exception channel.
    pub wrap_in_try_catch: bool,
    /// Split into a synchronous guard phase and an asynchronous remainder.
    pub split_tail: bool,
    /// Convert without applying the wrapper return type.
    pub preserve_return_type: bool,
    /// The converted signature must accept and forward a cancellation token.
    pub cancellation_required: bool,
    /// The body contains a structural producer statement that must be
    /// rewritten for the asynchronous shape.
    pub rewrite_yields: bool,
}

/// One function record. Created fresh per analysis run.
pub struct FunctionNode {
    /// Signature handle in the symbol model.
    pub sig: SigId,
    /// Body shape, if the declaration has one.
    pub body: Option<FunctionBody>,
    /// Enclosing function for nested declarations.
    pub parent: Option<FuncId>,
    /// Nested functions declared in this body.
    pub children: Vec<FuncId>,
    /// Doc-comment mentions of other functions.
    pub doc_mentions: Vec<(SigId, SourceLoc)>,
    /// Classified usage sites inside this body.
    pub references: Vec<Reference>,
    decision: Decision,
    /// Set during reference analysis when a call site must forward a
    /// cancellation token.
    pub cancellation_required: bool,
    /// Length of the guard-and-throw prefix run.
    pub preconditions: usize,
    /// Functions this body invokes (self-edges retained).
    pub invokes: FxHashSet<FuncId>,
    /// Functions whose bodies invoke this one.
    pub invoked_by: FxHashSet<FuncId>,
    /// Derived rewrite flags.
    pub policy: PolicyFlags,
}

impl FunctionNode {
    fn new(sig: SigId, body: Option<FunctionBody>, parent: Option<FuncId>) -> Self {
        FunctionNode {
            sig,
            body,
            parent,
            children: Vec::new(),
            doc_mentions: Vec::new(),
            references: Vec::new(),
            decision: Decision::Unseeded,
            cancellation_required: false,
            preconditions: 0,
            invokes: FxHashSet::default(),
            invoked_by: FxHashSet::default(),
            policy: PolicyFlags::default(),
        }
    }

    /// Current conversion verdict.
    #[must_use]
    pub fn decision(&self) -> Decision {
        self.decision
    }

    /// Monotonic transition. Final decisions never revert; returns whether
    /// the decision changed.
    pub(crate) fn resolve(&mut self, decision: Decision) -> bool {
        if matches!(self.decision, Decision::Ignore | Decision::ToAsync)
            || self.decision == decision
        {
            return false;
        }
        self.decision = decision;
        true
    }
}

/// Arena of function records, flattened from the host's declaration tree.
#[derive(Default)]
pub struct FunctionArena {
    nodes: Vec<FunctionNode>,
    by_sig: FxHashMap<SigId, FuncId>,
}

impl FunctionArena {
    /// Flattens a declaration forest into the arena. Nested declarations
    /// become child nodes with their own records.
    #[must_use]
    pub fn from_decls(declarations: Vec<FunctionDecl>) -> Self {
        let mut arena = FunctionArena::default();
        for decl in declarations {
            arena.add(decl, None);
        }
        arena
    }

    fn add(&mut self, decl: FunctionDecl, parent: Option<FuncId>) -> FuncId {
        let id = FuncId(u32::try_from(self.nodes.len()).unwrap_or(u32::MAX));
        let mut node = FunctionNode::new(decl.sig, decl.body, parent);
        node.doc_mentions = decl.doc_mentions;
        self.nodes.push(node);
        self.by_sig.insert(decl.sig, id);
        for child in decl.children {
            let child_id = self.add(child, Some(id));
            self.nodes[id.0 as usize].children.push(child_id);
        }
        id
    }

    /// Number of records.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the arena is empty.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All record identities in declaration order.
    pub fn ids(&self) -> impl Iterator<Item = FuncId> + '_ {
        (0..self.nodes.len()).map(|i| FuncId(i as u32))
    }

    /// Immutable access to a record.
    #[must_use]
    pub fn node(&self, id: FuncId) -> &FunctionNode {
        &self.nodes[id.0 as usize]
    }

    pub(crate) fn node_mut(&mut self, id: FuncId) -> &mut FunctionNode {
        &mut self.nodes[id.0 as usize]
    }

    /// Record for a signature, when the function is in the analysis set.
    #[must_use]
    pub fn lookup(&self, sig: SigId) -> Option<FuncId> {
        self.by_sig.get(&sig).copied()
    }

    /// Signatures of every function in the analysis set.
    #[must_use]
    pub fn in_set(&self) -> FxHashSet<SigId> {
        self.nodes.iter().map(|n| n.sig).collect()
    }
}

/// Pure aggregation of invoke/invoked-by edges from non-ignored references.
/// Self-edges are retained; downstream traversal is worklist-based.
pub(crate) fn build_call_graph(arena: &mut FunctionArena) {
    let mut edges: Vec<(FuncId, FuncId)> = Vec::new();
    for id in arena.ids() {
        for r in &arena.node(id).references {
            if r.ignore.is_some() {
                continue;
            }
            if !matches!(
                r.usage,
                UsageKind::DirectInvocation | UsageKind::DelegateArgument
            ) {
                continue;
            }
            if let Some(target) = arena.lookup(r.target) {
                edges.push((id, target));
            }
        }
    }
    for (source, target) in edges {
        arena.node_mut(source).invokes.insert(target);
        arena.node_mut(target).invoked_by.insert(source);
    }
}
