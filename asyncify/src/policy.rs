//! Per-function policy resolution: how each converted function's rewrite is
//! shaped.

mod preconditions;

pub use preconditions::{GuardThrowClassifier, PreconditionClassifier};

use crate::config::compiled::CompiledConfig;
use crate::engine::SigPredicate;
use crate::graph::{Decision, FuncId, FunctionArena, PolicyFlags};
use crate::model::{full_name, FunctionBody, Stmt, Symbols};

/// Derives [`PolicyFlags`] for every converted function, then runs the
/// restricted cancellation fixed point across the override/interface
/// lattice.
pub(crate) fn resolve(
    arena: &mut FunctionArena,
    symbols: &dyn Symbols,
    cfg: &CompiledConfig,
    classifier: &dyn PreconditionClassifier,
    preserve_override: Option<&SigPredicate>,
    cancellation_override: Option<&SigPredicate>,
) {
    let ids: Vec<FuncId> = arena.ids().collect();

    for &id in &ids {
        let count = arena
            .node(id)
            .body
            .as_ref()
            .map_or(0, |b| preconditions::count_prefix(b, classifier));
        arena.node_mut(id).preconditions = count;
    }

    for &id in &ids {
        let node = arena.node(id);
        let bodyless = node.body.is_none();
        if node.decision() != Decision::ToAsync {
            if bodyless {
                // Signature-only declarations never carry wrapper syntax.
                arena.node_mut(id).policy.omit_async = true;
            }
            continue;
        }

        let sig = symbols.signature(node.sig);
        let name = full_name(symbols, node.sig);
        let awaited_anywhere = node
            .references
            .iter()
            .any(|r| r.ignore.is_none() && r.await_needed);
        let early_return = node
            .references
            .iter()
            .any(|r| r.ignore.is_none() && r.used_as_return_value && !r.last_statement);
        let guarded = node.preconditions >= 1;
        // The first qualifying reference after the guard run decides the
        // split: awaited but not directly returnable means the function
        // breaks into a synchronous guard and an asynchronous remainder.
        let split_tail = guarded
            && node
                .references
                .iter()
                .filter(|r| {
                    r.ignore.is_none()
                        && !r.candidates.is_empty()
                        && r.stmt_index >= node.preconditions
                })
                .take(1)
                .any(|r| r.await_needed && !(r.used_as_return_value && r.last_statement));

        let flags = PolicyFlags {
            omit_async: bodyless || !awaited_anywhere,
            wrap_in_try_catch: guarded && early_return,
            split_tail,
            preserve_return_type: cfg.preserve_return_type_matches(&name)
                || preserve_override.is_some_and(|p| p(sig)),
            cancellation_required: node.cancellation_required
                || (cfg.propagate_cancellation && sig.is_interface_member)
                || cancellation_override.is_some_and(|p| p(sig)),
            rewrite_yields: node.body.as_ref().is_some_and(contains_yield),
        };
        arena.node_mut(id).policy = flags;
    }

    cancellation_fixed_point(arena, symbols);
}

/// Cancellation obligations flow both directions across the
/// override/interface-implementation lattice, but never anywhere else.
fn cancellation_fixed_point(arena: &mut FunctionArena, symbols: &dyn Symbols) {
    let mut worklist: Vec<FuncId> = arena
        .ids()
        .filter(|&id| {
            let node = arena.node(id);
            node.decision() == Decision::ToAsync && node.policy.cancellation_required
        })
        .collect();

    while let Some(id) = worklist.pop() {
        let related = symbols.related(arena.node(id).sig).to_vec();
        for sig in related {
            let Some(other) = arena.lookup(sig) else {
                continue;
            };
            let node = arena.node(other);
            if node.decision() == Decision::ToAsync && !node.policy.cancellation_required {
                arena.node_mut(other).policy.cancellation_required = true;
                worklist.push(other);
            }
        }
    }
}

fn contains_yield(body: &FunctionBody) -> bool {
    fn stmts_contain(stmts: &[Stmt]) -> bool {
        stmts.iter().any(|s| match s {
            Stmt::Yield(_) => true,
            Stmt::If {
                then_branch,
                else_branch,
                ..
            } => stmts_contain(then_branch) || stmts_contain(else_branch),
            Stmt::Block(inner) => stmts_contain(inner),
            _ => false,
        })
    }
    match body {
        FunctionBody::Block(stmts) => stmts_contain(stmts),
        FunctionBody::Expression(_) => false,
    }
}
