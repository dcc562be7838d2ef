//! Conversion propagation: an explicit worklist fixed point over the call
//! graph. Recursion is never used — deep and cyclic graphs (self-edges
//! included) must not consume stack.
//!
//! Termination: every node leaves {Unseeded, Unknown} at most once, and only
//! nodes that just became `ToAsync` enter the worklist.

use std::collections::VecDeque;

use crate::config::compiled::CompiledConfig;
use crate::graph::{Decision, FuncId, FunctionArena};
use crate::model::{full_name, Symbols};

pub(crate) fn fixed_point(arena: &mut FunctionArena, symbols: &dyn Symbols, cfg: &CompiledConfig) {
    let mut worklist: VecDeque<FuncId> = arena
        .ids()
        .filter(|&id| arena.node(id).decision() == Decision::ToAsync)
        .collect();

    while let Some(converted) = worklist.pop_front() {
        let target_sig = arena.node(converted).sig;
        let callers: Vec<FuncId> = arena.node(converted).invoked_by.iter().copied().collect();
        for caller in callers {
            if arena.node(caller).decision() != Decision::Unknown {
                continue;
            }
            let node = arena.node(caller);
            let has_counterparts = node.references.iter().any(|r| {
                r.target == target_sig && r.ignore.is_none() && !r.candidates.is_empty()
            });
            if !has_counterparts {
                continue;
            }
            // A caller nobody invokes, with no related members and no policy
            // requiring it, gains nothing from converting.
            let wanted = !node.invoked_by.is_empty()
                || !symbols.related(node.sig).is_empty()
                || cfg.force_convert_matches(&full_name(symbols, node.sig));
            if wanted {
                if arena.node_mut(caller).resolve(Decision::ToAsync) {
                    worklist.push_back(caller);
                }
            } else {
                arena.node_mut(caller).resolve(Decision::Ignore);
            }
        }
    }

    // Whatever propagation never reached stays unconverted: Ignore, unless
    // configuration pins it Unknown.
    let leftovers: Vec<FuncId> = arena
        .ids()
        .filter(|&id| {
            matches!(
                arena.node(id).decision(),
                Decision::Unseeded | Decision::Unknown
            )
        })
        .collect();
    for id in leftovers {
        let pinned = cfg.keep_unknown_matches(&full_name(symbols, arena.node(id).sig));
        let resolved = if pinned {
            Decision::Unknown
        } else {
            Decision::Ignore
        };
        arena.node_mut(id).resolve(resolved);
    }
}
