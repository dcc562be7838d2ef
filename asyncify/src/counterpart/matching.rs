//! Structural matching rules between a synchronous signature and an
//! asynchronous candidate.

use compact_str::CompactString;
use rustc_hash::FxHashSet;

use super::CounterpartOptions;
use crate::model::{FunctionSignature, Parameter, ReturnShape, TypeParam, TypeRef};

/// Whether `cand` is an asynchronous counterpart of `origin` under the given
/// options. Name and visibility have already been checked by the caller.
pub(super) fn signatures_match(
    origin: &FunctionSignature,
    cand: &FunctionSignature,
    options: CounterpartOptions,
    cancellation_types: &FxHashSet<CompactString>,
) -> bool {
    let extra_cancellation = cand.params.len() == origin.params.len() + 1
        && options.accepts_cancellation
        && cand
            .params
            .last()
            .is_some_and(|p| is_cancellation_token(&p.ty, cancellation_types));
    if cand.params.len() != origin.params.len() && !extra_cancellation {
        return false;
    }

    let mut async_delegate_pair = false;
    for (op, cp) in origin.params.iter().zip(&cand.params) {
        match param_matches(op, cp, options) {
            ParamMatch::No => return false,
            ParamMatch::Equal => {}
            ParamMatch::UpgradedDelegate => async_delegate_pair = true,
        }
    }

    returns_match(&origin.returns, &cand.returns, async_delegate_pair)
        && type_params_match(&origin.type_params, &cand.type_params)
}

enum ParamMatch {
    No,
    Equal,
    UpgradedDelegate,
}

fn param_matches(op: &Parameter, cp: &Parameter, options: CounterpartOptions) -> ParamMatch {
    if op.optional != cp.optional || op.variadic != cp.variadic || op.mode != cp.mode {
        return ParamMatch::No;
    }
    if op.ty == cp.ty {
        return ParamMatch::Equal;
    }
    if options.equal_parameters {
        return ParamMatch::No;
    }
    if delegate_matches(&op.ty, &cp.ty, options) {
        ParamMatch::UpgradedDelegate
    } else {
        ParamMatch::No
    }
}

/// Recursive arm of the parameter rule: a differing parameter may still
/// match when both sides are delegates and the candidate delegate's invoke
/// signature satisfies the counterpart rules against the original delegate.
/// This is what matches a plain callback against one returning the wrapper.
fn delegate_matches(orig: &TypeRef, cand: &TypeRef, options: CounterpartOptions) -> bool {
    let (TypeRef::Delegate {
        params: op,
        returns: or,
    }, TypeRef::Delegate {
        params: cp,
        returns: cr,
    }) = (orig, cand)
    else {
        return false;
    };
    if op.len() != cp.len() {
        return false;
    }
    let mut nested_upgrade = false;
    for (o, c) in op.iter().zip(cp) {
        if o == c {
            continue;
        }
        if options.equal_parameters || !delegate_matches(o, c, options) {
            return false;
        }
        nested_upgrade = true;
    }
    returns_match(or, cr, nested_upgrade)
}

/// The return-shape rule: void maps only to the bare wrapper, a value maps
/// to wrapper-of(value) or a type-parameter binding, and equal returns are
/// accepted only when a delegate-argument pair was itself async-convertible.
fn returns_match(orig: &ReturnShape, cand: &ReturnShape, async_delegate_pair: bool) -> bool {
    match (orig, cand) {
        (ReturnShape::Void, ReturnShape::Wrapped(None)) => true,
        (ReturnShape::Value(t), ReturnShape::Wrapped(Some(u))) => {
            u == t || matches!(u, TypeRef::Param(_))
        }
        (a, b) => a == b && async_delegate_pair,
    }
}

/// Type-parameter lists are compared positionally: equal count, variance,
/// and constraint sets. Names are immaterial.
fn type_params_match(origin: &[TypeParam], cand: &[TypeParam]) -> bool {
    origin.len() == cand.len()
        && origin.iter().zip(cand).all(|(o, c)| {
            o.variance == c.variance
                && o.constraints.len() == c.constraints.len()
                && o.constraints.iter().all(|x| c.constraints.contains(x))
        })
}

fn is_cancellation_token(ty: &TypeRef, cancellation_types: &FxHashSet<CompactString>) -> bool {
    matches!(ty, TypeRef::Named { name, args } if args.is_empty() && cancellation_types.contains(name))
}
