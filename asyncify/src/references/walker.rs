//! The context-classifying body walker.
//!
//! The walker descends through a body keeping a stack of enclosing
//! syntactic-context frames. Reaching a function reference, it "ascends" by
//! scanning the frame stack innermost-first; each recognized context has one
//! arm, and anything without an arm is a fatal error — an incomplete context
//! table must never produce a partial plan.

use compact_str::CompactString;

use super::{IgnoreReason, Reference, ReferenceDelta, UsageKind};
use crate::config::compiled::{AdapterKind, CompiledConfig};
use crate::counterpart::{CounterpartCandidate, CounterpartResolver};
use crate::diagnostics::{AnalysisError, Diagnostic, DiagnosticKind};
use crate::graph::FunctionNode;
use crate::model::{
    full_name, AssignTarget, Expr, FunctionBody, ReturnShape, SigId, SourceLoc, Stmt, Symbols,
    TypeId, TypeRef,
};
use rustc_hash::FxHashSet;

#[derive(Clone)]
enum Frame {
    /// The reference is the callee of an invocation.
    Callee { continuation_argument: bool },
    /// The reference is argument `index` of a call to `callee`.
    Argument { callee: Option<SigId>, index: usize },
    /// Branch value of a ternary.
    Ternary,
    /// Condition of an `if` or ternary.
    Condition,
    /// Operand of a cast.
    Cast,
    AssignLocal,
    AssignMember,
    AssignEvent,
    /// Initializer of a local declaration.
    LocalInit,
    /// Base of a member access.
    Member(CompactString),
    /// Value of a return statement.
    Return,
    /// Value of a throw statement.
    Throw,
    /// Value of a yield-style producer statement.
    YieldValue,
    /// Expression statement.
    ExprStatement,
    /// The single expression of an expression-bodied function.
    ExprBody,
    /// Host-declared unrecognized construct.
    Unrecognized { description: CompactString, loc: SourceLoc },
}

pub(super) struct ReferenceWalker<'a> {
    symbols: &'a dyn Symbols,
    resolver: &'a CounterpartResolver,
    cfg: &'a CompiledConfig,
    in_set: &'a FxHashSet<SigId>,
    enclosing_type: TypeId,
    enclosing_returns: ReturnShape,
    enclosing_name: String,
    stack: Vec<Frame>,
    stmt_index: usize,
    top_is_last: bool,
    depth: usize,
    out: ReferenceDelta,
}

impl<'a> ReferenceWalker<'a> {
    pub(super) fn run(
        symbols: &'a dyn Symbols,
        resolver: &'a CounterpartResolver,
        cfg: &'a CompiledConfig,
        in_set: &'a FxHashSet<SigId>,
        node: &FunctionNode,
    ) -> Result<ReferenceDelta, AnalysisError> {
        let sig = symbols.signature(node.sig);
        let mut walker = ReferenceWalker {
            symbols,
            resolver,
            cfg,
            in_set,
            enclosing_type: sig.declaring_type,
            enclosing_returns: sig.returns.clone(),
            enclosing_name: full_name(symbols, node.sig),
            stack: Vec::new(),
            stmt_index: 0,
            top_is_last: false,
            depth: 0,
            out: ReferenceDelta::default(),
        };
        if let Some(body) = &node.body {
            walker.walk_body(body)?;
        }
        for &(target, loc) in &node.doc_mentions {
            let mut r = Reference::new(target, loc, 0);
            r.usage = UsageKind::DocMention;
            r.ignore = Some(IgnoreReason::DocMention);
            walker.out.references.push(r);
        }
        Ok(walker.out)
    }

    fn walk_body(&mut self, body: &FunctionBody) -> Result<(), AnalysisError> {
        match body {
            FunctionBody::Block(stmts) => {
                let len = stmts.len();
                for (i, stmt) in stmts.iter().enumerate() {
                    self.stmt_index = i;
                    self.top_is_last = i + 1 == len;
                    self.walk_stmt(stmt)?;
                }
                Ok(())
            }
            FunctionBody::Expression(expr) => {
                self.stmt_index = 0;
                self.top_is_last = true;
                self.with_frame(Frame::ExprBody, |w| w.walk_expr(expr))
            }
        }
    }

    fn walk_stmt(&mut self, stmt: &Stmt) -> Result<(), AnalysisError> {
        match stmt {
            Stmt::Expr(e) => self.with_frame(Frame::ExprStatement, |w| w.walk_expr(e)),
            Stmt::Return(Some(e)) => self.with_frame(Frame::Return, |w| w.walk_expr(e)),
            Stmt::Return(None) | Stmt::Yield(None) | Stmt::Local { value: None, .. } => Ok(()),
            Stmt::If {
                cond,
                then_branch,
                else_branch,
            } => {
                self.with_frame(Frame::Condition, |w| w.walk_expr(cond))?;
                self.walk_nested(then_branch)?;
                self.walk_nested(else_branch)
            }
            Stmt::Throw(e) => self.with_frame(Frame::Throw, |w| w.walk_expr(e)),
            Stmt::Yield(Some(e)) => self.with_frame(Frame::YieldValue, |w| w.walk_expr(e)),
            Stmt::Local { value: Some(e), .. } => {
                self.with_frame(Frame::LocalInit, |w| w.walk_expr(e))
            }
            Stmt::Block(stmts) => self.walk_nested(stmts),
        }
    }

    fn walk_nested(&mut self, stmts: &[Stmt]) -> Result<(), AnalysisError> {
        self.depth += 1;
        let result = stmts.iter().try_for_each(|s| self.walk_stmt(s));
        self.depth -= 1;
        result
    }

    fn walk_expr(&mut self, expr: &Expr) -> Result<(), AnalysisError> {
        match expr {
            Expr::Call { callee, args, .. } => {
                let callee_target = match callee.as_ref() {
                    Expr::FuncRef { target, .. } => Some(*target),
                    _ => None,
                };
                let continuation_argument = callee_target
                    .is_some_and(|t| self.has_continuation_argument(t, args));
                self.with_frame(Frame::Callee {
                    continuation_argument,
                }, |w| w.walk_expr(callee))?;
                for (index, arg) in args.iter().enumerate() {
                    self.with_frame(
                        Frame::Argument {
                            callee: callee_target,
                            index,
                        },
                        |w| w.walk_expr(arg),
                    )?;
                }
                Ok(())
            }
            Expr::FuncRef { target, loc } => self.classify(*target, *loc),
            Expr::Ternary {
                cond,
                then_value,
                else_value,
            } => {
                self.with_frame(Frame::Condition, |w| w.walk_expr(cond))?;
                self.with_frame(Frame::Ternary, |w| w.walk_expr(then_value))?;
                self.with_frame(Frame::Ternary, |w| w.walk_expr(else_value))
            }
            Expr::Cast { value, .. } => self.with_frame(Frame::Cast, |w| w.walk_expr(value)),
            Expr::Assign { target, value } => {
                let frame = match target {
                    AssignTarget::Local(_) => Frame::AssignLocal,
                    AssignTarget::Member(_) => Frame::AssignMember,
                    AssignTarget::Event(_) => Frame::AssignEvent,
                };
                self.with_frame(frame, |w| w.walk_expr(value))
            }
            Expr::Member { base, name } => {
                self.with_frame(Frame::Member(name.clone()), |w| w.walk_expr(base))
            }
            Expr::Name(_) | Expr::Literal(_) => Ok(()),
            Expr::Unrecognized {
                description,
                loc,
                children,
            } => children.iter().try_for_each(|c| {
                self.with_frame(
                    Frame::Unrecognized {
                        description: description.clone(),
                        loc: *loc,
                    },
                    |w| w.walk_expr(c),
                )
            }),
        }
    }

    fn with_frame<R>(
        &mut self,
        frame: Frame,
        f: impl FnOnce(&mut Self) -> Result<R, AnalysisError>,
    ) -> Result<R, AnalysisError> {
        self.stack.push(frame);
        let result = f(self);
        self.stack.pop();
        result
    }

    /// The ascent: scan enclosing contexts innermost-first and build the
    /// reference. Exactly one arm per recognized context.
    fn classify(&mut self, target: SigId, loc: SourceLoc) -> Result<(), AnalysisError> {
        let mut r = Reference::new(target, loc, self.stmt_index);
        r.last_statement = self.depth == 0 && self.top_is_last;
        let target_returns_wrapper = self.symbols.signature(target).returns.is_wrapped();

        let mut invoked = false;
        let mut forced_await = false;
        let mut consumed = false;
        let mut terminal = false;

        for i in (0..self.stack.len()).rev() {
            let frame = self.stack[i].clone();
            match frame {
                Frame::Callee {
                    continuation_argument,
                } => {
                    // Above the first hit, callee frames belong to adapter
                    // invocations and carry no information of their own.
                    if !invoked {
                        invoked = true;
                        self.invocation_analysis(&mut r, continuation_argument);
                    }
                }
                Frame::Member(name) => {
                    if !invoked {
                        return Err(self.fatal("member access on a function reference", loc));
                    }
                    if target_returns_wrapper {
                        match self.cfg.adapter_kind(&name) {
                            Some(AdapterKind::Configure | AdapterKind::Awaiter) => {}
                            Some(AdapterKind::Blocking) => forced_await = true,
                            None => {
                                // The deferred result escapes through an
                                // unrecognized member; leave the site alone.
                                self.ignore(
                                    &mut r,
                                    IgnoreReason::UnrecognizedAdapter,
                                    "deferred result escapes through an unrecognized member",
                                );
                                terminal = true;
                            }
                        }
                    } else {
                        consumed = true;
                    }
                }
                Frame::Condition | Frame::Ternary => {}
                Frame::Cast => forced_await = true,
                Frame::Argument { callee, index } => {
                    if invoked {
                        consumed = true;
                    } else {
                        self.delegate_argument_analysis(&mut r, callee, index);
                        terminal = true;
                    }
                }
                Frame::AssignEvent => {
                    if invoked {
                        consumed = true;
                    } else {
                        r.usage = UsageKind::EventSubscription;
                        self.ignore(
                            &mut r,
                            IgnoreReason::EventSubscription,
                            "event handler signatures are fixed by the event declaration",
                        );
                        terminal = true;
                    }
                }
                Frame::AssignLocal | Frame::AssignMember | Frame::LocalInit => {
                    if invoked {
                        consumed = true;
                    } else {
                        r.usage = UsageKind::VariableAssignment;
                        self.ignore(
                            &mut r,
                            IgnoreReason::VariableAssignment,
                            "rewriting would change a statically-declared delegate type",
                        );
                        terminal = true;
                    }
                }
                Frame::Return | Frame::ExprBody => r.used_as_return_value = true,
                Frame::ExprStatement => {}
                Frame::Throw | Frame::YieldValue => {
                    if invoked {
                        consumed = true;
                    } else {
                        return Err(
                            self.fatal("function reference used as a throw or yield value", loc)
                        );
                    }
                }
                Frame::Unrecognized { description, loc } => {
                    return Err(AnalysisError::UnrecognizedContext {
                        function: self.enclosing_name.clone(),
                        context: description.to_string(),
                        loc,
                    });
                }
            }
            if terminal {
                break;
            }
        }

        if !terminal {
            if invoked {
                self.finalize_await(&mut r, forced_await, consumed, target_returns_wrapper);
            } else {
                r.usage = UsageKind::VariableAssignment;
                self.ignore(
                    &mut r,
                    IgnoreReason::BareReference,
                    "bare function reference consumed as a value",
                );
            }
        }
        self.out.references.push(r);
        Ok(())
    }

    /// Counterpart lookup and binding for a direct invocation.
    fn invocation_analysis(&mut self, r: &mut Reference, continuation_argument: bool) {
        r.usage = UsageKind::DirectInvocation;
        r.continuation_argument = continuation_argument;
        self.resolve_candidates(r);
        self.bind_or_defer(r);

        let original_params = self.symbols.signature(r.target).params.len();
        if self.cfg.propagate_cancellation
            && r.candidates
                .iter()
                .any(|c| c.param_count > original_params)
        {
            r.forward_cancellation = true;
            self.out.cancellation_required = true;
        }
    }

    /// A callback passed where another call expects a delegate. Acceptable
    /// only when the receiving parameter's declared type can produce a
    /// deferred result.
    fn delegate_argument_analysis(
        &mut self,
        r: &mut Reference,
        callee: Option<SigId>,
        index: usize,
    ) {
        r.usage = UsageKind::DelegateArgument;
        let Some(callee) = callee else {
            self.ignore(
                r,
                IgnoreReason::DelegateNotAsyncCapable,
                "callback passed to an unresolvable callee",
            );
            return;
        };
        let param_ty = self.symbols.signature(callee).params.get(index).map(|p| &p.ty);
        let Some(TypeRef::Delegate {
            returns: delegate_returns,
            ..
        }) = param_ty
        else {
            self.ignore(
                r,
                IgnoreReason::DelegateNotAsyncCapable,
                "receiving parameter is not a delegate type",
            );
            return;
        };
        if !delegate_returns.is_wrapped() {
            self.ignore(
                r,
                IgnoreReason::DelegateNotAsyncCapable,
                "receiving delegate type cannot produce a deferred result",
            );
            return;
        }
        let delegate_returns = (**delegate_returns).clone();
        self.resolve_candidates(r);
        self.bind_or_defer(r);
        // Differing callback return shapes force an await inside the
        // adapting lambda the rewriter generates.
        if self.symbols.signature(r.target).returns != delegate_returns {
            r.await_needed = true;
        }
    }

    fn resolve_candidates(&mut self, r: &mut Reference) {
        let found =
            self.resolver
                .find_counterparts(self.symbols, r.target, self.enclosing_type, self.cfg.options);
        r.candidates = (*found).clone();
        if r.candidates.is_empty() && self.in_set.contains(&r.target) {
            // The target converts in this run; its counterpart will exist by
            // the time the rewriter runs.
            r.candidates.push(self.synthetic_candidate(r.target));
        }
    }

    fn bind_or_defer(&mut self, r: &mut Reference) {
        if r.candidates.len() > 1 {
            let message = format!(
                "{} counterpart candidates; binding deferred to transformation time",
                r.candidates.len()
            );
            self.out.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::AmbiguousCounterpart,
                function: self.enclosing_name.clone(),
                target: full_name(self.symbols, r.target),
                loc: r.loc,
                message,
            });
        } else {
            r.bound = r.candidates.first().map(|c| c.name.clone());
        }
    }

    fn synthetic_candidate(&self, target: SigId) -> CounterpartCandidate {
        let sig = self.symbols.signature(target);
        let mut name = sig.name.clone();
        name.push_str(&self.cfg.suffix);
        let returns = match &sig.returns {
            ReturnShape::Void => ReturnShape::Wrapped(None),
            ReturnShape::Value(t) => ReturnShape::Wrapped(Some(t.clone())),
            ReturnShape::Wrapped(inner) => ReturnShape::Wrapped(inner.clone()),
        };
        CounterpartCandidate {
            sig: target,
            name,
            param_count: sig.params.len(),
            returns,
            synthetic: true,
        }
    }

    /// Resolves the await decision once the whole context chain is known.
    fn finalize_await(
        &self,
        r: &mut Reference,
        forced_await: bool,
        consumed: bool,
        target_returns_wrapper: bool,
    ) {
        let awaitable =
            target_returns_wrapper || r.candidates.iter().any(|c| c.returns.is_wrapped());
        if !awaitable {
            r.await_needed = false;
            return;
        }
        if forced_await {
            r.await_needed = true;
            return;
        }
        if r.used_as_return_value && !consumed && self.tail_return_compatible(r, target_returns_wrapper)
        {
            // The deferred result can be returned directly.
            r.await_needed = false;
            return;
        }
        r.await_needed = true;
    }

    fn tail_return_compatible(&self, r: &Reference, target_returns_wrapper: bool) -> bool {
        (target_returns_wrapper
            && self.compatible_wrapped(&self.symbols.signature(r.target).returns))
            || r.candidates.iter().any(|c| self.compatible_wrapped(&c.returns))
    }

    fn compatible_wrapped(&self, shape: &ReturnShape) -> bool {
        let ReturnShape::Wrapped(inner) = shape else {
            return false;
        };
        match (&self.enclosing_returns, inner) {
            (ReturnShape::Void, None) => true,
            (ReturnShape::Value(t), Some(u)) => u == t || matches!(u, TypeRef::Param(_)),
            (ReturnShape::Wrapped(w), i) => w == i,
            _ => false,
        }
    }

    fn has_continuation_argument(&self, target: SigId, args: &[Expr]) -> bool {
        let params = &self.symbols.signature(target).params;
        args.iter().enumerate().any(|(i, arg)| {
            matches!(arg, Expr::FuncRef { .. })
                && matches!(params.get(i).map(|p| &p.ty), Some(TypeRef::Delegate { .. }))
        })
    }

    fn ignore(&mut self, r: &mut Reference, reason: IgnoreReason, message: &str) {
        r.ignore = Some(reason);
        r.await_needed = false;
        if !matches!(
            reason,
            IgnoreReason::DocMention | IgnoreReason::UnrecognizedAdapter
        ) {
            self.out.diagnostics.push(Diagnostic {
                kind: DiagnosticKind::UnsupportedUsage,
                function: self.enclosing_name.clone(),
                target: full_name(self.symbols, r.target),
                loc: r.loc,
                message: message.to_owned(),
            });
        }
    }

    fn fatal(&self, context: &str, loc: SourceLoc) -> AnalysisError {
        AnalysisError::UnrecognizedContext {
            function: self.enclosing_name.clone(),
            context: context.to_owned(),
            loc,
        }
    }
}
