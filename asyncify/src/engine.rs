//! The analysis pipeline.
//!
//! [`Asyncify`] owns the run configuration and the programmatic hooks, and
//! drives the phases in strict order: reference analysis (parallel per
//! function), call graph construction, seeding + propagation, policy
//! resolution, plan freeze. A coarse cancellation signal is checked only
//! between phases.

use std::sync::atomic::Ordering;
use std::sync::Arc;

use colored::Colorize;
use rayon::prelude::{IntoParallelRefIterator, ParallelIterator};
use serde::Serialize;

use crate::config::compiled::CompiledConfig;
use crate::config::Config;
use crate::counterpart::CounterpartResolver;
use crate::diagnostics::{AnalysisError, Diagnostic};
use crate::graph::{Decision, FuncId, FunctionArena, FunctionNode};
use crate::model::{full_name, FunctionDecl, FunctionSignature, Symbols};
use crate::plan::ConversionPlan;
use crate::policy::{GuardThrowClassifier, PreconditionClassifier};
use crate::{graph, plan, policy, propagate, references, CANCELLED};

/// Seeding override: maps a signature straight to a decision, replacing the
/// built-in predicate.
pub type SeedPredicate = Box<dyn Fn(&FunctionSignature) -> Decision + Send + Sync>;

/// Per-function boolean override used for `PreserveReturnType` and
/// `CancellationRequired`.
pub type SigPredicate = Box<dyn Fn(&FunctionSignature) -> bool + Send + Sync>;

/// Aggregate counts reported next to the plan.
#[derive(Debug, Clone, Default, Serialize)]
pub struct AnalysisSummary {
    /// Functions analyzed (nested ones included).
    pub functions: usize,
    /// Functions resolved to `ToAsync`.
    pub converted: usize,
    /// Functions resolved to `Ignore`.
    pub ignored: usize,
    /// Functions pinned `Unknown` by configuration.
    pub kept_unknown: usize,
    /// References classified.
    pub references: usize,
    /// References excluded from rewriting.
    pub ignored_references: usize,
    /// Recoverable diagnostics recorded.
    pub diagnostics: usize,
}

/// Everything a run produces.
pub struct AnalysisOutcome {
    /// The frozen conversion plan.
    pub plan: ConversionPlan,
    /// Location-keyed recoverable diagnostics.
    pub diagnostics: Vec<Diagnostic>,
    /// Aggregate counts.
    pub summary: AnalysisSummary,
}

/// Main engine state and runtime configuration.
pub struct Asyncify {
    /// Configuration object.
    pub config: Config,
    /// Whether to print diagnostics and the summary to stderr.
    pub verbose: bool,
    /// Progress bar for tracking analysis progress (thread-safe).
    pub progress_bar: Option<Arc<indicatif::ProgressBar>>,
    seed: Option<SeedPredicate>,
    preconditions: Box<dyn PreconditionClassifier>,
    preserve_return_type: Option<SigPredicate>,
    require_cancellation: Option<SigPredicate>,
}

impl Default for Asyncify {
    fn default() -> Self {
        Asyncify {
            config: Config::default(),
            verbose: false,
            progress_bar: None,
            seed: None,
            preconditions: Box::new(GuardThrowClassifier),
            preserve_return_type: None,
            require_cancellation: None,
        }
    }
}

impl Asyncify {
    /// Builder-style method to set the configuration.
    #[must_use]
    pub fn with_config(mut self, config: Config) -> Self {
        self.config = config;
        self
    }

    /// Builder-style method to set verbose mode.
    #[must_use]
    pub fn with_verbose(mut self, verbose: bool) -> Self {
        self.verbose = verbose;
        self
    }

    /// Builder-style method to attach a progress bar.
    #[must_use]
    pub fn with_progress_bar(mut self, progress_bar: Arc<indicatif::ProgressBar>) -> Self {
        self.progress_bar = Some(progress_bar);
        self
    }

    /// Replaces the built-in seeding predicate.
    #[must_use]
    pub fn with_seed_predicate(mut self, seed: SeedPredicate) -> Self {
        self.seed = Some(seed);
        self
    }

    /// Replaces the default guard-and-throw precondition classifier.
    #[must_use]
    pub fn with_precondition_classifier(
        mut self,
        classifier: Box<dyn PreconditionClassifier>,
    ) -> Self {
        self.preconditions = classifier;
        self
    }

    /// Installs a per-function `PreserveReturnType` override.
    #[must_use]
    pub fn with_preserve_return_type(mut self, predicate: SigPredicate) -> Self {
        self.preserve_return_type = Some(predicate);
        self
    }

    /// Installs a per-function `CancellationRequired` override.
    #[must_use]
    pub fn with_required_cancellation(mut self, predicate: SigPredicate) -> Self {
        self.require_cancellation = Some(predicate);
        self
    }

    /// Runs the full pipeline over one immutable symbol-model snapshot.
    ///
    /// All entities are created fresh; nothing persists across runs.
    pub fn analyze(
        &self,
        symbols: &dyn Symbols,
        declarations: Vec<FunctionDecl>,
    ) -> Result<AnalysisOutcome, AnalysisError> {
        let cfg = CompiledConfig::from_config(&self.config)?;
        let resolver = CounterpartResolver::new(&self.config);
        let mut arena = FunctionArena::from_decls(declarations);
        let in_set = arena.in_set();
        let ids: Vec<FuncId> = arena.ids().collect();

        self.check_cancelled()?;
        let deltas = ids
            .par_iter()
            .map(|&id| {
                if let Some(pb) = &self.progress_bar {
                    pb.inc(1);
                }
                references::analyze_function(symbols, &resolver, &cfg, &in_set, arena.node(id))
            })
            .collect::<Result<Vec<_>, AnalysisError>>()?;

        let mut diagnostics = Vec::new();
        for (&id, delta) in ids.iter().zip(deltas) {
            let node = arena.node_mut(id);
            node.references = delta.references;
            node.cancellation_required |= delta.cancellation_required;
            diagnostics.extend(delta.diagnostics);
        }

        self.check_cancelled()?;
        graph::build_call_graph(&mut arena);

        self.check_cancelled()?;
        for &id in &ids {
            let decision = self.seed_decision(symbols, &cfg, arena.node(id));
            arena.node_mut(id).resolve(decision);
        }
        propagate::fixed_point(&mut arena, symbols, &cfg);

        self.check_cancelled()?;
        policy::resolve(
            &mut arena,
            symbols,
            &cfg,
            self.preconditions.as_ref(),
            self.preserve_return_type.as_ref(),
            self.require_cancellation.as_ref(),
        );

        let plan = plan::freeze(&arena, symbols);
        let summary = summarize(&arena, &diagnostics);
        if self.verbose {
            report(&diagnostics, &summary);
        }
        Ok(AnalysisOutcome {
            plan,
            diagnostics,
            summary,
        })
    }

    /// Applies the conversion predicate once per function: attribute- or
    /// pattern-excluded functions resolve `Ignore`, seed-pattern matches and
    /// bodies holding a reference with a declared counterpart resolve
    /// `ToAsync`, everything else defers to propagation.
    fn seed_decision(
        &self,
        symbols: &dyn Symbols,
        cfg: &CompiledConfig,
        node: &FunctionNode,
    ) -> Decision {
        let sig = symbols.signature(node.sig);
        if let Some(seed) = &self.seed {
            return seed(sig);
        }
        let name = full_name(symbols, node.sig);
        let excluded = cfg.ignore_matches(&name)
            || symbols
                .attributes(node.sig)
                .iter()
                .any(|a| cfg.ignore_attributes.contains(a));
        if excluded {
            return Decision::Ignore;
        }
        if cfg.seed_matches(&name) {
            return Decision::ToAsync;
        }
        let has_declared_counterpart = node.references.iter().any(|r| {
            r.ignore.is_none() && r.candidates.iter().any(|c| !c.synthetic)
        });
        if has_declared_counterpart {
            return Decision::ToAsync;
        }
        Decision::Unknown
    }

    fn check_cancelled(&self) -> Result<(), AnalysisError> {
        if CANCELLED.load(Ordering::Relaxed) {
            Err(AnalysisError::Cancelled)
        } else {
            Ok(())
        }
    }
}

fn summarize(arena: &FunctionArena, diagnostics: &[Diagnostic]) -> AnalysisSummary {
    let mut summary = AnalysisSummary {
        functions: arena.len(),
        diagnostics: diagnostics.len(),
        ..AnalysisSummary::default()
    };
    for id in arena.ids() {
        let node = arena.node(id);
        match node.decision() {
            Decision::ToAsync => summary.converted += 1,
            Decision::Ignore => summary.ignored += 1,
            Decision::Unknown | Decision::Unseeded => summary.kept_unknown += 1,
        }
        summary.references += node.references.len();
        summary.ignored_references += node
            .references
            .iter()
            .filter(|r| r.ignore.is_some())
            .count();
    }
    summary
}

fn report(diagnostics: &[Diagnostic], summary: &AnalysisSummary) {
    for diagnostic in diagnostics {
        eprintln!("{}", diagnostic.render());
    }
    eprintln!(
        "{} {} functions analyzed: {} to convert, {} ignored, {} kept unconverted",
        "asyncify:".bold(),
        summary.functions,
        summary.converted.to_string().green(),
        summary.ignored,
        summary.kept_unknown
    );
}
