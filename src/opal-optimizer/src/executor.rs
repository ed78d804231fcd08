//! Rule trait, batches, and the fixed-point executor.

use std::sync::Arc;

use common_display::indent;
use common_error::{ensure, OpalResult};
use opal_core::tree::TreeNode;
use opal_logical::LogicalPlan;
use tracing::{debug, warn};

/// A single rewrite rule over logical plans.
///
/// A rule is total: where its pattern does not match it returns the input
/// unchanged. It must be sound (semantics-preserving) and must not grow the
/// plan without bound, since the default batch iterates rules to a fixed
/// point. A rule never invents `ExpressionId`s and never conflates two
/// distinct ones.
pub trait Rule: Send + Sync {
    /// Get the name of this rule.
    fn name(&self) -> &'static str;

    /// Get a description of what this rule does.
    fn description(&self) -> &'static str {
        "No description available"
    }

    /// Apply this rule to the plan, returning a potentially transformed plan.
    fn apply(&self, plan: Arc<LogicalPlan>) -> OpalResult<Transformed>;
}

/// The result of applying a rule.
#[derive(Debug, Clone)]
pub struct Transformed {
    /// The (potentially transformed) plan.
    pub plan: Arc<LogicalPlan>,
    /// Whether the plan was actually changed.
    pub changed: bool,
}

impl Transformed {
    /// Create a new transformed result indicating the plan was changed.
    pub fn yes(plan: Arc<LogicalPlan>) -> Self {
        Self {
            plan,
            changed: true,
        }
    }

    /// Create a new transformed result indicating the plan was unchanged.
    pub fn no(plan: Arc<LogicalPlan>) -> Self {
        Self {
            plan,
            changed: false,
        }
    }

    /// Derive the changed flag from pointer identity: tree transforms return
    /// the input `Arc` untouched when nothing matched.
    pub fn from_rewrite(before: &Arc<LogicalPlan>, after: Arc<LogicalPlan>) -> Self {
        let changed = !Arc::ptr_eq(&after, before);
        Self {
            plan: after,
            changed,
        }
    }
}

/// Convergence strategy of a rule batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Apply each rule exactly once, in order.
    Once,
    /// Iterate the rules in order until the plan stops changing, or until
    /// `max_iterations` when bounded.
    FixedPoint {
        /// Iteration cap; `None` iterates until the fixed point.
        max_iterations: Option<usize>,
    },
}

impl Strategy {
    /// Unlimited fixed-point iteration.
    pub const fn unlimited() -> Self {
        Self::FixedPoint {
            max_iterations: None,
        }
    }

    /// Fixed-point iteration bounded by `cap`.
    pub const fn bounded(cap: usize) -> Self {
        Self::FixedPoint {
            max_iterations: Some(cap),
        }
    }
}

/// An ordered group of rules sharing one convergence strategy.
pub struct RuleBatch {
    /// Batch name, used in diagnostics.
    pub name: &'static str,
    /// Convergence strategy.
    pub strategy: Strategy,
    /// Rules, applied in order within one iteration.
    pub rules: Vec<Box<dyn Rule>>,
}

impl RuleBatch {
    /// Create a new batch.
    pub fn new(name: &'static str, strategy: Strategy, rules: Vec<Box<dyn Rule>>) -> Self {
        Self {
            name,
            strategy,
            rules,
        }
    }
}

/// Caller-visible abort predicate, checked between rule applications.
pub type AbortPredicate = Arc<dyn Fn() -> bool + Send + Sync>;

/// Executor configuration.
#[derive(Clone, Default)]
pub struct ExecutorConfig {
    /// Record a `RuleTrace` entry for every rule application that changed the
    /// plan.
    pub trace: bool,
    abort: Option<AbortPredicate>,
}

impl ExecutorConfig {
    /// Enable or disable tracing.
    #[must_use]
    pub fn with_trace(mut self, trace: bool) -> Self {
        self.trace = trace;
        self
    }

    /// Install an abort predicate for cooperative cancellation.
    #[must_use]
    pub fn with_abort(mut self, abort: impl Fn() -> bool + Send + Sync + 'static) -> Self {
        self.abort = Some(Arc::new(abort));
        self
    }

    fn aborted(&self) -> bool {
        self.abort.as_ref().map_or(false, |predicate| predicate())
    }
}

/// A trace entry for a single rule application.
#[derive(Debug, Clone)]
pub struct RuleTrace {
    /// The name of the rule that was applied.
    pub rule_name: String,
    /// The plan before the rule was applied, rendered as a tree.
    pub before: String,
    /// The plan after the rule was applied, rendered as a tree.
    pub after: String,
    /// Whether the rule actually changed the plan.
    pub changed: bool,
}

impl RuleTrace {
    /// Create a new trace entry.
    pub fn new(
        rule_name: impl Into<String>,
        before: impl Into<String>,
        after: impl Into<String>,
        changed: bool,
    ) -> Self {
        Self {
            rule_name: rule_name.into(),
            before: before.into(),
            after: after.into(),
            changed,
        }
    }
}

/// The result of optimization with optional trace information.
#[derive(Debug, Clone)]
pub struct OptimizedPlan {
    /// The final optimized plan.
    pub plan: Arc<LogicalPlan>,
    /// Number of optimization iterations performed across all batches.
    pub iterations: usize,
    /// Number of rule applications that changed the plan.
    pub rules_applied: usize,
    /// False when a bounded batch hit its iteration cap before reaching a
    /// fixed point. The plan is still sound; it may just not be minimal.
    pub converged: bool,
    /// Detailed trace of rule applications (if tracing was enabled).
    pub trace: Vec<RuleTrace>,
}

impl OptimizedPlan {
    /// Format the trace as a human-readable string.
    pub fn format_trace(&self) -> String {
        let mut output = format!(
            "Optimization completed in {} iterations, {} rules applied\n",
            self.iterations, self.rules_applied
        );

        if self.trace.is_empty() {
            output.push_str("  (no trace recorded)\n");
        } else {
            for (i, entry) in self.trace.iter().filter(|t| t.changed).enumerate() {
                output.push_str(&format!(
                    "\n--- Rule {} applied: {} ---\n",
                    i + 1,
                    entry.rule_name
                ));
                output.push_str("Before:\n");
                output.push_str(&indent(&entry.before, "  "));
                output.push_str("\nAfter:\n");
                output.push_str(&indent(&entry.after, "  "));
                output.push('\n');
            }
        }

        output
    }
}

/// Executor that drives ordered rule batches over a plan.
pub struct RulesExecutor {
    batches: Vec<RuleBatch>,
    config: ExecutorConfig,
}

impl RulesExecutor {
    /// Create an executor with the given batches and a default config.
    pub fn new(batches: Vec<RuleBatch>) -> Self {
        Self {
            batches,
            config: ExecutorConfig::default(),
        }
    }

    /// Create an executor with an explicit config.
    pub fn with_config(batches: Vec<RuleBatch>, config: ExecutorConfig) -> Self {
        Self { batches, config }
    }

    /// Get the batches.
    pub fn batches(&self) -> &[RuleBatch] {
        &self.batches
    }

    /// Optimize a resolved plan.
    ///
    /// Fails with `UnresolvedPlan` when the input still contains unresolved
    /// references, with `Cancelled` when the configured abort predicate
    /// fires, and with `InvariantViolation` when a rule breaks the plan.
    pub fn execute(&self, plan: Arc<LogicalPlan>) -> OpalResult<OptimizedPlan> {
        ensure!(
            plan.is_resolved(),
            UnresolvedPlan: "the optimizer requires a fully resolved plan:\n{}",
            plan.pretty_tree()
        );

        let mut state = OptimizedPlan {
            plan,
            iterations: 0,
            rules_applied: 0,
            converged: true,
            trace: Vec::new(),
        };

        for batch in &self.batches {
            self.run_batch(batch, &mut state)?;

            ensure!(
                state.plan.is_resolved(),
                InvariantViolation: "batch `{}` produced an unresolved plan:\n{}",
                batch.name,
                state.plan.pretty_tree()
            );
        }

        Ok(state)
    }

    fn run_batch(&self, batch: &RuleBatch, state: &mut OptimizedPlan) -> OpalResult<()> {
        match batch.strategy {
            Strategy::Once => {
                state.iterations += 1;
                self.run_iteration(batch, state)
            }
            Strategy::FixedPoint { max_iterations } => {
                let mut iteration = 0;
                loop {
                    let before = Arc::clone(&state.plan);
                    self.run_iteration(batch, state)?;
                    iteration += 1;
                    state.iterations += 1;

                    if Arc::ptr_eq(&state.plan, &before) || *state.plan == *before {
                        debug!(
                            batch = batch.name,
                            iterations = iteration,
                            "batch reached fixed point"
                        );
                        return Ok(());
                    }

                    debug!(
                        batch = batch.name,
                        iteration,
                        nodes = state.plan.node_count(),
                        "plan changed\nbefore:\n{}after:\n{}",
                        before.pretty_tree(),
                        state.plan.pretty_tree()
                    );

                    if max_iterations.is_some_and(|cap| iteration >= cap) {
                        warn!(
                            batch = batch.name,
                            cap = iteration,
                            "batch exceeded its iteration cap without reaching a \
                             fixed point; accepting the last plan"
                        );
                        state.converged = false;
                        return Ok(());
                    }
                }
            }
        }
    }

    fn run_iteration(&self, batch: &RuleBatch, state: &mut OptimizedPlan) -> OpalResult<()> {
        for rule in &batch.rules {
            ensure!(
                !self.config.aborted(),
                Cancelled: "abort requested before rule `{}`",
                rule.name()
            );

            let before = Arc::clone(&state.plan);
            let result = rule.apply(Arc::clone(&before))?;

            if result.changed {
                state.rules_applied += 1;
                if self.config.trace {
                    state.trace.push(RuleTrace::new(
                        rule.name(),
                        before.pretty_tree(),
                        result.plan.pretty_tree(),
                        true,
                    ));
                }
            }
            state.plan = result.plan;
        }
        Ok(())
    }
}

impl Default for RulesExecutor {
    /// The shipped configuration: one `"Optimizations"` batch iterating the
    /// full rule library to an unlimited fixed point.
    fn default() -> Self {
        Self::new(vec![RuleBatch::new(
            "Optimizations",
            Strategy::unlimited(),
            crate::rules::default_rules(),
        )])
    }
}
