//! Set Executor
//!
//! Drives one set execution:
//! `Validating -> pre-script -> Query[0..n] -> post-script -> Completed`,
//! leaving early on the first fatal error.
//!
//! Queries run strictly in declared order. Each sees the saved results
//! exactly as the queries before it left them.

use std::collections::HashMap;
use std::sync::Arc;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, warn};

use super::context::ExecutionContext;
use super::errors::{ExecError, ExecResult};
use super::result::{QueryResult, SetResult};
use super::runner::{check_step, QueryRunner, Step};
use crate::definition::{MaskLookup, RegexLookup, Script, ScriptLookup, Set};
use crate::masking::MaskProcessor;
use crate::observability::{Event, ExecMetrics};
use crate::params::ParamValidator;
use crate::placeholder::SavedResults;
use crate::store::SessionPool;

/// Per-execution switches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
pub struct ExecOptions {
    /// Return the substituted pipelines instead of running them
    #[serde(default)]
    pub explain: bool,
}

impl ExecOptions {
    pub fn explain() -> Self {
        Self { explain: true }
    }
}

/// Executes sets against a pooled document store.
///
/// Shareable behind `Arc`; every execution owns its variables and saved
/// results.
pub struct SetExecutor {
    pool: SessionPool,
    regexes: Arc<dyn RegexLookup>,
    scripts: Arc<dyn ScriptLookup>,
    masks: Arc<dyn MaskLookup>,
    metrics: Arc<ExecMetrics>,
}

impl SetExecutor {
    pub fn new(
        pool: SessionPool,
        regexes: Arc<dyn RegexLookup>,
        scripts: Arc<dyn ScriptLookup>,
        masks: Arc<dyn MaskLookup>,
    ) -> Self {
        Self {
            pool,
            regexes,
            scripts,
            masks,
            metrics: Arc::new(ExecMetrics::new()),
        }
    }

    /// Share a metrics registry with other components
    pub fn with_metrics(mut self, metrics: Arc<ExecMetrics>) -> Self {
        self.metrics = metrics;
        self
    }

    pub fn metrics(&self) -> &ExecMetrics {
        &self.metrics
    }

    pub fn pool(&self) -> &SessionPool {
        &self.pool
    }

    /// Execute `set` and fold any error into an error result
    pub async fn execute(
        &self,
        set: &Set,
        vars: HashMap<String, String>,
        ctx: &ExecutionContext,
        options: &ExecOptions,
    ) -> SetResult {
        self.try_execute(set, vars, ctx, options).await.into()
    }

    /// Execute `set`, keeping the structured error
    pub async fn try_execute(
        &self,
        set: &Set,
        vars: HashMap<String, String>,
        ctx: &ExecutionContext,
        options: &ExecOptions,
    ) -> ExecResult<Vec<QueryResult>> {
        self.metrics.increment_sets_executed();
        info!(
            event = Event::SetExecStart.as_str(),
            set = %set.name,
            request_id = %ctx.request_id,
            explain = options.explain
        );

        let outcome = self.run_set(set, vars, ctx, options).await;

        match &outcome {
            Ok(results) => info!(
                event = Event::SetExecComplete.as_str(),
                set = %set.name,
                request_id = %ctx.request_id,
                returned = results.len(),
                elapsed_ms = ctx.elapsed_ms() as u64
            ),
            Err(e) => {
                self.metrics.increment_sets_failed();
                warn!(
                    event = Event::SetExecAborted.as_str(),
                    set = %set.name,
                    request_id = %ctx.request_id,
                    code = e.code(),
                    query = e.query().unwrap_or(""),
                    error = %e
                );
            }
        }

        outcome
    }

    async fn run_set(
        &self,
        set: &Set,
        mut vars: HashMap<String, String>,
        ctx: &ExecutionContext,
        options: &ExecOptions,
    ) -> ExecResult<Vec<QueryResult>> {
        set.validate()?;
        if !set.enabled {
            return Err(ExecError::SetDisabled(set.name.clone()));
        }
        let pre_script = self.script(set.pre_script())?;
        let post_script = self.script(set.post_script())?;
        for script in pre_script.iter().chain(post_script.iter()) {
            check_step(&Step::from(script))?;
        }
        ParamValidator::new(self.regexes.as_ref()).validate(&set.params, &mut vars)?;

        let runner = QueryRunner::new(&self.pool, ctx, options.explain);
        let masker = MaskProcessor::new(self.masks.as_ref());
        let mut saved = SavedResults::new();
        let mut results = Vec::new();

        if let Some(script) = &pre_script {
            self.run_script(&runner, script, &vars, &mut saved, ctx).await?;
        }

        for query in &set.queries {
            ctx.check()?;

            match runner.run(&Step::from(query), &vars, &mut saved).await {
                Ok(mut docs) => {
                    self.metrics.increment_queries_executed();
                    info!(
                        event = Event::QueryComplete.as_str(),
                        request_id = %ctx.request_id,
                        query = %query.name,
                        docs = docs.len()
                    );

                    if query.return_results {
                        if !options.explain {
                            masker
                                .mask_documents(&query.collection, &mut docs)
                                .map_err(|source| ExecError::Mask {
                                    query: query.name.clone(),
                                    source,
                                })?;
                        }
                        results.push(QueryResult::new(query.name.clone(), docs));
                    }
                }
                Err(e) => {
                    self.metrics.increment_queries_failed();
                    if e.is_fatal() || !query.continue_on_error {
                        warn!(
                            event = Event::QueryFailed.as_str(),
                            request_id = %ctx.request_id,
                            query = %query.name,
                            code = e.code(),
                            error = %e
                        );
                        return Err(e);
                    }

                    self.metrics.increment_queries_skipped();
                    warn!(
                        event = Event::QuerySkippedOnError.as_str(),
                        request_id = %ctx.request_id,
                        query = %query.name,
                        code = e.code(),
                        error = %e
                    );
                }
            }
        }

        if let Some(script) = &post_script {
            self.run_script(&runner, script, &vars, &mut saved, ctx).await?;
        }

        Ok(results)
    }

    fn script(&self, name: Option<&str>) -> ExecResult<Option<Script>> {
        Ok(name.map(|n| self.scripts.script_by_name(n)).transpose()?)
    }

    /// Scripts never return output and never continue past a failure
    async fn run_script(
        &self,
        runner: &QueryRunner<'_>,
        script: &Script,
        vars: &HashMap<String, String>,
        saved: &mut SavedResults,
        ctx: &ExecutionContext,
    ) -> ExecResult<()> {
        ctx.check()?;
        let docs: Vec<Value> = runner.run(&Step::from(script), vars, saved).await?;
        info!(
            event = Event::ScriptComplete.as_str(),
            request_id = %ctx.request_id,
            script = %script.name,
            docs = docs.len()
        );
        Ok(())
    }
}
