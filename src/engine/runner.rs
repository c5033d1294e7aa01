//! Query Runner
//!
//! Runs one step of a set: resolve placeholders, split off a trailing
//! `$save` stage, submit the pipeline through a pooled session and record
//! the raw output under the save key.

use std::collections::HashMap;

use serde_json::{json, Value};

use super::context::ExecutionContext;
use super::errors::{ExecError, ExecResult};
use crate::definition::{
    check_commands, save_key, Command, Query, QueryKind, Script, StageProblem,
};
use crate::placeholder::{substitute_commands, SavedResults};
use crate::store::SessionPool;

/// One executable step, borrowed from a query or a script
#[derive(Debug, Clone, Copy)]
pub struct Step<'a> {
    pub name: &'a str,
    pub kind: QueryKind,
    pub collection: &'a str,
    pub commands: &'a [Command],
}

impl<'a> From<&'a Query> for Step<'a> {
    fn from(query: &'a Query) -> Self {
        Self {
            name: &query.name,
            kind: query.kind,
            collection: &query.collection,
            commands: &query.commands,
        }
    }
}

impl<'a> From<&'a Script> for Step<'a> {
    fn from(script: &'a Script) -> Self {
        Self {
            name: &script.name,
            kind: QueryKind::Pipeline,
            collection: &script.collection,
            commands: &script.commands,
        }
    }
}

/// Runs steps for one execution
pub struct QueryRunner<'a> {
    pool: &'a SessionPool,
    ctx: &'a ExecutionContext,
    explain: bool,
}

impl<'a> QueryRunner<'a> {
    pub fn new(pool: &'a SessionPool, ctx: &'a ExecutionContext, explain: bool) -> Self {
        Self { pool, ctx, explain }
    }

    /// Run `step` and return its raw output.
    ///
    /// On success the output is also recorded in `saved` when the step ends
    /// with a `$save` stage. On failure `saved` is left untouched.
    pub async fn run(
        &self,
        step: &Step<'_>,
        vars: &HashMap<String, String>,
        saved: &mut SavedResults,
    ) -> ExecResult<Vec<Value>> {
        match step.kind {
            QueryKind::Pipeline => self.run_pipeline(step, vars, saved).await,
        }
    }

    async fn run_pipeline(
        &self,
        step: &Step<'_>,
        vars: &HashMap<String, String>,
        saved: &mut SavedResults,
    ) -> ExecResult<Vec<Value>> {
        let resolved = substitute_commands(step.commands, vars, saved)
            .map_err(|source| ExecError::substitution(step.name, source))?;

        let (pipeline, save_key) = split_save(step.name, resolved)?;
        if pipeline.is_empty() {
            return Err(stage_error(step.name, StageProblem::NoCommands));
        }

        let docs = if self.explain {
            vec![explain_document(step.collection, &pipeline, save_key.as_deref())]
        } else {
            let session = self
                .ctx
                .run(self.pool.acquire())
                .await?
                .map_err(|source| ExecError::store(step.name, source))?;
            self.ctx
                .run(session.aggregate(step.collection, &pipeline))
                .await?
                .map_err(|source| ExecError::store(step.name, source))?
        };

        if let Some(key) = save_key {
            saved.insert(key, docs.clone());
        }

        Ok(docs)
    }
}

/// Check a step's unsubstituted commands without running anything
pub fn check_step(step: &Step<'_>) -> ExecResult<()> {
    match step.kind {
        QueryKind::Pipeline => {
            check_commands(step.commands).map_err(|problem| stage_error(step.name, problem))
        }
    }
}

/// Remove a trailing `$save` stage, returning the remaining pipeline and
/// the save key.
pub fn split_save(
    query: &str,
    mut commands: Vec<Command>,
) -> ExecResult<(Vec<Command>, Option<String>)> {
    let key = save_key(&commands)
        .map_err(|problem| stage_error(query, problem))?
        .map(str::to_string);
    if key.is_some() {
        commands.pop();
    }
    Ok((commands, key))
}

fn stage_error(query: &str, problem: StageProblem) -> ExecError {
    ExecError::invalid_query(query, problem.describe(query))
}

fn explain_document(collection: &str, pipeline: &[Command], save_key: Option<&str>) -> Value {
    let mut doc = json!({
        "collection": collection,
        "pipeline": pipeline,
    });
    if let (Some(key), Some(map)) = (save_key, doc.as_object_mut()) {
        map.insert("save".to_string(), Value::String(key.to_string()));
    }
    doc
}
