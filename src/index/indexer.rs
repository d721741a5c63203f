use crate::error::Result;
use crate::index::plan::IndexPlan;
use crate::index::range::correct_range;
use crate::index::runner::{ProcessRunner, ToolRunner};
use crate::index::tool::ToolLocator;
use crate::index::types::{ColorRange, IndexKind, IndexOutcome, IndexingPolicy};
use crate::utils::LogSink;
use std::path::Path;

/// Produces or reuses index artifacts for one indexer kind
pub struct Indexer<R: ToolRunner = ProcessRunner> {
    kind: IndexKind,
    runner: R,
    locator: ToolLocator,
}

impl Indexer<ProcessRunner> {
    /// Indexer running the real tool, searching the process PATH
    pub fn new(kind: IndexKind) -> Self {
        Self::with_runner(kind, ProcessRunner, ToolLocator::from_env())
    }

    /// MPEG-2 sources through d2vwitch
    pub fn d2vwitch() -> Self {
        Self::new(IndexKind::D2v)
    }

    /// Generic containers through ffmsindex
    pub fn ffmsindex() -> Self {
        Self::new(IndexKind::FfIndex)
    }
}

impl<R: ToolRunner> Indexer<R> {
    pub fn with_runner(kind: IndexKind, runner: R, locator: ToolLocator) -> Self {
        Self {
            kind,
            runner,
            locator,
        }
    }

    pub fn kind(&self) -> IndexKind {
        self.kind
    }

    /// Return a usable artifact for `source`, running the tool if needed.
    ///
    /// Bad input raises before anything is written. A tool that fails or
    /// produces no file yields [`IndexOutcome::Failed`] with the reason in `log`.
    pub fn index(
        &self,
        source: &Path,
        policy: &IndexingPolicy,
        log: &mut LogSink,
    ) -> Result<IndexOutcome> {
        let tool_name = self.kind.tool_name();
        log.info(format!("indexing, using {} for: {}", tool_name, source.display()));

        let range = if self.kind.needs_range_correction() {
            Some(ColorRange::from_tool_options(&policy.tool_options)?)
        } else {
            None
        };

        let plan = IndexPlan::prepare(self.kind, source, policy, &self.locator, log)?;

        if !plan.needs_indexing {
            if let Some(range) = range {
                correct_range(&plan.artifact, range, log);
            }
            return Ok(IndexOutcome::Reused(plan.artifact));
        }

        let command = self
            .kind
            .command(&plan.tool, &policy.tool_options, &plan.source, &plan.artifact);
        log.info(format!("{} command line: {}", tool_name, command));

        let succeeded = self.runner.run(&command, log);
        if !succeeded || !plan.artifact.is_file() {
            if succeeded {
                log.error(format!(
                    "{} exited successfully but wrote no file at {}",
                    tool_name,
                    plan.artifact.display()
                ));
            }
            log.error(format!(
                "error while indexing {} with {}",
                plan.source.display(),
                tool_name
            ));
            return Ok(IndexOutcome::Failed);
        }

        plan.remember(log);
        if let Some(range) = range {
            correct_range(&plan.artifact, range, log);
        }
        log.info(format!("created {} file: {}", self.kind, plan.artifact.display()));
        Ok(IndexOutcome::Created(plan.artifact))
    }
}
