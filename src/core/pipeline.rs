//! End-to-end run: read → build → extract → write
//!
//! Each stage consumes only the previous stage's output. A fatal error is
//! reported together with the stage it happened in.

use std::fmt;
use std::path::PathBuf;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;
use std::time::{Duration, Instant};

use log::info;
use thiserror::Error;

use crate::core::builder::{BuildStats, GraphBuilder};
use crate::core::components::{ComponentExtractor, Connectivity, ExtractionStats};
use crate::core::error::Error;
use crate::core::output::{
    check_overwrite_permission, write_graph_to, OutputOptions, OutputTarget, OverwriteBehavior,
};
use crate::core::source::PbfSource;

/// Pipeline stages in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Read,
    Build,
    Extract,
    Write,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Read => "read",
            Stage::Build => "build",
            Stage::Extract => "extract",
            Stage::Write => "write",
        };
        f.write_str(name)
    }
}

/// A fatal error and the stage that raised it
#[derive(Error, Debug)]
#[error("{stage} stage failed: {source}")]
pub struct PipelineError {
    pub stage: Stage,
    #[source]
    pub source: Error,
}

trait StageResultExt<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError>;
}

impl<T> StageResultExt<T> for crate::core::error::Result<T> {
    fn at(self, stage: Stage) -> Result<T, PipelineError> {
        self.map_err(|source| PipelineError { stage, source })
    }
}

/// Stage callback function type, called as each stage starts
pub type StageCallback = Arc<dyn Fn(Stage) + Send + Sync>;

/// Options for a pipeline run
#[derive(Clone, Default)]
pub struct PipelineOptions {
    pub connectivity: Connectivity,
    pub output: OutputOptions,
    /// Optional stage-start callback
    pub progress: Option<StageCallback>,
    /// Optional cooperative cancellation flag for the extraction stage
    pub cancel: Option<Arc<AtomicBool>>,
}

impl fmt::Debug for PipelineOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PipelineOptions")
            .field("connectivity", &self.connectivity)
            .field("output", &self.output)
            .field("progress", &self.progress.is_some())
            .field("cancel", &self.cancel.is_some())
            .finish()
    }
}

/// Summary of a successful run
#[derive(Debug, Clone, Default)]
pub struct PipelineReport {
    pub input: PathBuf,
    pub build: BuildStats,
    pub extraction: ExtractionStats,
    pub elapsed: Duration,
}

/// Run the full conversion from a PBF file to a JSON graph
pub fn run_pipeline(
    input: &std::path::Path,
    output: &OutputTarget,
    options: &PipelineOptions,
) -> Result<PipelineReport, PipelineError> {
    let start = Instant::now();
    let notify = |stage: Stage| {
        if let Some(ref progress) = options.progress {
            progress(stage);
        }
    };

    // Refuse an existing output before any work is done
    if let OutputTarget::File(path) = output {
        if options.output.overwrite == OverwriteBehavior::NeverOverwrite {
            check_overwrite_permission(path, options.output.overwrite).at(Stage::Write)?;
        }
    }

    notify(Stage::Read);
    let source = PbfSource::open(input).at(Stage::Read)?;
    let mut builder = GraphBuilder::new();
    source.for_each_record(|record| builder.push(record)).at(Stage::Read)?;

    notify(Stage::Build);
    let built = builder.finish().at(Stage::Build)?;

    notify(Stage::Extract);
    let mut extractor = ComponentExtractor::new(&built.table).with_connectivity(options.connectivity);
    if let Some(ref flag) = options.cancel {
        extractor = extractor.with_cancel_flag(flag);
    }
    let extraction = extractor.extract().at(Stage::Extract)?;

    notify(Stage::Write);
    write_graph_to(output, &extraction.table, &options.output).at(Stage::Write)?;

    let elapsed = start.elapsed();
    info!("Pipeline finished in {:.2}s", elapsed.as_secs_f64());

    Ok(PipelineReport {
        input: input.to_path_buf(),
        build: built.stats,
        extraction: extraction.stats,
        elapsed,
    })
}
