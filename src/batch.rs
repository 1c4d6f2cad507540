use std::fs;
use std::path::{Path, PathBuf};

use serde::Serialize;
use tracing::debug;

use crate::convert;
use crate::discovery;
use crate::error::ConvertError;

/// Explicit configuration for one batch run. Everything is passed here;
/// nothing is pulled from the environment or process-wide state.
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// Directory searched recursively for log files. Must exist.
    pub input_dir: PathBuf,
    /// Root for the mirrored CSV tree. Created as needed.
    pub output_dir: PathBuf,
    /// Glob matched against file names during discovery.
    pub pattern: String,
    /// Rewrite CSVs that already exist.
    pub overwrite: bool,
    /// Report what would be done without reading or writing anything.
    pub dry_run: bool,
}

impl BatchOptions {
    /// Matches both plain and compressed log variants.
    pub const DEFAULT_PATTERN: &'static str = "*.log*";

    pub fn new(input_dir: impl Into<PathBuf>, output_dir: impl Into<PathBuf>) -> Self {
        Self {
            input_dir: input_dir.into(),
            output_dir: output_dir.into(),
            pattern: Self::DEFAULT_PATTERN.to_string(),
            overwrite: false,
            dry_run: false,
        }
    }
}

/// Per-file result of a conversion attempt.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "status", rename_all = "kebab-case")]
pub enum ConversionStatus {
    Converted {
        events: usize,
        malformed_lines: usize,
    },
    SkippedExists,
    DryRun,
    Failed {
        error: String,
    },
}

/// One immutable record per input file; collected, never mutated.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConversionOutcome {
    pub source: PathBuf,
    pub dest: PathBuf,
    #[serde(flatten)]
    pub status: ConversionStatus,
}

impl ConversionOutcome {
    pub(crate) fn new(source: &Path, dest: &Path, status: ConversionStatus) -> Self {
        Self {
            source: source.to_path_buf(),
            dest: dest.to_path_buf(),
            status,
        }
    }
}

/// Aggregated result of one batch invocation, in discovery order.
#[derive(Debug, Clone, Default, Serialize)]
pub struct BatchSummary {
    pub outcomes: Vec<ConversionOutcome>,
}

impl BatchSummary {
    pub fn discovered(&self) -> usize {
        self.outcomes.len()
    }

    pub fn converted(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Converted { .. }))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::SkippedExists))
    }

    pub fn planned(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::DryRun))
    }

    pub fn failed(&self) -> usize {
        self.count(|s| matches!(s, ConversionStatus::Failed { .. }))
    }

    pub fn has_failures(&self) -> bool {
        self.failed() > 0
    }

    fn count(&self, pred: impl Fn(&ConversionStatus) -> bool) -> usize {
        self.outcomes.iter().filter(|o| pred(&o.status)).count()
    }
}

/// Convert every log under `input_dir` matching the pattern, mirroring the
/// directory structure under `output_dir`.
///
/// Every discovered file yields exactly one outcome; a broken file never
/// stops the loop. The only errors returned are a missing input root and an
/// invalid pattern, both of which leave nothing to iterate.
pub fn batch_parse(options: &BatchOptions) -> Result<BatchSummary, ConvertError> {
    let input_root = fs::canonicalize(&options.input_dir)
        .map_err(|_| ConvertError::DirectoryNotFound(options.input_dir.clone()))?;
    let logs = discovery::discover_logs(&input_root, &options.pattern)?;
    debug!(
        count = logs.len(),
        root = %input_root.display(),
        "discovered log files"
    );

    let mut summary = BatchSummary::default();
    for source in &logs {
        let dest = destination_path(source, &input_root, &options.output_dir);
        summary.outcomes.push(convert::convert_file(
            source,
            &dest,
            options.overwrite,
            options.dry_run,
        ));
    }
    Ok(summary)
}

/// Mirror `source` relative to the input root under the output root, with
/// the compression suffix stripped and the log extension swapped for `.csv`.
/// Deterministic, so idempotent re-runs target the same destination.
pub fn destination_path(source: &Path, input_root: &Path, output_root: &Path) -> PathBuf {
    let relative = match source.strip_prefix(input_root) {
        Ok(relative) => relative,
        Err(_) => source.file_name().map(Path::new).unwrap_or(source),
    };

    let name = relative
        .file_name()
        .and_then(|n| n.to_str())
        .unwrap_or_default();
    let mut stem = name;
    for suffix in [".gz", ".zst"] {
        if let Some(stripped) = stem.strip_suffix(suffix) {
            stem = stripped;
            break;
        }
    }
    if let Some((base, _ext)) = stem.rsplit_once('.') {
        if !base.is_empty() {
            stem = base;
        }
    }

    output_root
        .join(relative.parent().unwrap_or(Path::new("")))
        .join(format!("{stem}.csv"))
}
