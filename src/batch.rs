//! File patch orchestrator: applies a batch of function replacements to
//! disk, one file at a time.
//!
//! Each file is read at most once and written at most once per batch,
//! however many functions it has requests for. Every failure mode is
//! captured as a [`PatchOutcome`] rather than propagated; nothing that goes
//! wrong with one file aborts the rest of the batch.

use crate::engine::replace_function;
use std::fmt;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

/// One function replacement aimed at one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatchRequest {
    /// Path to the target file
    pub file: PathBuf,
    /// Name of the function whose definition is replaced
    pub function: String,
    /// Literal text substituted for the old definition; expected to begin
    /// with an equivalent declaration line
    pub replacement: String,
}

impl PatchRequest {
    pub fn new(
        file: impl Into<PathBuf>,
        function: impl Into<String>,
        replacement: impl Into<String>,
    ) -> Self {
        Self {
            file: file.into(),
            function: function.into(),
            replacement: replacement.into(),
        }
    }
}

/// An ordered sequence of requests.
///
/// Insertion order is load-bearing twice over: files are processed in the
/// order first referenced, and requests targeting the same file are applied
/// sequentially in insertion order, each seeing the output of the previous
/// one. Edits on the same file are never computed against stale text.
#[derive(Debug, Clone, Default)]
pub struct PatchBatch {
    requests: Vec<PatchRequest>,
}

impl PatchBatch {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_requests(requests: Vec<PatchRequest>) -> Self {
        Self { requests }
    }

    pub fn push(&mut self, request: PatchRequest) {
        self.requests.push(request);
    }

    pub fn requests(&self) -> &[PatchRequest] {
        &self.requests
    }

    pub fn len(&self) -> usize {
        self.requests.len()
    }

    pub fn is_empty(&self) -> bool {
        self.requests.is_empty()
    }

    /// Distinct file paths in first-reference order.
    fn files_in_order(&self) -> Vec<&Path> {
        let mut files: Vec<&Path> = Vec::new();
        for request in &self.requests {
            if !files.contains(&request.file.as_path()) {
                files.push(request.file.as_path());
            }
        }
        files
    }
}

/// Terminal status of one (file, function) patch attempt.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatchStatus {
    /// Definition located, replaced, and persisted
    Updated,
    /// File read fine but no declaration matched the function name
    NotFound,
    /// Target path does not exist; no read or write was attempted
    FileMissing,
    /// File exists but could not be read as text; never opened for writing
    Unreadable,
    /// Replacement succeeded in memory but persisting failed; the original
    /// file content is still intact
    Unwritable,
}

impl PatchStatus {
    pub fn is_success(self) -> bool {
        matches!(self, PatchStatus::Updated)
    }
}

impl fmt::Display for PatchStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            PatchStatus::Updated => "updated",
            PatchStatus::NotFound => "not-found",
            PatchStatus::FileMissing => "file-missing",
            PatchStatus::Unreadable => "unreadable",
            PatchStatus::Unwritable => "unwritable",
        };
        f.write_str(label)
    }
}

/// Immutable record of what happened to one request.
#[derive(Debug, Clone, PartialEq, Eq)]
#[must_use = "PatchOutcome should be checked for success/failure"]
pub struct PatchOutcome {
    pub file: PathBuf,
    pub function: String,
    pub status: PatchStatus,
}

impl fmt::Display for PatchOutcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}: function {} in {}",
            self.status,
            self.function,
            self.file.display()
        )
    }
}

/// Apply a batch of patch requests to disk.
///
/// One outcome per request, in batch order per file. Never returns an
/// error: every failure is recorded as a status.
pub fn apply_batch(batch: &PatchBatch) -> Vec<PatchOutcome> {
    run_batch(batch, true)
}

/// Evaluate a batch without writing anything back.
///
/// Outcome semantics mirror [`apply_batch`]: `Updated` means the request
/// would change the file if applied.
pub fn check_batch(batch: &PatchBatch) -> Vec<PatchOutcome> {
    run_batch(batch, false)
}

fn run_batch(batch: &PatchBatch, persist: bool) -> Vec<PatchOutcome> {
    let mut outcomes = Vec::with_capacity(batch.len());

    for file in batch.files_in_order() {
        let requests = batch.requests.iter().filter(|r| r.file.as_path() == file);

        if !file.exists() {
            outcomes.extend(requests.map(|r| outcome(r, PatchStatus::FileMissing)));
            continue;
        }

        let original = match fs::read_to_string(file) {
            Ok(content) => content,
            Err(_) => {
                outcomes.extend(requests.map(|r| outcome(r, PatchStatus::Unreadable)));
                continue;
            }
        };

        // Sequential application: each request sees the text produced by
        // the previous one, so spans are never computed against stale text.
        let mut text = original.clone();
        let mut file_outcomes = Vec::new();
        for request in requests {
            match replace_function(&text, &request.function, &request.replacement) {
                Some(next) => {
                    text = next;
                    file_outcomes.push(outcome(request, PatchStatus::Updated));
                }
                None => file_outcomes.push(outcome(request, PatchStatus::NotFound)),
            }
        }

        // At most one write per file, and only when something changed.
        if persist && text != original && atomic_write(file, text.as_bytes()).is_err() {
            for o in &mut file_outcomes {
                if o.status == PatchStatus::Updated {
                    o.status = PatchStatus::Unwritable;
                }
            }
        }

        outcomes.extend(file_outcomes);
    }

    outcomes
}

fn outcome(request: &PatchRequest, status: PatchStatus) -> PatchOutcome {
    PatchOutcome {
        file: request.file.clone(),
        function: request.function.clone(),
        status,
    }
}

/// Atomic file write: tempfile + fsync + rename.
///
/// The tempfile lives in the target's directory so the rename stays on one
/// filesystem. A failure at any step leaves the original file untouched.
fn atomic_write(path: &Path, content: &[u8]) -> std::io::Result<()> {
    let parent = match path.parent() {
        Some(p) if !p.as_os_str().is_empty() => p,
        _ => Path::new("."),
    };

    let mut temp = tempfile::NamedTempFile::new_in(parent)?;
    temp.write_all(content)?;
    temp.as_file().sync_all()?;
    temp.persist(path).map_err(|e| e.error)?;

    Ok(())
}
