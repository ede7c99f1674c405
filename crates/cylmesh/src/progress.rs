//! Progress reporting for mesh generation.
//!
//! Generation runs through a fixed sequence of stages. A [`ProgressCallback`]
//! attached to [`MeshOptions`](crate::MeshOptions) is invoked once as each
//! stage begins.
//!
//! ```ignore
//! use std::sync::Arc;
//! use cylmesh::{MeshOptions, progress::Progress};
//!
//! let options = MeshOptions::default().with_progress(Arc::new(|p: &Progress| {
//!     eprintln!("[{}/{}] {}", p.current, p.total, p.message);
//! }));
//! ```

use std::sync::Arc;
use std::time::{Duration, Instant};

/// Stages of one generation call, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    /// Validating parameters and assigning names.
    Validate,
    /// Writing the geometry script.
    WriteGeometry,
    /// Starting the engine.
    StartEngine,
    /// Engine building and meshing the geometry.
    Mesh,
    /// Collecting statistics into the result.
    Summarize,
}

impl Stage {
    /// Number of stages.
    pub const COUNT: u64 = 5;

    /// 0-based position of this stage.
    pub fn index(self) -> u64 {
        self as u64
    }

    /// Human-readable description.
    pub fn message(self) -> &'static str {
        match self {
            Stage::Validate => "Validating stack parameters",
            Stage::WriteGeometry => "Writing geometry script",
            Stage::StartEngine => "Starting meshing engine",
            Stage::Mesh => "Meshing geometry",
            Stage::Summarize => "Summarizing mesh",
        }
    }
}

/// Progress information passed to callbacks.
#[derive(Debug, Clone)]
pub struct Progress {
    /// Current step (0-based).
    pub current: u64,

    /// Total number of steps.
    pub total: u64,

    /// Human-readable message describing the current stage.
    pub message: String,

    /// Elapsed time since generation started.
    pub elapsed: Duration,
}

impl Progress {
    /// Create a new progress report.
    pub fn new(current: u64, total: u64, message: impl Into<String>) -> Self {
        Self {
            current,
            total,
            message: message.into(),
            elapsed: Duration::ZERO,
        }
    }

    /// Get progress as a fraction (0.0 to 1.0).
    #[inline]
    pub fn fraction(&self) -> f64 {
        if self.total == 0 {
            0.0
        } else {
            (self.current as f64) / (self.total as f64)
        }
    }

    /// Get progress as a percentage (0 to 100).
    #[inline]
    pub fn percent(&self) -> u32 {
        (self.fraction() * 100.0).round() as u32
    }
}

/// Callback function for progress reporting.
pub type ProgressCallback = Arc<dyn Fn(&Progress) + Send + Sync>;

/// Emits stage reports to an optional callback.
pub(crate) struct StageReporter<'a> {
    callback: Option<&'a ProgressCallback>,
    start: Instant,
}

impl<'a> StageReporter<'a> {
    pub(crate) fn new(callback: Option<&'a ProgressCallback>) -> Self {
        Self {
            callback,
            start: Instant::now(),
        }
    }

    pub(crate) fn enter(&self, stage: Stage) {
        tracing::debug!(target: "cylmesh::progress", stage = stage.message(), "Stage");
        if let Some(callback) = self.callback {
            let mut progress = Progress::new(stage.index(), Stage::COUNT, stage.message());
            progress.elapsed = self.start.elapsed();
            callback(&progress);
        }
    }
}
