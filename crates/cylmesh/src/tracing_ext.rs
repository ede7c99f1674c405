//! Tracing helpers for stack generation.
//!
//! Enable output by installing a subscriber, e.g.
//! `RUST_LOG=cylmesh=debug` with `tracing_subscriber::EnvFilter`.
//!
//! # Targets
//!
//! - `cylmesh::timing`: per-operation elapsed time
//! - `cylmesh::stack`: stack layout dumps
//! - `cylmesh::io`: artifact reads and writes

use std::path::Path;
use std::time::Instant;
use tracing::{Span, debug, info, warn};

use crate::stack::StackSpec;

/// A performance timer that logs duration on drop.
///
/// ```rust,ignore
/// let _timer = OperationTimer::new("create_mesh");
/// // ... do work ...
/// // logs elapsed_ms at info level when dropped
/// ```
pub struct OperationTimer {
    name: &'static str,
    start: Instant,
    span: Span,
}

impl OperationTimer {
    /// Create a new operation timer.
    pub fn new(name: &'static str) -> Self {
        let span = tracing::info_span!("stack_operation", operation = name);
        debug!(target: "cylmesh::timing", operation = name, "Starting operation");
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Create a timer carrying the stack dimensions.
    pub fn with_layers(name: &'static str, layers: usize) -> Self {
        let span = tracing::info_span!("stack_operation", operation = name, layers = layers);
        debug!(
            target: "cylmesh::timing",
            operation = name,
            layers = layers,
            "Starting operation"
        );
        Self {
            name,
            start: Instant::now(),
            span,
        }
    }

    /// Get the elapsed time.
    pub fn elapsed_ms(&self) -> f64 {
        self.start.elapsed().as_secs_f64() * 1000.0
    }

    /// Get the span for this timer.
    pub fn span(&self) -> &Span {
        &self.span
    }
}

impl Drop for OperationTimer {
    fn drop(&mut self) {
        let elapsed_ms = self.elapsed_ms();
        info!(
            target: "cylmesh::timing",
            operation = self.name,
            elapsed_ms = format!("{:.2}", elapsed_ms),
            "Operation completed"
        );
    }
}

/// Log the layout of a validated stack at debug level.
pub fn log_stack(spec: &StackSpec) {
    let names = spec.names();
    for (i, layer) in spec.layers().iter().enumerate() {
        debug!(
            target: "cylmesh::stack",
            layer = i + 1,
            name = %names.volumes[i],
            thickness = layer.thickness,
            subdivisions = ?layer.subdivisions.specified(),
            "Layer"
        );
    }
    debug!(
        target: "cylmesh::stack",
        radius = spec.radius(),
        mesh_length = spec.mesh_length(),
        total_height = spec.total_height(),
        surfaces = names.surfaces.len(),
        volumes = names.volumes.len(),
        "Stack layout"
    );
}

/// Log a file I/O operation.
pub fn log_io_operation(operation: &str, path: &Path, bytes: Option<u64>, success: bool) {
    if success {
        info!(
            target: "cylmesh::io",
            operation = operation,
            path = path.display().to_string(),
            bytes = bytes.unwrap_or(0),
            "I/O operation completed"
        );
    } else {
        warn!(
            target: "cylmesh::io",
            operation = operation,
            path = path.display().to_string(),
            "I/O operation failed"
        );
    }
}
