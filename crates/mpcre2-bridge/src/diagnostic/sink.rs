//! Diagnostic destinations

use crate::diagnostic::{Diagnostic, DiagnosticFormatter, DiagnosticLevel};
use mpcre2_config::{BridgeConfig, DiagnosticFormat};
use std::io::Write;
use std::sync::{Arc, Mutex, PoisonError};

/// Receives every diagnostic the bridge raises
pub trait DiagnosticSink: Send {
    fn emit(&self, diag: &Diagnostic);
}

/// Writes to stderr and forwards a one-line record to the `log` facade
#[derive(Debug, Clone, Copy, Default)]
pub struct StderrSink {
    formatter: DiagnosticFormatter,
    format: DiagnosticFormat,
}

impl StderrSink {
    pub fn new(formatter: DiagnosticFormatter, format: DiagnosticFormat) -> Self {
        Self { formatter, format }
    }

    /// Build the sink described by the configuration
    pub fn from_config(config: &BridgeConfig) -> Box<dyn DiagnosticSink> {
        if !config.diagnostics_enabled() {
            return Box::new(SilentSink);
        }
        Box::new(Self::new(
            DiagnosticFormatter::new(config.color().into()),
            config.diagnostic_format(),
        ))
    }
}

impl DiagnosticSink for StderrSink {
    fn emit(&self, diag: &Diagnostic) {
        match diag.level {
            DiagnosticLevel::Error => log::error!("[{}] {}", diag.code, diag.message),
            DiagnosticLevel::Warning => log::warn!("[{}] {}", diag.code, diag.message),
        }

        match self.format {
            DiagnosticFormat::Human => self.formatter.emit(diag),
            DiagnosticFormat::Json => {
                if let Ok(json) = diag.to_json() {
                    let _ = writeln!(std::io::stderr(), "{}", json);
                }
            }
        }
    }
}

/// Discards diagnostics (`diagnostics.enabled = false`)
#[derive(Debug, Clone, Copy, Default)]
pub struct SilentSink;

impl DiagnosticSink for SilentSink {
    fn emit(&self, diag: &Diagnostic) {
        log::debug!("suppressed [{}] {}", diag.code, diag.message);
    }
}

/// Collects diagnostics in memory; clones share the same buffer
#[derive(Debug, Clone, Default)]
pub struct MemorySink {
    collected: Arc<Mutex<Vec<Diagnostic>>>,
}

impl MemorySink {
    pub fn new() -> Self {
        Self::default()
    }

    /// Snapshot of everything emitted so far
    pub fn diagnostics(&self) -> Vec<Diagnostic> {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Drain the buffer
    pub fn take(&self) -> Vec<Diagnostic> {
        std::mem::take(
            &mut *self
                .collected
                .lock()
                .unwrap_or_else(PoisonError::into_inner),
        )
    }
}

impl DiagnosticSink for MemorySink {
    fn emit(&self, diag: &Diagnostic) {
        self.collected
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(diag.clone());
    }
}
