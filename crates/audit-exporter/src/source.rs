//! Drives one audit log through tailing, pacing and correlation.

use std::time::Duration;

use audit_metrics::ObservationSink;
use audit_tail::{Disposition, LogTailer, ReplayPacer, TailerConfig};
use audit_types::AuditEvent;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info, warn};

use crate::config::SourceSpec;
use crate::engine::CorrelationEngine;
use crate::error::{ExporterError, Result};

/// Outcome of one [`SourceRunner::cycle`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CycleReport {
    /// Events correlated this cycle.
    pub records: usize,
    /// The log was truncated and reread from the start.
    pub truncated: bool,
    /// Replay pacing held back the remaining events.
    pub deferred: bool,
}

/// One audit source with its own offset, pacer and correlation state.
#[derive(Debug)]
pub struct SourceRunner<S> {
    source: SourceSpec,
    tailer: LogTailer,
    pacer: Option<ReplayPacer>,
    engine: CorrelationEngine,
    sink: S,
}

impl<S: ObservationSink> SourceRunner<S> {
    /// Creates a runner for `source` writing to `sink`.
    ///
    /// With `replay` set, events are released no faster than they were
    /// originally logged.
    pub fn new(source: SourceSpec, tailer: TailerConfig, replay: bool, sink: S) -> Self {
        Self {
            tailer: LogTailer::with_config(&source.path, tailer),
            pacer: replay.then(ReplayPacer::new),
            engine: CorrelationEngine::new(source.cluster.as_str()),
            source,
            sink,
        }
    }

    /// The source this runner tails.
    pub const fn source(&self) -> &SourceSpec {
        &self.source
    }

    /// Current byte offset in the log.
    pub const fn offset(&self) -> u64 {
        self.tailer.offset()
    }

    /// The correlation engine of this source.
    pub const fn engine(&self) -> &CorrelationEngine {
        &self.engine
    }

    /// Runs one poll-decode-correlate pass over newly appended events.
    ///
    /// A record that fails to decode aborts the cycle and is retried on the
    /// next one.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Tail`] for I/O failures and corrupt lines,
    /// and [`ExporterError::Decode`] for records that are not audit events.
    pub fn cycle(&mut self) -> Result<CycleReport> {
        let Self {
            tailer,
            pacer,
            engine,
            sink,
            ..
        } = self;

        let summary = tailer.poll(|record: &[u8]| -> Result<Disposition> {
            let event = AuditEvent::from_slice(record)?;

            if let Some(pacer) = pacer.as_mut() {
                if !pacer.admit(event.reference_time()) {
                    return Ok(Disposition::Deferred);
                }
            }

            for observation in engine.apply(&event) {
                sink.record(&observation);
            }
            Ok(Disposition::Consumed)
        })?;

        Ok(CycleReport {
            records: summary.records,
            truncated: summary.truncated,
            deferred: summary.deferred,
        })
    }
}

impl<S: ObservationSink + 'static> SourceRunner<S> {
    /// Runs [`SourceRunner::cycle`] every `interval` until the task is dropped.
    ///
    /// Cycle errors are logged and retried on the next tick. File work runs
    /// on the blocking pool.
    ///
    /// # Errors
    ///
    /// Returns [`ExporterError::Join`] if a cycle panicked.
    pub async fn run(mut self, interval: Duration) -> Result<()> {
        info!(
            path = %self.source.path.display(),
            cluster = %self.source.cluster,
            replay = self.pacer.is_some(),
            "tailing audit log"
        );

        let mut ticker = tokio::time::interval(interval);
        ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);

        loop {
            ticker.tick().await;

            let (runner, result) = tokio::task::spawn_blocking(move || {
                let result = self.cycle();
                (self, result)
            })
            .await?;
            self = runner;

            match result {
                Ok(report) if report.records > 0 || report.deferred => debug!(
                    path = %self.source.path.display(),
                    cluster = %self.source.cluster,
                    records = report.records,
                    deferred = report.deferred,
                    offset = self.offset(),
                    "cycle complete"
                ),
                Ok(_) => {}
                Err(ExporterError::Tail(e)) if !e.is_corruption() => warn!(
                    path = %self.source.path.display(),
                    cluster = %self.source.cluster,
                    error = %e,
                    "audit log unavailable, retrying"
                ),
                Err(e) => error!(
                    path = %self.source.path.display(),
                    cluster = %self.source.cluster,
                    offset = self.offset(),
                    error = %e,
                    "failed to process audit log, retrying from same offset"
                ),
            }
        }
    }
}
