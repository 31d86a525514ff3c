//! Dedicated writer thread for a sink.
//!
//! Records are queued on a bounded channel and written one at a time in the
//! order they were submitted, so row ids stay monotonic. Producers block
//! when the queue is full.

use std::sync::mpsc::{self, Receiver, SyncSender};
use std::thread::{self, JoinHandle};

use crate::db::SqlClient;
use crate::errors::SinkError;
use crate::record::LogRecord;
use crate::sink::DynamicSqlLogSink;

pub const DEFAULT_CAPACITY: usize = 1024;

enum Command {
    Write(Box<LogRecord>),
    Flush(SyncSender<()>),
    Shutdown,
}

/// Counters collected by the writer thread.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct WorkerReport {
    pub written: u64,
    pub failed: u64,
    pub last_error: Option<String>,
}

type Outcome<C> = (DynamicSqlLogSink<C>, WorkerReport);

pub struct SinkWorker<C: SqlClient + Send + 'static> {
    tx: SyncSender<Command>,
    handle: Option<JoinHandle<Outcome<C>>>,
}

impl<C: SqlClient + Send + 'static> SinkWorker<C> {
    pub fn spawn(sink: DynamicSqlLogSink<C>, capacity: usize) -> Self {
        let (tx, rx) = mpsc::sync_channel(capacity.max(1));
        let handle = thread::spawn(move || run(sink, rx));
        Self {
            tx,
            handle: Some(handle),
        }
    }

    /// Queue a record; blocks while the queue is full.
    pub fn submit(&self, record: LogRecord) -> Result<(), SinkError> {
        self.tx
            .send(Command::Write(Box::new(record)))
            .map_err(|_| SinkError::WorkerClosed)
    }

    /// Wait until every record submitted before this call was processed.
    pub fn flush(&self) -> Result<(), SinkError> {
        let (ack_tx, ack_rx) = mpsc::sync_channel(1);
        self.tx
            .send(Command::Flush(ack_tx))
            .map_err(|_| SinkError::WorkerClosed)?;
        ack_rx.recv().map_err(|_| SinkError::WorkerClosed)
    }

    /// Drain the queue, stop the thread and hand the sink back.
    pub fn shutdown(mut self) -> Result<Outcome<C>, SinkError> {
        let _ = self.tx.send(Command::Shutdown);
        let handle = self.handle.take().ok_or(SinkError::WorkerClosed)?;
        handle.join().map_err(|_| SinkError::WorkerClosed)
    }
}

impl<C: SqlClient + Send + 'static> Drop for SinkWorker<C> {
    fn drop(&mut self) {
        if let Some(handle) = self.handle.take() {
            let _ = self.tx.send(Command::Shutdown);
            let _ = handle.join();
        }
    }
}

fn run<C: SqlClient>(mut sink: DynamicSqlLogSink<C>, rx: Receiver<Command>) -> Outcome<C> {
    let mut report = WorkerReport::default();
    while let Ok(cmd) = rx.recv() {
        match cmd {
            Command::Write(record) => match sink.write(&record) {
                Ok(()) => report.written += 1,
                Err(err) => {
                    log::warn!("dropping log record for {}: {err}", sink.config().table);
                    report.failed += 1;
                    report.last_error = Some(err.to_string());
                }
            },
            Command::Flush(ack) => {
                let _ = ack.send(());
            }
            Command::Shutdown => break,
        }
    }
    (sink, report)
}
