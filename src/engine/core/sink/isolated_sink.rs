use crossbeam::channel::{Receiver, Sender, bounded};
use std::thread::{self, JoinHandle};
use tracing::{debug, warn};

use crate::engine::core::run::Entry;
use crate::engine::core::sink::{EmbeddedSink, OutputSink, SinkMode};
use crate::engine::errors::SinkError;

enum SinkRequest {
    Append(Entry, Sender<Result<(), SinkError>>),
    Suspend(Sender<Result<Vec<u8>, SinkError>>),
    Finalize(Sender<Result<u64, SinkError>>),
}

/// Output sink whose writer lives on its own thread. Calls block until the
/// worker has answered, so ordering is the same as with `EmbeddedSink`.
pub struct IsolatedSink {
    tx: Sender<SinkRequest>,
    written: u64,
    worker: Option<JoinHandle<()>>,
}

impl IsolatedSink {
    pub fn spawn(sink: EmbeddedSink) -> Result<Self, SinkError> {
        let written = sink.written_count();
        let (tx, rx) = bounded(1);
        let worker = thread::Builder::new()
            .name("merge-sink".to_string())
            .spawn(move || run_sink_worker(sink, rx))?;
        debug!(target: "sink::isolated", written, "Spawned sink worker");
        Ok(Self {
            tx,
            written,
            worker: Some(worker),
        })
    }

    fn request<T>(
        &self,
        build: impl FnOnce(Sender<Result<T, SinkError>>) -> SinkRequest,
    ) -> Result<T, SinkError> {
        let (reply_tx, reply_rx) = bounded(1);
        self.tx
            .send(build(reply_tx))
            .map_err(|_| SinkError::WorkerGone)?;
        reply_rx.recv().map_err(|_| SinkError::WorkerGone)?
    }

    fn join_worker(&mut self) {
        if let Some(worker) = self.worker.take() {
            if worker.join().is_err() {
                warn!(target: "sink::isolated", "Sink worker panicked");
            }
        }
    }
}

fn run_sink_worker(mut sink: EmbeddedSink, rx: Receiver<SinkRequest>) {
    while let Ok(request) = rx.recv() {
        match request {
            SinkRequest::Append(entry, reply) => {
                let _ = reply.send(sink.append_entry(entry));
            }
            SinkRequest::Suspend(reply) => {
                let _ = reply.send(sink.into_bytes());
                return;
            }
            SinkRequest::Finalize(reply) => {
                let _ = reply.send(sink.finish());
                return;
            }
        }
    }
    debug!(target: "sink::isolated", written = sink.written_count(), "Sink handle dropped, worker exiting");
}

impl OutputSink for IsolatedSink {
    fn mode(&self) -> SinkMode {
        SinkMode::Isolated
    }

    fn append(&mut self, entry: Entry) -> Result<(), SinkError> {
        self.request(|reply| SinkRequest::Append(entry, reply))?;
        self.written += 1;
        Ok(())
    }

    fn written(&self) -> u64 {
        self.written
    }

    fn suspend(mut self: Box<Self>) -> Result<Vec<u8>, SinkError> {
        let bytes = self.request(SinkRequest::Suspend);
        self.join_worker();
        bytes
    }

    fn finalize(mut self: Box<Self>) -> Result<u64, SinkError> {
        let count = self.request(SinkRequest::Finalize);
        self.join_worker();
        count
    }
}
