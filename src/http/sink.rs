//! Response sink boundary.
//!
//! # Responsibilities
//! - Define the write surface the flush stage commits the staged response to
//! - Provide the in-memory sink the axum adapter and the tests use
//!
//! # Design Decisions
//! - The sink is only ever written by the flush stage; handlers and
//!   middleware mutate the staged response on the context instead, otherwise
//!   later middleware could no longer observe or veto the response
//! - Write errors are reported to the caller so the flush stage can log
//!   them; they are never retried or escalated

use std::io;
use std::sync::{Arc, Mutex};

/// Write surface for the single flush of a staged response.
pub trait ResponseSink: Send {
    /// Commits an explicit status code. Not called when the staged status is
    /// unset, so the sink's own default applies.
    fn write_status(&mut self, status: u16) -> io::Result<()>;

    /// Appends body bytes, returning how many were accepted.
    fn write_body(&mut self, data: &[u8]) -> io::Result<usize>;
}

/// In-memory sink shared between the dispatcher and a network adapter: the
/// flush stage writes into it, the adapter reads it back out once the chain
/// has returned.
#[derive(Debug, Default)]
pub struct BufferedSink {
    status: Option<u16>,
    body: Vec<u8>,
}

impl BufferedSink {
    pub fn new() -> Self {
        Self::default()
    }

    /// A sink handle that can be kept by the adapter while a clone travels
    /// into the request context.
    pub fn shared() -> Arc<Mutex<BufferedSink>> {
        Arc::new(Mutex::new(Self::new()))
    }

    /// The committed status, `None` when the flush left it to the default.
    pub fn status(&self) -> Option<u16> {
        self.status
    }

    pub fn body(&self) -> &[u8] {
        &self.body
    }
}

impl ResponseSink for Arc<Mutex<BufferedSink>> {
    fn write_status(&mut self, status: u16) -> io::Result<()> {
        match self.lock() {
            Ok(mut sink) => {
                sink.status = Some(status);
                Ok(())
            }
            Err(_) => Err(io::Error::other("response sink poisoned")),
        }
    }

    fn write_body(&mut self, data: &[u8]) -> io::Result<usize> {
        match self.lock() {
            Ok(mut sink) => {
                sink.body.extend_from_slice(data);
                Ok(data.len())
            }
            Err(_) => Err(io::Error::other("response sink poisoned")),
        }
    }
}
