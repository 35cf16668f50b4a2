//! Fetching source bytes and probing their length.

use std::fs;
use std::io::{self, Cursor, Read};
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use lofty::prelude::*;
use lofty::probe::Probe;

use crate::http::is_remote;

use super::AudioError;

const CHUNK: usize = 64 * 1024;

/// The generation the audio thread is bound to, shared with fetch workers so
/// a download for a replaced source stops early.
#[derive(Debug, Clone, Default)]
pub(super) struct CurrentGeneration(Arc<AtomicU64>);

impl CurrentGeneration {
    pub(super) fn set(&self, generation: u64) {
        self.0.store(generation, Ordering::Release);
    }

    pub(super) fn is(&self, generation: u64) -> bool {
        self.0.load(Ordering::Acquire) == generation
    }
}

/// Read the whole source into memory so it can be decoded and re-seeked
/// without touching the network again. Remote reads give up between chunks
/// once `generation` is no longer current.
pub(super) fn fetch_source(
    agent: &ureq::Agent,
    locator: &str,
    current: &CurrentGeneration,
    generation: u64,
) -> Result<Arc<[u8]>, AudioError> {
    let io_err = |source| AudioError::Io {
        locator: locator.to_string(),
        source,
    };
    let superseded = || AudioError::Superseded {
        locator: locator.to_string(),
    };

    let bytes = if is_remote(locator) {
        if !current.is(generation) {
            return Err(superseded());
        }
        let response = agent.get(locator).call().map_err(|e| AudioError::Request {
            locator: locator.to_string(),
            source: Box::new(e),
        })?;
        read_while(response.into_reader(), || current.is(generation))
            .map_err(io_err)?
            .ok_or_else(superseded)?
    } else {
        fs::read(locator).map_err(io_err)?
    };

    Ok(Arc::from(bytes))
}

/// Read `reader` to the end in chunks, checking `keep_going` before each
/// one. `None` when it asked to stop.
pub(super) fn read_while(mut reader: impl Read, keep_going: impl Fn() -> bool) -> io::Result<Option<Vec<u8>>> {
    let mut buf = Vec::new();
    let mut chunk = vec![0; CHUNK];
    loop {
        if !keep_going() {
            return Ok(None);
        }
        match reader.read(&mut chunk) {
            Ok(0) => return Ok(Some(buf)),
            Ok(n) => buf.extend_from_slice(&chunk[..n]),
            Err(e) if e.kind() == io::ErrorKind::Interrupted => {}
            Err(e) => return Err(e),
        }
    }
}

/// Length of the encoded audio in `bytes`, when the container reports one.
pub(super) fn probe_duration(bytes: &[u8]) -> Option<Duration> {
    let tagged = Probe::new(Cursor::new(bytes)).guess_file_type().ok()?.read().ok()?;
    let duration = tagged.properties().duration();
    (!duration.is_zero()).then_some(duration)
}
