use nini_core::Thread;
use serde::{Deserialize, Serialize};

use super::ExportError;

pub const FORMAT_VERSION: u32 = 1;

#[derive(Serialize)]
struct Envelope<'a> {
    format_version: u32,
    thread: &'a Thread,
}

#[derive(Deserialize)]
struct OwnedEnvelope {
    format_version: u32,
    thread: Thread,
}

pub(crate) fn render(thread: &Thread) -> Result<Vec<u8>, ExportError> {
    let mut bytes = serde_json::to_vec_pretty(&Envelope {
        format_version: FORMAT_VERSION,
        thread,
    })?;
    bytes.push(b'\n');
    Ok(bytes)
}

/// Read back a document produced by the JSON exporter.
pub fn thread_from_json(bytes: &[u8]) -> Result<Thread, ExportError> {
    let envelope: OwnedEnvelope = serde_json::from_slice(bytes)?;
    if envelope.format_version != FORMAT_VERSION {
        return Err(ExportError::InvalidDocument(format!(
            "unsupported format_version {}",
            envelope.format_version
        )));
    }
    Ok(envelope.thread)
}
