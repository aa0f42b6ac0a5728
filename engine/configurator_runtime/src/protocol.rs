use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::io::{self, Read, Write};
use std::sync::mpsc::Receiver;

pub const CLIENT_TO_HOST_CAP: usize = 65_536;
pub const HOST_TO_CLIENT_CAP: usize = 1_048_576;

/// Envelopes sent by the front-end.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum ClientEnvelope {
    #[serde(rename = "ready")]
    Ready {
        sid: String,
        #[serde(default)]
        capabilities: Value,
    },
    #[serde(rename = "intent")]
    Intent {
        sid: String,
        id: u64,
        name: String,
        #[serde(default)]
        payload: Value,
    },
}

/// Envelopes sent by the configurator host.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "t")]
pub enum HostEnvelope {
    #[serde(rename = "render")]
    Render { sid: String, rev: u64, vm: Value },

    #[serde(rename = "patch")]
    Patch {
        sid: String,
        rev: u64,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack: Option<u64>,
        ops: Vec<PatchOp>,
    },

    #[serde(rename = "error")]
    Error {
        sid: String,
        #[serde(default)]
        rev: Option<u64>,
        code: String,
        message: String,
    },

    #[serde(rename = "snapshot")]
    Snapshot {
        sid: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        ack: Option<u64>,
        project: Value,
    },
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op")]
pub enum PatchOp {
    #[serde(rename = "replace")]
    Replace { path: String, value: Value },
    #[serde(rename = "add")]
    Add { path: String, value: Value },
    #[serde(rename = "remove")]
    Remove { path: String },
}

impl PatchOp {
    pub fn path(&self) -> &str {
        match self {
            PatchOp::Replace { path, .. } | PatchOp::Add { path, .. } | PatchOp::Remove { path } => {
                path
            }
        }
    }
}

pub fn error_envelope(
    sid: impl Into<String>,
    rev: Option<u64>,
    code: &str,
    message: impl Into<String>,
) -> HostEnvelope {
    HostEnvelope::Error {
        sid: sid.into(),
        rev,
        code: code.to_string(),
        message: message.into(),
    }
}

pub fn writer_loop<W: Write>(mut writer: W, rx: Receiver<HostEnvelope>) -> io::Result<()> {
    for envelope in rx {
        let payload = encode_host_envelope(&envelope)?;
        write_frame(&mut writer, &payload, HOST_TO_CLIENT_CAP)?;
        writer.flush()?;
    }

    Ok(())
}

/// Reads frames until EOF. A frame that is not a valid envelope is handed to
/// `on_envelope` as an error; framing errors end the loop.
pub fn reader_loop<R, F, E>(mut reader: R, mut on_envelope: F) -> Result<(), E>
where
    R: Read,
    F: FnMut(serde_json::Result<ClientEnvelope>) -> Result<(), E>,
    E: From<io::Error>,
{
    loop {
        match read_frame(&mut reader, CLIENT_TO_HOST_CAP) {
            Ok(payload) => on_envelope(decode_client_envelope(&payload))?,
            Err(err) if err.kind() == io::ErrorKind::UnexpectedEof => return Ok(()),
            Err(err) => return Err(err.into()),
        }
    }
}

pub fn encode_host_envelope(envelope: &HostEnvelope) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(json_error)
}

pub fn decode_host_envelope(payload: &[u8]) -> io::Result<HostEnvelope> {
    serde_json::from_slice(payload).map_err(json_error)
}

pub fn encode_client_envelope(envelope: &ClientEnvelope) -> io::Result<Vec<u8>> {
    serde_json::to_vec(envelope).map_err(json_error)
}

pub fn decode_client_envelope(payload: &[u8]) -> serde_json::Result<ClientEnvelope> {
    serde_json::from_slice(payload)
}

pub fn read_frame(reader: &mut impl Read, max_payload: usize) -> io::Result<Vec<u8>> {
    let mut len_buf = [0_u8; 4];
    reader.read_exact(&mut len_buf)?;

    let len = u32::from_be_bytes(len_buf) as usize;
    if len > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {len} > {max_payload}"),
        ));
    }

    let mut payload = vec![0_u8; len];
    reader.read_exact(&mut payload)?;
    Ok(payload)
}

pub fn write_frame(writer: &mut impl Write, payload: &[u8], max_payload: usize) -> io::Result<()> {
    if payload.len() > max_payload {
        return Err(io::Error::new(
            io::ErrorKind::InvalidData,
            format!("frame too large: {} > {}", payload.len(), max_payload),
        ));
    }

    let len = u32::try_from(payload.len())
        .map_err(|_| io::Error::new(io::ErrorKind::InvalidData, "payload exceeds u32"))?;

    writer.write_all(&len.to_be_bytes())?;
    writer.write_all(payload)?;
    Ok(())
}

fn json_error(err: serde_json::Error) -> io::Error {
    io::Error::new(io::ErrorKind::InvalidData, err)
}
