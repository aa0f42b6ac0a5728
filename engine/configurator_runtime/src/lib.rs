pub mod catalog;
pub mod config;
pub mod editor;
pub mod error;
pub mod grid;
pub mod ids;
pub mod intent;
pub mod model;
pub mod patch;
pub mod preview;
pub mod pricing;
pub mod protocol;
pub mod session;
pub mod view;
pub mod vm_patch;

use std::io::{self, Read, Write};
use std::sync::mpsc;
use std::thread;

use crate::protocol::{reader_loop, writer_loop};

pub use crate::catalog::{FrameColor, GlassType, InstallationClass, Material, SectionType};
pub use crate::config::HostConfig;
pub use crate::editor::{Editor, EditorEffect, Selection};
pub use crate::error::{HostError, HostResult, IntentError, PatchError, SnapshotError};
pub use crate::grid::{GridSize, reconcile_grid};
pub use crate::ids::{EntityId, IdAllocator};
pub use crate::intent::Intent;
pub use crate::model::{Project, Section, Window};
pub use crate::patch::{SectionPatch, WindowPatch};
pub use crate::pricing::{PriceBreakdown, price, total_price};
pub use crate::protocol::{ClientEnvelope, HostEnvelope, PatchOp};
pub use crate::session::Session;

/// Serves one editing session over stdin/stdout until stdin closes.
pub fn run(config: HostConfig) -> HostResult<()> {
    serve(io::stdin().lock(), io::stdout(), &config)
}

/// Serves one editing session over any framed byte stream.
///
/// Envelopes are handled one at a time on the calling thread; a writer thread
/// drains the bounded outbound queue.
pub fn serve<R, W>(reader: R, writer: W, config: &HostConfig) -> HostResult<()>
where
    R: Read,
    W: Write + Send + 'static,
{
    let (tx, rx) = mpsc::sync_channel(config.outbound_queue_cap);
    let writer_handle = thread::spawn(move || writer_loop(writer, rx));
    let mut session = Session::new(config.sid.clone());

    tracing::info!(
        target: "configurator.host",
        sid = %config.sid,
        queue_cap = config.outbound_queue_cap,
        "configurator session started"
    );

    let read_result = reader_loop(reader, |decoded| {
        let outbound = match decoded {
            Ok(envelope) => session.handle(envelope),
            Err(err) => session.decode_failure(&err),
        };
        tx.send(outbound).map_err(|_| HostError::WriterClosed)
    });

    // Closing the queue lets the writer drain and exit.
    drop(tx);

    let write_result = match writer_handle.join() {
        Ok(result) => result.map_err(HostError::from),
        Err(_) => Err(HostError::WriterPanicked),
    };

    tracing::info!(
        target: "configurator.host",
        sid = %session.sid(),
        last_rev = ?session.last_rev(),
        windows = session.editor().project().window_count(),
        "configurator session ended"
    );

    match (read_result, write_result) {
        (Err(HostError::WriterClosed), Err(writer_err)) => Err(writer_err),
        (Err(err), _) => Err(err),
        (Ok(()), result) => result,
    }
}
