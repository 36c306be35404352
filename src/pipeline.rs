//! Compile pipeline
//!
//! One full cycle on resolved options: submit, poll within the budget
//! while rendering each batch, then download the binary.

use std::io::{self, Write};
use std::sync::Arc;

use tracing::info;

use crate::error::Result;
use crate::host::{Artifact, CompileSession, Transport};
use crate::options::CompileOptions;
use crate::render::DiagnosticRenderer;

/// Run a compile against `transport`, writing build messages to `out`.
pub fn compile<W: Write>(
    options: &CompileOptions,
    transport: Arc<dyn Transport>,
    renderer: &DiagnosticRenderer,
    out: &mut W,
) -> Result<Artifact> {
    let mut session = CompileSession::new(transport);
    session.start(options)?;

    let mut write_error: Option<io::Error> = None;
    options.poll_budget.drive(&mut session, |batch| {
        if write_error.is_none() {
            write_error = renderer.render_batch(batch, out).err();
        }
    })?;
    if let Some(e) = write_error {
        return Err(e.into());
    }

    let artifact = session.download(&options.output_dir)?;
    info!(path = %artifact.path.display(), size = artifact.size, "compile finished");
    Ok(artifact)
}
