#![forbid(unsafe_code)]

//! `nexus-diagram` turns raw (often AI-generated) Mermaid text into rendered SVG, or into a
//! presentable failure.
//!
//! The pipeline normalizes the source, hands it to a [`RenderEngine`] together with the engine
//! configuration, and classifies failures. A failed interactive render may be retried once with a
//! simplified source through [`shell::DiagramView`].
//!
//! Everything from `nexus-diagram-core` is re-exported at the crate root, except that [`Error`]
//! and [`Result`] here are the pipeline's own.

pub use nexus_diagram_core::*;

pub mod engine;
pub mod id;
pub mod present;
pub mod renderer;
pub mod shell;
pub mod timer;

pub use engine::{CommandEngine, EngineError, RenderEngine, RenderRequest};
pub use id::{next_render_id, sanitize_render_id};
pub use present::Presentation;
pub use renderer::{DiagramRenderer, RenderOptions, RenderOutcome};
pub use shell::{DiagramView, Pass, RenderTicket, ShellVariant, ViewState};
pub use timer::{ThreadTimer, Timer};

#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error(transparent)]
    Core(#[from] nexus_diagram_core::Error),
    #[error("renderer I/O error: {0}")]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
