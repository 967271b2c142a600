#![forbid(unsafe_code)]

//! Headless building blocks for rendering generated Mermaid diagrams.
//!
//! Everything in this crate is synchronous and pure:
//! - [`normalize`]: intent-preserving syntax repairs applied before every render
//! - [`simplify`]: lossy rewrites for the single retry after a failed render
//! - [`detect`]: ordered diagram-kind detection
//! - [`failure`]: classification of engine failures
//! - [`config`]: the option object handed to the rendering engine

pub mod config;
pub mod detect;
pub mod document;
pub mod error;
pub mod failure;
pub mod normalize;
pub mod simplify;

pub use config::{EngineConfig, SecurityLevel, Theme};
pub use detect::{DetectorRegistry, DiagramKind, detect_kind};
pub use document::{DiagramField, DocumentDiagrams, diagram_has_known_issues};
pub use error::{Error, Result};
pub use failure::{FailureKind, RenderFailure, classify_engine_message};
pub use normalize::{NormalizeOptions, Normalizer, normalize_source};
pub use simplify::{simplify, simplify_as};

#[cfg(test)]
mod tests;
