//! The per-diagram presentation state machine.
//!
//! ```text
//! Loading ──ok──▶ Rendered
//!    │
//!    └──err──▶ Failed ──retry (interactive, once)──▶ Loading ──▶ Rendered | Failed
//! ```
//!
//! Every request is stamped with an attempt generation. Completions carrying an older generation
//! than the view's current one are stale and are dropped, so a slow render of a previous source can
//! never overwrite the result for the current one.

use crate::engine::RenderEngine;
use crate::present::Presentation;
use crate::renderer::{DEFAULT_BACKGROUND, DiagramRenderer, RenderOutcome};
use nexus_diagram_core::{FailureKind, RenderFailure};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ShellVariant {
    /// Offers a single simplified retry after a failure.
    #[default]
    Interactive,
    /// Embedded rendering: failures are final.
    Static,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ViewState {
    Loading,
    Rendered { markup: String },
    Failed(RenderFailure),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pass {
    Initial,
    Simplified,
}

/// One render request issued by a [`DiagramView`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderTicket {
    pub generation: u64,
    pub pass: Pass,
    /// The original source; the renderer derives the attempted text from it.
    pub source: String,
}

#[derive(Debug, Clone)]
pub struct DiagramView {
    variant: ShellVariant,
    background: String,
    source: String,
    generation: u64,
    retry_spent: bool,
    state: ViewState,
}

impl Default for DiagramView {
    fn default() -> Self {
        Self::new(ShellVariant::Interactive, DEFAULT_BACKGROUND)
    }
}

impl DiagramView {
    pub fn new(variant: ShellVariant, background: impl Into<String>) -> Self {
        Self {
            variant,
            background: background.into(),
            source: String::new(),
            generation: 0,
            retry_spent: false,
            state: ViewState::Loading,
        }
    }

    pub fn variant(&self) -> ShellVariant {
        self.variant
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn state(&self) -> &ViewState {
        &self.state
    }

    pub fn retry_spent(&self) -> bool {
        self.retry_spent
    }

    /// Starts over with a new source. Any in-flight request becomes stale and the retry budget
    /// is restored.
    pub fn set_source(&mut self, source: impl Into<String>) -> RenderTicket {
        self.source = source.into();
        self.retry_spent = false;
        self.issue(Pass::Initial)
    }

    /// Applies a finished request. Returns `false` when the ticket was superseded and the
    /// outcome was discarded.
    pub fn complete(&mut self, ticket: &RenderTicket, outcome: RenderOutcome) -> bool {
        if ticket.generation != self.generation {
            tracing::debug!(
                stale = ticket.generation,
                current = self.generation,
                "discarding stale render result"
            );
            return false;
        }

        self.state = match outcome {
            Ok(markup) => ViewState::Rendered { markup },
            Err(failure) => ViewState::Failed(failure),
        };
        true
    }

    pub fn can_retry(&self) -> bool {
        self.variant == ShellVariant::Interactive
            && !self.retry_spent
            && matches!(&self.state, ViewState::Failed(f) if f.kind != FailureKind::NoChartData)
    }

    /// Issues the simplified retry, if one is still available.
    pub fn retry(&mut self) -> Option<RenderTicket> {
        if !self.can_retry() {
            return None;
        }
        self.retry_spent = true;
        Some(self.issue(Pass::Simplified))
    }

    pub fn presentation(&self) -> Presentation {
        match &self.state {
            ViewState::Loading => Presentation::Spinner,
            ViewState::Rendered { markup } => Presentation::Diagram {
                markup: markup.clone(),
                background: self.background.clone(),
            },
            ViewState::Failed(failure) => Presentation::Error {
                message: failure.message.clone(),
                detail: failure.detail.clone(),
                source: failure.source.clone(),
                retry: self.can_retry(),
            },
        }
    }

    /// Sets `source` and renders it to completion.
    pub async fn show<E: RenderEngine>(
        &mut self,
        renderer: &DiagramRenderer<E>,
        source: impl Into<String>,
    ) -> &ViewState {
        let ticket = self.set_source(source);
        let outcome = renderer.run(&ticket).await;
        self.complete(&ticket, outcome);
        &self.state
    }

    /// Runs the simplified retry to completion. Returns `false` when no retry was available.
    pub async fn retry_with<E: RenderEngine>(&mut self, renderer: &DiagramRenderer<E>) -> bool {
        let Some(ticket) = self.retry() else {
            return false;
        };
        let outcome = renderer.run(&ticket).await;
        self.complete(&ticket, outcome);
        true
    }

    fn issue(&mut self, pass: Pass) -> RenderTicket {
        self.generation += 1;
        self.state = ViewState::Loading;
        RenderTicket {
            generation: self.generation,
            pass,
            source: self.source.clone(),
        }
    }
}

impl<E: RenderEngine> DiagramRenderer<E> {
    /// Executes a ticket issued by a [`DiagramView`].
    pub async fn run(&self, ticket: &RenderTicket) -> RenderOutcome {
        match ticket.pass {
            Pass::Initial => self.render(&ticket.source).await,
            Pass::Simplified => self.render_simplified(&ticket.source).await,
        }
    }
}
