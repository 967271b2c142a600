use crate::engine::{EngineError, RenderEngine, RenderRequest};
use crate::id::{DEFAULT_PREFIX, RETRY_PREFIX, next_render_id};
use crate::timer::{ThreadTimer, Timer};
use futures::executor::block_on;
use futures::future::{Either, select};
use nexus_diagram_core::{
    EngineConfig, FailureKind, NormalizeOptions, Normalizer, RenderFailure, normalize_source,
    simplify,
};
use std::sync::Arc;
use std::time::Duration;

pub const DEFAULT_BACKGROUND: &str = "#ffffff";

/// Markup on success, a presentable failure otherwise.
pub type RenderOutcome = Result<String, RenderFailure>;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderOptions {
    pub background: String,
    /// `None` waits for the engine indefinitely.
    pub timeout: Option<Duration>,
    pub id_prefix: String,
}

impl Default for RenderOptions {
    fn default() -> Self {
        Self {
            background: DEFAULT_BACKGROUND.to_string(),
            timeout: None,
            id_prefix: DEFAULT_PREFIX.to_string(),
        }
    }
}

/// Runs the normalize → render (→ simplify → render) pipeline against an engine.
///
/// Each call is independent: nothing is cached between renders, and identical sources are
/// rendered from scratch every time.
#[derive(Clone)]
pub struct DiagramRenderer<E> {
    engine: E,
    config: EngineConfig,
    retry_config: EngineConfig,
    normalizer: Option<Normalizer>,
    options: RenderOptions,
    timer: Arc<dyn Timer>,
}

impl<E: RenderEngine> DiagramRenderer<E> {
    pub fn new(engine: E) -> Self {
        Self {
            engine,
            config: EngineConfig::interactive(),
            retry_config: EngineConfig::retry(),
            normalizer: None,
            options: RenderOptions::default(),
            timer: Arc::new(ThreadTimer),
        }
    }

    pub fn with_config(mut self, config: EngineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn with_retry_config(mut self, config: EngineConfig) -> Self {
        self.retry_config = config;
        self
    }

    pub fn with_options(mut self, options: RenderOptions) -> Self {
        self.options = options;
        self
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.options.timeout = Some(timeout);
        self
    }

    pub fn with_timer(mut self, timer: Arc<dyn Timer>) -> Self {
        self.timer = timer;
        self
    }

    pub fn with_normalize_options(mut self, options: NormalizeOptions) -> crate::Result<Self> {
        self.normalizer = Some(Normalizer::new(options)?);
        Ok(self)
    }

    pub fn engine(&self) -> &E {
        &self.engine
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    pub fn options(&self) -> &RenderOptions {
        &self.options
    }

    /// The text actually sent to the engine on the first attempt.
    pub fn normalize(&self, raw: &str) -> String {
        match &self.normalizer {
            Some(normalizer) => normalizer.normalize(raw),
            None => normalize_source(Some(raw)),
        }
    }

    /// Normalizes and renders `raw`.
    ///
    /// An empty (or whitespace-only) source fails with `NoChartData` without touching the engine.
    pub async fn render(&self, raw: &str) -> RenderOutcome {
        if raw.trim().is_empty() {
            return Err(RenderFailure::no_chart_data(raw));
        }
        let normalized = self.normalize(raw);
        self.attempt(&self.config, &self.options.id_prefix, &normalized, raw)
            .await
    }

    /// The single fallback attempt: simplifies the normalized form of `raw` and renders it with
    /// the retry configuration.
    pub async fn render_simplified(&self, raw: &str) -> RenderOutcome {
        if raw.trim().is_empty() {
            return Err(RenderFailure::no_chart_data(raw));
        }
        let simplified = simplify(&self.normalize(raw));
        let prefix = if self.options.id_prefix == DEFAULT_PREFIX {
            RETRY_PREFIX.to_string()
        } else {
            format!("{}-retry", self.options.id_prefix)
        };

        self.attempt(&self.retry_config, &prefix, &simplified, raw)
            .await
            .map_err(|failure| {
                let message = match failure.kind {
                    FailureKind::Timeout => failure.message.clone(),
                    _ => "Failed to render even simplified diagram".to_string(),
                };
                failure.with_message(message)
            })
    }

    pub fn render_sync(&self, raw: &str) -> RenderOutcome {
        block_on(self.render(raw))
    }

    pub fn render_simplified_sync(&self, raw: &str) -> RenderOutcome {
        block_on(self.render_simplified(raw))
    }

    async fn attempt(
        &self,
        config: &EngineConfig,
        prefix: &str,
        source: &str,
        original: &str,
    ) -> RenderOutcome {
        let target_id = next_render_id(prefix);
        tracing::debug!(target_id = %target_id, source_bytes = source.len(), "rendering diagram");

        let request = RenderRequest {
            target_id: &target_id,
            source,
            config,
            background: &self.options.background,
        };
        let render = self.engine.render(request);

        let result = match self.options.timeout {
            None => render.await,
            Some(limit) => match select(render, self.timer.sleep(limit)).await {
                Either::Left((result, _)) => result,
                Either::Right(((), _)) => {
                    tracing::warn!(target_id = %target_id, timeout_ms = limit.as_millis() as u64, "diagram render timed out");
                    return Err(RenderFailure::timeout(original, limit));
                }
            },
        };

        result.map_err(|err: EngineError| {
            let failure = RenderFailure::from_engine_message(err.message(), original);
            tracing::warn!(
                target_id = %target_id,
                kind = %failure.kind,
                error = %err,
                "diagram render failed"
            );
            failure
        })
    }
}
