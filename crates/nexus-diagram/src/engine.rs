//! The rendering-engine capability.
//!
//! An engine receives its configuration with every call. There is no shared, pre-configured
//! engine state: two renders with different settings can be in flight at the same time without
//! seeing each other's options.

use futures::channel::oneshot;
use futures::future::BoxFuture;
use nexus_diagram_core::EngineConfig;
use std::fs::File;
use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::sync::Arc;
use std::time::Duration;

pub const ENGINE_ENV: &str = "NEXUS_DIAGRAM_ENGINE";
pub const DEFAULT_ENGINE_PROGRAM: &str = "mmdc";

const POLL_INTERVAL: Duration = Duration::from_millis(10);

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EngineError {
    #[error("{0}")]
    Message(String),
    /// The engine failed without anything resembling an error message.
    #[error("engine failed without an error message")]
    Opaque,
}

impl EngineError {
    pub fn message(&self) -> Option<&str> {
        match self {
            Self::Message(msg) => Some(msg),
            Self::Opaque => None,
        }
    }
}

#[derive(Debug, Clone, Copy)]
pub struct RenderRequest<'a> {
    /// Unique per invocation; see [`crate::id::next_render_id`].
    pub target_id: &'a str,
    pub source: &'a str,
    pub config: &'a EngineConfig,
    /// Display hint only.
    pub background: &'a str,
}

pub trait RenderEngine: Send + Sync {
    /// Configures the engine with `request.config` and renders `request.source` to SVG markup.
    fn render<'a>(&'a self, request: RenderRequest<'a>) -> BoxFuture<'a, Result<String, EngineError>>;
}

impl<E: RenderEngine + ?Sized> RenderEngine for Arc<E> {
    fn render<'a>(&'a self, request: RenderRequest<'a>) -> BoxFuture<'a, Result<String, EngineError>> {
        (**self).render(request)
    }
}

impl<E: RenderEngine + ?Sized> RenderEngine for &E {
    fn render<'a>(&'a self, request: RenderRequest<'a>) -> BoxFuture<'a, Result<String, EngineError>> {
        (**self).render(request)
    }
}

/// An engine backed by an external renderer process with an `mmdc`-compatible command line:
///
/// ```text
/// <program> [extra args] -i <in.mmd> -o <out.svg> -c <config.json> -b <background>
/// ```
///
/// Each call runs on its own thread, so the returned future does not need an executor that
/// tolerates blocking. Dropping the future (a timeout, a superseded render) kills the renderer
/// process and removes its scratch files. Processes the renderer itself spawns are not tracked.
#[derive(Debug, Clone)]
pub struct CommandEngine {
    program: PathBuf,
    extra_args: Vec<String>,
    work_dir: PathBuf,
}

impl CommandEngine {
    pub fn new(program: impl Into<PathBuf>) -> Self {
        Self {
            program: program.into(),
            extra_args: Vec::new(),
            work_dir: std::env::temp_dir(),
        }
    }

    /// Uses `$NEXUS_DIAGRAM_ENGINE`, falling back to `mmdc` on the `PATH`.
    pub fn from_env() -> Self {
        match std::env::var(ENGINE_ENV) {
            Ok(program) if !program.trim().is_empty() => Self::new(program.trim()),
            _ => Self::new(DEFAULT_ENGINE_PROGRAM),
        }
    }

    pub fn with_args<I, S>(mut self, args: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.extra_args.extend(args.into_iter().map(Into::into));
        self
    }

    pub fn with_work_dir(mut self, dir: impl Into<PathBuf>) -> crate::Result<Self> {
        let dir = dir.into();
        std::fs::create_dir_all(&dir)?;
        self.work_dir = dir;
        Ok(self)
    }

    pub fn program(&self) -> &Path {
        &self.program
    }

    fn run_blocking(&self, job: &Job, abandoned: impl Fn() -> bool) -> Result<String, EngineError> {
        let scratch = Scratch::new(&self.work_dir, &job.target_id);
        let result = self.run_in(job, &scratch, abandoned);
        scratch.remove();
        result
    }

    fn run_in(
        &self,
        job: &Job,
        scratch: &Scratch,
        abandoned: impl Fn() -> bool,
    ) -> Result<String, EngineError> {
        let io = |what: &str, err: std::io::Error| EngineError::Message(format!("{what}: {err}"));

        std::fs::write(&scratch.input, &job.source)
            .map_err(|e| io("failed to write diagram source", e))?;
        std::fs::write(&scratch.config, &job.config_json)
            .map_err(|e| io("failed to write engine config", e))?;
        let stdout = File::create(&scratch.stdout).map_err(|e| io("failed to capture stdout", e))?;
        let stderr = File::create(&scratch.stderr).map_err(|e| io("failed to capture stderr", e))?;

        let mut child = Command::new(&self.program)
            .args(&self.extra_args)
            .arg("-i")
            .arg(&scratch.input)
            .arg("-o")
            .arg(&scratch.output)
            .arg("-c")
            .arg(&scratch.config)
            .arg("-b")
            .arg(&job.background)
            .stdin(Stdio::null())
            .stdout(Stdio::from(stdout))
            .stderr(Stdio::from(stderr))
            .spawn()
            .map_err(|e| {
                EngineError::Message(format!(
                    "failed to launch renderer `{}`: {e}",
                    self.program.display()
                ))
            })?;

        let status = loop {
            if abandoned() {
                tracing::debug!(target_id = %job.target_id, "render abandoned; killing renderer");
                if let Err(err) = child.kill() {
                    tracing::debug!(error = %err, "failed to kill renderer");
                }
                let _ = child.wait();
                return Err(EngineError::Message("renderer was cancelled".to_string()));
            }
            match child.try_wait() {
                Ok(Some(status)) => break status,
                Ok(None) => std::thread::sleep(POLL_INTERVAL),
                Err(err) => {
                    let _ = child.kill();
                    let _ = child.wait();
                    return Err(io("failed to wait for renderer", err));
                }
            }
        };

        if !status.success() {
            let read = |path: &Path| {
                std::fs::read_to_string(path)
                    .map(|text| text.trim().to_string())
                    .unwrap_or_default()
            };
            let stderr = read(&scratch.stderr);
            let stdout = read(&scratch.stdout);
            return Err(match (stderr.is_empty(), stdout.is_empty()) {
                (false, _) => EngineError::Message(stderr),
                (true, false) => EngineError::Message(stdout),
                (true, true) => EngineError::Opaque,
            });
        }

        std::fs::read_to_string(&scratch.output).map_err(|e| io("failed to read rendered SVG", e))
    }
}

/// Per-render files in the work directory, all named after the render-target id.
#[derive(Debug)]
struct Scratch {
    input: PathBuf,
    output: PathBuf,
    config: PathBuf,
    stdout: PathBuf,
    stderr: PathBuf,
}

impl Scratch {
    fn new(dir: &Path, target_id: &str) -> Self {
        let file = |ext: &str| dir.join(format!("{target_id}.{ext}"));
        Self {
            input: file("mmd"),
            output: file("svg"),
            config: file("json"),
            stdout: file("stdout"),
            stderr: file("stderr"),
        }
    }

    fn remove(&self) {
        for path in [&self.input, &self.output, &self.config, &self.stdout, &self.stderr] {
            if let Err(err) = std::fs::remove_file(path) {
                if err.kind() != std::io::ErrorKind::NotFound {
                    tracing::debug!(path = %path.display(), error = %err, "failed to remove renderer scratch file");
                }
            }
        }
    }
}

#[derive(Debug)]
struct Job {
    target_id: String,
    source: String,
    config_json: Vec<u8>,
    background: String,
}

impl RenderEngine for CommandEngine {
    fn render<'a>(&'a self, request: RenderRequest<'a>) -> BoxFuture<'a, Result<String, EngineError>> {
        let config_json = match serde_json::to_vec_pretty(&request.config.to_value()) {
            Ok(v) => v,
            Err(err) => {
                let err = EngineError::Message(format!("failed to encode engine config: {err}"));
                return Box::pin(futures::future::ready(Err(err)));
            }
        };
        let job = Job {
            target_id: request.target_id.to_string(),
            source: request.source.to_string(),
            config_json,
            background: request.background.to_string(),
        };

        let engine = self.clone();
        let (tx, rx) = oneshot::channel();
        let spawned = std::thread::Builder::new()
            .name(format!("render-{}", job.target_id))
            .spawn(move || {
                let result = engine.run_blocking(&job, || tx.is_canceled());
                let _ = tx.send(result);
            });

        Box::pin(async move {
            if let Err(err) = spawned {
                return Err(EngineError::Message(format!(
                    "failed to start renderer thread: {err}"
                )));
            }
            rx.await.unwrap_or(Err(EngineError::Opaque))
        })
    }
}

