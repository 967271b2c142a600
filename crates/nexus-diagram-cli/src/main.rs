use futures::executor::block_on;
use nexus_diagram::{
    CommandEngine, DiagramField, DiagramRenderer, DiagramView, DocumentDiagrams, EngineConfig,
    NormalizeOptions, Normalizer, RenderFailure, RenderOptions, ShellVariant, Theme, ViewState,
    detect_kind, simplify,
};
use std::io::Read;
use std::time::Duration;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Debug)]
enum CliError {
    Usage(&'static str),
    Io(std::io::Error),
    Json(serde_json::Error),
    Config(nexus_diagram_core::Error),
    Pipeline(nexus_diagram::Error),
    Render(RenderFailure),
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CliError::Usage(msg) => write!(f, "{msg}"),
            CliError::Io(err) => write!(f, "I/O error: {err}"),
            CliError::Json(err) => write!(f, "JSON error: {err}"),
            CliError::Config(err) => write!(f, "config error: {err}"),
            CliError::Pipeline(err) => write!(f, "{err}"),
            CliError::Render(failure) => {
                write!(f, "{}", failure.message)?;
                if let Some(detail) = &failure.detail {
                    write!(f, "\n  {detail}")?;
                }
                Ok(())
            }
        }
    }
}

impl From<std::io::Error> for CliError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

impl From<serde_json::Error> for CliError {
    fn from(value: serde_json::Error) -> Self {
        Self::Json(value)
    }
}

impl From<nexus_diagram_core::Error> for CliError {
    fn from(value: nexus_diagram_core::Error) -> Self {
        Self::Config(value)
    }
}

impl From<nexus_diagram::Error> for CliError {
    fn from(value: nexus_diagram::Error) -> Self {
        Self::Pipeline(value)
    }
}

#[derive(Debug, Clone, Copy, Default)]
enum Command {
    #[default]
    Render,
    Detect,
    Normalize,
    Simplify,
}

#[derive(Debug, Default)]
struct Args {
    command: Command,
    input: Option<String>,
    field: Option<DiagramField>,
    config: Option<String>,
    theme: Option<Theme>,
    timeout: Option<Duration>,
    background: Option<String>,
    id_prefix: Option<String>,
    engine: Option<String>,
    static_view: bool,
    keep_er_cardinality: bool,
    html: bool,
    verbose: bool,
    out: Option<String>,
}

fn usage() -> &'static str {
    "nexus-diagram-cli\n\
\n\
USAGE:\n\
  nexus-diagram-cli [render] [--engine <cmd>] [--config <json>|<path>] [--theme default|neutral|dark|forest|base] [--timeout-ms <n>] [--background <css-color>] [--id <prefix>] [--static] [--html] [--out <path>] [<path>|-]\n\
  nexus-diagram-cli detect [<path>|-]\n\
  nexus-diagram-cli normalize [<path>|-]\n\
  nexus-diagram-cli simplify [<path>|-]\n\
\n\
COMMON OPTIONS:\n\
  --field er|use-case     treat the input as a JSON document and read that diagram field\n\
  --keep-er-cardinality   do not rewrite `||--||` relationships (the rewrite changes their meaning)\n\
  --verbose               log pipeline details to stderr (same as RUST_LOG=debug)\n\
\n\
NOTES:\n\
  - If <path> is omitted or '-', input is read from stdin.\n\
  - render uses $NEXUS_DIAGRAM_ENGINE (default: mmdc) unless --engine is given.\n\
  - A failed render is retried once with a simplified source unless --static is given.\n\
  - simplify prints exactly what that retry would send to the engine.\n\
  - Exit codes: 2 usage, 1 I/O or config error, 3 diagram could not be rendered.\n\
"
}

fn parse_args(argv: &[String]) -> Result<Args, CliError> {
    let mut args = Args::default();

    let mut it = argv.iter().skip(1);
    while let Some(a) = it.next() {
        match a.as_str() {
            "--help" | "-h" => return Err(CliError::Usage(usage())),
            "render" => args.command = Command::Render,
            "detect" => args.command = Command::Detect,
            "normalize" => args.command = Command::Normalize,
            "simplify" => args.command = Command::Simplify,
            "--static" => args.static_view = true,
            "--keep-er-cardinality" => args.keep_er_cardinality = true,
            "--html" => args.html = true,
            "--verbose" | "-v" => args.verbose = true,
            "--field" => {
                let Some(field) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.field = Some(
                    field
                        .parse::<DiagramField>()
                        .map_err(|_| CliError::Usage(usage()))?,
                );
            }
            "--config" => {
                let Some(config) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.config = Some(config.clone());
            }
            "--theme" => {
                let Some(theme) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.theme = Some(theme.parse::<Theme>().map_err(|_| CliError::Usage(usage()))?);
            }
            "--timeout-ms" => {
                let Some(ms) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                let ms = ms.parse::<u64>().map_err(|_| CliError::Usage(usage()))?;
                args.timeout = (ms > 0).then(|| Duration::from_millis(ms));
            }
            "--background" => {
                let Some(bg) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if !bg.trim().is_empty() {
                    args.background = Some(bg.trim().to_string());
                }
            }
            "--id" => {
                let Some(id) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.id_prefix = Some(id.clone());
            }
            "--engine" => {
                let Some(engine) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                if engine.trim().is_empty() {
                    return Err(CliError::Usage(usage()));
                }
                args.engine = Some(engine.clone());
            }
            "--out" => {
                let Some(out) = it.next() else {
                    return Err(CliError::Usage(usage()));
                };
                args.out = Some(out.clone());
            }
            "--" => {
                if let Some(rest) = it.next() {
                    if args.input.is_some() {
                        return Err(CliError::Usage(usage()));
                    }
                    args.input = Some(rest.clone());
                }
                if it.next().is_some() {
                    return Err(CliError::Usage(usage()));
                }
            }
            "-" => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some("-".to_string());
            }
            other if other.starts_with('-') => return Err(CliError::Usage(usage())),
            path => {
                if args.input.is_some() {
                    return Err(CliError::Usage(usage()));
                }
                args.input = Some(path.to_string());
            }
        }
    }

    Ok(args)
}

fn init_tracing(verbose: bool) {
    let filter = if verbose {
        tracing_subscriber::EnvFilter::new("debug")
    } else {
        tracing_subscriber::EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("warn"))
    };
    let _ = tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .try_init();
}

fn read_input(input: Option<&str>) -> Result<String, CliError> {
    match input {
        None | Some("-") => {
            let mut buf = String::new();
            std::io::stdin().read_to_string(&mut buf)?;
            Ok(buf)
        }
        Some(path) => Ok(std::fs::read_to_string(path)?),
    }
}

/// Reads the diagram text, pulling it out of a JSON document when `--field` was given.
fn read_source(args: &Args) -> Result<String, CliError> {
    let text = read_input(args.input.as_deref())?;
    let Some(field) = args.field else {
        return Ok(text);
    };

    let document = DocumentDiagrams::from_json(&text)?;
    if document.has_known_issues(field) {
        tracing::warn!(field = ?field, "document diagram has known generator issues");
    }
    match document.get(field) {
        Some(diagram) => Ok(diagram.to_string()),
        None => {
            tracing::warn!(keys = ?field.keys(), "document carries no diagram for the requested field");
            Ok(String::new())
        }
    }
}

fn write_text(text: &str, out: Option<&str>) -> Result<(), CliError> {
    match out {
        None => {
            print!("{text}");
            Ok(())
        }
        Some(path) => {
            std::fs::write(path, text)?;
            Ok(())
        }
    }
}

fn load_overrides(config: &str) -> Result<String, CliError> {
    if config.trim_start().starts_with('{') {
        Ok(config.to_string())
    } else {
        Ok(std::fs::read_to_string(config)?)
    }
}

fn normalize_options(args: &Args) -> NormalizeOptions {
    NormalizeOptions {
        rewrite_er_cardinality: !args.keep_er_cardinality,
        ..NormalizeOptions::default()
    }
}

fn build_engine(command_line: Option<&str>) -> CommandEngine {
    let Some(command_line) = command_line else {
        return CommandEngine::from_env();
    };
    let mut parts = command_line.split_whitespace();
    match parts.next() {
        Some(program) => CommandEngine::new(program).with_args(parts),
        None => CommandEngine::from_env(),
    }
}

fn run_render(args: &Args, source: String) -> Result<(), CliError> {
    let variant = if args.static_view {
        ShellVariant::Static
    } else {
        ShellVariant::Interactive
    };

    let mut config = match variant {
        ShellVariant::Interactive => EngineConfig::interactive(),
        ShellVariant::Static => EngineConfig::embedded(),
    };
    let mut retry_config = EngineConfig::retry();
    if let Some(theme) = args.theme {
        config = config.with_theme(theme);
        retry_config = retry_config.with_theme(theme);
    }
    if let Some(overrides) = args.config.as_deref() {
        let overrides = load_overrides(overrides)?;
        config = config.with_overrides_json(&overrides)?;
    }

    let mut options = RenderOptions {
        timeout: args.timeout,
        ..RenderOptions::default()
    };
    if let Some(bg) = &args.background {
        options.background = bg.clone();
    }
    if let Some(prefix) = &args.id_prefix {
        options.id_prefix = prefix.clone();
    }
    let background = options.background.clone();

    let engine = build_engine(args.engine.as_deref());
    tracing::debug!(program = %engine.program().display(), "using render engine");

    let renderer = DiagramRenderer::new(engine)
        .with_config(config)
        .with_retry_config(retry_config)
        .with_options(options)
        .with_normalize_options(normalize_options(args))?;

    let mut view = DiagramView::new(variant, background);
    block_on(view.show(&renderer, source));
    if view.can_retry() {
        tracing::info!("initial render failed; retrying with simplified source");
        block_on(view.retry_with(&renderer));
    }

    let failure = match view.state() {
        ViewState::Rendered { markup } => {
            let text = if args.html {
                view.presentation().to_html()
            } else {
                markup.clone()
            };
            return write_text(&text, args.out.as_deref());
        }
        ViewState::Failed(failure) => failure.clone(),
        ViewState::Loading => RenderFailure::from_engine_message(None, view.source()),
    };

    if args.html {
        write_text(&view.presentation().to_html(), args.out.as_deref())?;
    }
    Err(CliError::Render(failure))
}

fn run(args: Args) -> Result<(), CliError> {
    let source = read_source(&args)?;

    match args.command {
        Command::Detect => {
            println!("{}", detect_kind(&source));
            Ok(())
        }
        Command::Normalize => {
            let normalizer = Normalizer::new(normalize_options(&args))?;
            write_text(&normalizer.normalize(&source), args.out.as_deref())
        }
        Command::Simplify => {
            let normalizer = Normalizer::new(normalize_options(&args))?;
            write_text(&simplify(&normalizer.normalize(&source)), args.out.as_deref())
        }
        Command::Render => run_render(&args, source),
    }
}

fn main() {
    let args = match parse_args(&std::env::args().collect::<Vec<_>>()) {
        Ok(v) => v,
        Err(CliError::Usage(msg)) => {
            eprintln!("{msg}");
            std::process::exit(2);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    };

    init_tracing(args.verbose);

    match run(args) {
        Ok(()) => {}
        Err(err @ CliError::Render(_)) => {
            eprintln!("{err}");
            std::process::exit(3);
        }
        Err(err) => {
            eprintln!("{err}");
            std::process::exit(1);
        }
    }
}
