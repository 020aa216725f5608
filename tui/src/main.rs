//! Relay Chat Entry Point
//!
//! Launches the terminal chat client, or runs a one-shot headless command.
//!
//! Usage:
//!   relay-chat [OPTIONS]
//!
//! Options:
//!   -p, --proxy <URL>      Proxy base address (default: http://127.0.0.1:3000)
//!   -k, --api-key <KEY>    API key forwarded with each request
//!   -m, --model <MODEL>    Model to request
//!   --prompt <TEXT>        Send one message, print the reply and exit
//!   --upload <FILE>        Upload a PDF and exit
//!   --health               Print the proxy health report and exit

use std::io::{self, IsTerminal};
use std::panic;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use relay_core::{
    load_config, load_config_from_path, ChatSession, ChatTransport, ConfigOverrides,
    HttpTransport, RelayConfig,
};

use relay_tui::app::StdoutTerminal;
use relay_tui::{headless, App};

/// Relay Chat - terminal client for relay-chat
#[derive(Parser, Debug)]
#[command(name = "relay-chat")]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Proxy base address
    #[arg(short = 'p', long, env = "RELAY_PROXY_URL", value_name = "URL")]
    proxy: Option<String>,

    /// API key forwarded to the backend
    #[arg(short = 'k', long, env = "OPENAI_API_KEY", hide_env_values = true, default_value = "")]
    api_key: String,

    /// Model to request
    #[arg(short = 'm', long, env = "RELAY_MODEL", value_name = "MODEL")]
    model: Option<String>,

    /// System message sent with every request
    #[arg(short = 's', long, value_name = "TEXT")]
    system: Option<String>,

    /// Send one message, print the reply and exit
    #[arg(long, value_name = "TEXT", conflicts_with_all = ["upload", "health"])]
    prompt: Option<String>,

    /// Upload a PDF and exit
    #[arg(long, value_name = "FILE", conflicts_with = "health")]
    upload: Option<PathBuf>,

    /// Print the proxy health report and exit
    #[arg(long)]
    health: bool,

    /// Configuration file path
    #[arg(short = 'c', long, env = "RELAY_CONFIG", value_name = "FILE")]
    config: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(short = 'l', long, env = "RELAY_LOG_LEVEL", default_value = "warn")]
    log_level: String,
}

impl Args {
    fn is_headless(&self) -> bool {
        self.prompt.is_some() || self.upload.is_some() || self.health
    }
}

/// Initialize logging
///
/// Headless runs log to stderr. The full-screen UI owns the terminal, so it
/// logs to a file under the state directory, or not at all if none exists.
fn init_logging(level: &str, headless: bool) {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(format!("relay_tui={level},relay_core={level}"))
    });

    if headless {
        tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_target(false)
            .with_writer(io::stderr)
            .init();
        return;
    }

    let Some(file) = log_dir().and_then(|dir| open_log_file(&dir)) else {
        return;
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_ansi(false)
        .with_writer(std::sync::Mutex::new(file))
        .init();
}

fn log_dir() -> Option<PathBuf> {
    dirs::state_dir()
        .or_else(dirs::cache_dir)
        .map(|dir| dir.join("relay-chat"))
}

fn open_log_file(dir: &Path) -> Option<std::fs::File> {
    std::fs::create_dir_all(dir).ok()?;
    std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(dir.join("relay-chat.log"))
        .ok()
}

fn load(args: &Args) -> anyhow::Result<RelayConfig> {
    let mut config = match &args.config {
        Some(path) => load_config_from_path(Some(path.clone())),
        None => load_config(),
    }
    .context("Failed to load configuration")?;

    ConfigOverrides {
        proxy_url: args.proxy.clone(),
        model: args.model.clone(),
        system_message: args.system.clone(),
        ..Default::default()
    }
    .apply(&mut config);
    config.validate().context("Invalid configuration")?;
    Ok(config)
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    init_logging(&args.log_level, args.is_headless());

    let config = load(&args)?;
    tracing::info!(
        proxy = %config.proxy_url,
        model = %config.model,
        source = %config.source(),
        "Configuration resolved"
    );

    let transport: Arc<dyn ChatTransport> =
        Arc::new(HttpTransport::from_config(&config).context("Failed to set up HTTP client")?);

    let mut session = ChatSession::new(args.api_key.clone()).with_model(config.model.clone());
    if let Some(system) = config.system_message.clone() {
        session = session.with_system_message(system);
    }

    if args.health {
        return headless::print_health(transport.as_ref(), &mut tokio::io::stdout()).await;
    }
    if let Some(path) = &args.upload {
        return headless::upload_file(
            transport.as_ref(),
            path,
            &args.api_key,
            &mut tokio::io::stdout(),
        )
        .await;
    }
    if let Some(prompt) = &args.prompt {
        return headless::run_prompt(transport, &mut session, prompt, &mut tokio::io::stdout())
            .await;
    }

    // Check if we have a TTY before attempting initialization
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        eprintln!("Error: relay-chat requires a terminal (TTY)");
        eprintln!();
        eprintln!("For scripts and pipes, use a headless mode:");
        eprintln!("  relay-chat --prompt \"hello\"");
        eprintln!("  relay-chat --health");
        eprintln!("  relay-chat --upload notes.pdf");
        std::process::exit(1);
    }

    // Set up panic hook to restore terminal
    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    // Initialize terminal
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let result = run_app(&mut terminal, session, transport).await;

    // Restore terminal
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}

async fn run_app(
    terminal: &mut StdoutTerminal,
    session: ChatSession,
    transport: Arc<dyn ChatTransport>,
) -> anyhow::Result<()> {
    let mut app = App::new(session, transport);
    app.run(terminal).await?;
    tracing::info!(
        messages = app.session().history().len(),
        "relay-chat closed"
    );
    Ok(())
}
