//! Thin CLI entry point, grounded in `main.rs`'s shape
//! (clap-derived args, `tracing_subscriber` init, then hand off to the
//! application loop) but adapted to a single synchronous TUI process
//! instead of a server/tui/cli mode switch.

use clap::Parser;
use codewright::commands::{dispatch, register_builtin_commands, CommandHost, CommandRegistry};
use codewright::config::Settings;
use codewright::provider::{detect, Provider};
use codewright::tui::{handle_key_event, App, KeyOutcome};
use codewright::{logging, router};
use crossterm::event::{self, Event};
use crossterm::execute;
use crossterm::terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen};
use ratatui::backend::CrosstermBackend;
use ratatui::Terminal;
use std::io;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{error, info, warn};

const EXIT_OK: i32 = 0;
const EXIT_NO_PROVIDER: i32 = 1;
const EXIT_SETTINGS_CORRUPT: i32 = 2;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Enable verbose (debug-level) logging.
    #[arg(short, long)]
    verbose: bool,

    /// Settings file path.
    #[arg(short, long, default_value = "codewright.toml")]
    config: PathBuf,

    /// Directory log files are written to.
    #[arg(long, default_value = "./logs")]
    log_dir: PathBuf,
}

fn load_settings(path: &PathBuf) -> Result<Settings, std::io::Error> {
    if !path.exists() {
        return Ok(Settings::default());
    }
    let raw = std::fs::read_to_string(path)?;
    toml::from_str(&raw).map_err(|e| std::io::Error::new(std::io::ErrorKind::InvalidData, e))
}

fn main() {
    let args = Args::parse();
    let _guard = logging::init(&args.log_dir, args.verbose);

    info!("starting codewright");

    let settings = match load_settings(&args.config) {
        Ok(settings) => settings,
        Err(err) => {
            error!(error = %err, path = %args.config.display(), "settings file is corrupt");
            eprintln!("error: could not read {}: {err}", args.config.display());
            std::process::exit(EXIT_SETTINGS_CORRUPT);
        }
    };

    let descriptor = match detect::scan_live(settings.preferred_provider) {
        Some(descriptor) => descriptor,
        None => {
            error!("no provider detected on any known port");
            eprintln!("error: no locally-hosted model server was found. Run /setup once one is running.");
            std::process::exit(EXIT_NO_PROVIDER);
        }
    };
    info!(provider = ?descriptor.provider_type, base_url = %descriptor.base_url, "provider detected");

    let timeout = settings.request_timeout;
    let transport = Box::new(codewright::provider::transport::UreqTransport::new(timeout));
    let provider = Provider::from_descriptor(&descriptor, transport);
    let model = pick_initial_model(&provider, settings.current_model.clone());

    let mut registry = CommandRegistry::new();
    if let Err(err) = register_builtin_commands(&mut registry) {
        error!(error = %err, "failed to register builtin commands");
        std::process::exit(EXIT_SETTINGS_CORRUPT);
    }

    let project_root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
    let mut app = App::new(settings, project_root);
    app.set_provider(provider);
    if let Some(model) = model {
        app.set_current_model(model);
    }

    if let Err(err) = run_tui(&mut app, &mut registry) {
        error!(error = %err, "tui loop exited with an error");
        eprintln!("error: {err}");
        std::process::exit(EXIT_SETTINGS_CORRUPT);
    }

    info!("codewright exited normally");
    std::process::exit(EXIT_OK);
}

/// Picks the model to start with: the one named in settings if the
/// provider still has it, otherwise the first model the provider
/// reports (if any). A missing model list is not fatal — startup
/// proceeds and `/models` will surface the failure to the user.
fn pick_initial_model(provider: &Provider, preferred: Option<String>) -> Option<String> {
    let models = match provider.list_models() {
        Ok(models) => models,
        Err(err) => {
            warn!(error = %err, "could not list models at startup");
            return preferred;
        }
    };
    if let Some(name) = &preferred {
        if models.iter().any(|m| &m.name == name) {
            return preferred;
        }
    }
    models.into_iter().next().map(|m| m.name)
}

fn run_tui(app: &mut App, registry: &mut CommandRegistry) -> io::Result<()> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let result = event_loop(app, registry, &mut terminal);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;
    result
}

fn event_loop(
    app: &mut App,
    registry: &mut CommandRegistry,
    terminal: &mut Terminal<CrosstermBackend<io::Stdout>>,
) -> io::Result<()> {
    let mut input_buffer = String::new();
    let mut footer: Option<String> = None;

    loop {
        if app.should_quit() {
            return Ok(());
        }

        app.tick();

        codewright::tui::view::render(terminal, app, &input_buffer, footer.as_deref())?;

        if event::poll(Duration::from_millis(50))? {
            if let Event::Key(key) = event::read()? {
                match handle_key_event(app, &mut input_buffer, key) {
                    KeyOutcome::Exit => return Ok(()),
                    KeyOutcome::Submit => {
                        let submitted = std::mem::take(&mut input_buffer);
                        if submitted.starts_with('/') {
                            if let Some(result) = dispatch(&submitted, registry, app) {
                                if result.should_exit {
                                    app.quit();
                                }
                                footer = Some(result.message);
                            }
                        } else if let Some(provider_handle) = app.provider_handle() {
                            let model = app.current_model().unwrap_or_else(|| "default".to_string());
                            let extractor = router::ProviderIntentExtractor::new(&provider_handle, model);
                            if let Some(result) = app.submit_input(&submitted, registry, &extractor) {
                                if result.should_exit {
                                    app.quit();
                                }
                                footer = Some(result.message);
                            }
                        }
                    }
                    KeyOutcome::Continue => {}
                }
            }
        }
    }
}
