mod app;
mod draw;
mod keys;
mod state;
mod ui;

use crate::app::App;
use crate::state::app_settings::AppSettings;
use crate::state::countdown::TICK_INTERVAL;
use crate::state::fetcher::DeadlineFetcher;
use crate::state::messages::{FetchReason, NetworkRequest, NetworkResponse, UiEvent};
use crate::state::network::{LoadingState, NetworkWorker};
use crate::state::session::MemorySessionStore;
use crate::state::tasks::{self, TaskHandle};
use chrono::Utc;
use crossterm::event::{self as crossterm_event, Event};
use crossterm::{cursor, execute, terminal};
use fpl_api::client::FplApi;
use log::{error, info};
use std::io::Stdout;
use std::sync::Arc;
use std::time::Duration;
use std::{io, panic};
use tokio::sync::mpsc::error::TrySendError;
use tokio::sync::{Mutex, mpsc};
use tui::{Terminal, backend::CrosstermBackend};

const INPUT_POLL_INTERVAL: Duration = Duration::from_millis(100);

struct CliArgs {
    team_id: Option<String>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let Some(cli) = handle_cli_args() else {
        return Ok(());
    };

    better_panic::install();

    let backend = CrosstermBackend::new(io::stdout());
    let terminal = Terminal::new(backend)?;

    setup_panic_hook();
    setup_terminal()?;

    let mut settings = AppSettings::load();
    if cli.team_id.is_some() {
        settings.team_id = cli.team_id;
    }

    tui_logger::init_logger(log::LevelFilter::Trace)?;
    tui_logger::set_default_level(log::LevelFilter::Info);

    let (ui_event_tx, ui_event_rx) = mpsc::channel::<UiEvent>(100);
    let (network_req_tx, network_req_rx) = mpsc::channel::<NetworkRequest>(100);
    let (network_resp_tx, network_resp_rx) = mpsc::channel::<NetworkResponse>(100);

    let api = FplApi::new()
        .with_url(settings.deadline_url.clone())
        .with_timeout(settings.request_timeout);
    let timeout = api.timeout();
    let fetcher = Arc::new(DeadlineFetcher::new(Arc::new(api), timeout));
    info!("deadline source: {}", settings.deadline_url);

    let app = Arc::new(Mutex::new(App::new(
        settings,
        Box::new(MemorySessionStore::default()),
        network_req_tx.clone(),
    )));

    // Input handler thread
    let input_handler = TaskHandle::spawn(input_handler_task(ui_event_tx.clone()));

    // Network thread
    let network_worker = NetworkWorker::new(fetcher, network_req_rx, network_resp_tx);
    let network_task = TaskHandle::spawn(network_worker.run());

    // Countdown tick, once a second. A full channel just drops the tick.
    let tick_tx = ui_event_tx.clone();
    let countdown_task = tasks::every(TICK_INTERVAL, move || {
        !matches!(tick_tx.try_send(UiEvent::CountdownTick), Err(TrySendError::Closed(_)))
    });

    // Trigger the deadline fetch on startup
    let _ = ui_event_tx.send(UiEvent::AppStarted).await;

    main_ui_loop(terminal, app.clone(), ui_event_rx, network_req_tx, network_resp_rx).await;

    app.lock().await.shutdown();
    countdown_task.cancel();
    input_handler.cancel();
    network_task.cancel();

    cleanup_terminal();
    Ok(())
}

/// Returns None when the invocation was fully handled (help, version).
fn handle_cli_args() -> Option<CliArgs> {
    let mut cli = CliArgs { team_id: None };
    let mut args = std::env::args().skip(1);

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "-h" | "--help" => {
                println!("{}", usage_text());
                return None;
            }
            "-V" | "--version" => {
                println!("fpltui {}", env!("CARGO_PKG_VERSION"));
                return None;
            }
            "-t" | "--team" => match args.next() {
                Some(id) if !id.trim().is_empty() => cli.team_id = Some(id.trim().to_string()),
                _ => {
                    eprintln!("--team needs a team id\n\n{}", usage_text());
                    std::process::exit(2);
                }
            },
            _ => {
                eprintln!("Unknown argument: {arg}\n\n{}", usage_text());
                std::process::exit(2);
            }
        }
    }

    Some(cli)
}

fn usage_text() -> &'static str {
    "fpltui - Fantasy Premier League gameweek deadline countdown

Usage:
  fpltui [--team <id>]
  fpltui --help
  fpltui --version

Environment:
  FPLTUI_DEADLINE_URL   Gameweek feed or backend proxy route
                        (default https://fantasy.premierleague.com/api/bootstrap-static/)
  FPLTUI_TIMEOUT_SECS   Request timeout in seconds (default 10)
  FPLTUI_AUTO_REFRESH   Refetch at the proxy-declared refresh time (default true)
  FPLTUI_LOG_LEVEL      error, warn, info, debug or trace (default info)
  FPLTUI_TEAM_ID        FPL team id shown in the header"
}

async fn main_ui_loop(
    mut terminal: Terminal<CrosstermBackend<Stdout>>,
    app: Arc<Mutex<App>>,
    mut ui_events: mpsc::Receiver<UiEvent>,
    network_requests: mpsc::Sender<NetworkRequest>,
    mut network_responses: mpsc::Receiver<NetworkResponse>,
) {
    let mut loading = LoadingState::default();

    loop {
        tokio::select! {
            Some(ui_event) = ui_events.recv() => {
                let (should_redraw, should_quit) =
                    handle_ui_event(ui_event, &app, &network_requests).await;
                if should_quit {
                    break;
                }
                if should_redraw {
                    let app_guard = app.lock().await;
                    draw::draw(&mut terminal, &app_guard, loading);
                }
            }

            Some(response) = network_responses.recv() => {
                handle_network_response(response, &app, &mut loading).await;
                let app_guard = app.lock().await;
                draw::draw(&mut terminal, &app_guard, loading);
            }

            else => break,
        }
    }
}

/// Returns (should_redraw, should_quit).
async fn handle_ui_event(
    ui_event: UiEvent,
    app: &Arc<Mutex<App>>,
    network_requests: &mpsc::Sender<NetworkRequest>,
) -> (bool, bool) {
    match ui_event {
        UiEvent::AppStarted => {
            let _ = network_requests
                .send(NetworkRequest::FetchDeadline { reason: FetchReason::Startup })
                .await;
            (true, false)
        }
        UiEvent::KeyPressed(key_event) => {
            let quit = keys::handle_key_bindings(key_event, app, network_requests).await;
            (!quit, quit)
        }
        UiEvent::Resize => (true, false),
        UiEvent::CountdownTick => {
            let mut guard = app.lock().await;
            (guard.on_countdown_tick(Utc::now()), false)
        }
    }
}

async fn handle_network_response(
    response: NetworkResponse,
    app: &Arc<Mutex<App>>,
    loading: &mut LoadingState,
) {
    let mut guard = app.lock().await;
    match response {
        NetworkResponse::LoadingStateChanged { loading_state } => {
            *loading = loading_state;
            guard.on_loading_changed(loading_state);
        }
        NetworkResponse::DeadlineLoaded { outcome } => {
            guard.on_deadline_loaded(outcome, Utc::now());
        }
        NetworkResponse::Error { message } => {
            error!("Network error: {message}");
            guard.on_error(message);
        }
    }
}

/// Polls in short blocking slices so shutdown never waits on a pending read.
async fn input_handler_task(ui_events: mpsc::Sender<UiEvent>) {
    loop {
        let polled = tokio::task::spawn_blocking(|| -> io::Result<Option<Event>> {
            if crossterm_event::poll(INPUT_POLL_INTERVAL)? {
                crossterm_event::read().map(Some)
            } else {
                Ok(None)
            }
        })
        .await;

        let event = match polled {
            Ok(Ok(Some(event))) => event,
            Ok(Ok(None)) if ui_events.is_closed() => break,
            Ok(Ok(None)) => continue,
            Ok(Err(e)) => {
                error!("Failed to read terminal event: {e}");
                continue;
            }
            Err(_) => break,
        };

        let ui_event = match event {
            Event::Key(key_event) => Some(UiEvent::KeyPressed(key_event)),
            Event::Resize(_, _) => Some(UiEvent::Resize),
            _ => None,
        };

        if let Some(ui_event) = ui_event
            && ui_events.send(ui_event).await.is_err()
        {
            break;
        }
    }
}

fn setup_terminal() -> io::Result<()> {
    let mut stdout = io::stdout();
    execute!(stdout, cursor::Hide)?;
    execute!(stdout, terminal::EnterAlternateScreen)?;
    execute!(stdout, terminal::Clear(terminal::ClearType::All))?;
    terminal::enable_raw_mode()
}

fn cleanup_terminal() {
    let mut stdout = io::stdout();
    let _ = execute!(stdout, cursor::MoveTo(0, 0));
    let _ = execute!(stdout, terminal::Clear(terminal::ClearType::All));
    let _ = execute!(stdout, terminal::LeaveAlternateScreen);
    let _ = execute!(stdout, cursor::Show);
    let _ = terminal::disable_raw_mode();
}

fn setup_panic_hook() {
    panic::set_hook(Box::new(|panic_info| {
        cleanup_terminal();
        better_panic::Settings::auto().create_panic_handler()(panic_info);
    }));
}
