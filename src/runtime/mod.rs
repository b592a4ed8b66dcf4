use std::sync::mpsc;
use std::time::Duration;

use anyhow::Context;
use crossterm::execute;
use crossterm::terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::{info, warn};

use crate::app::App;
use crate::catalog::{Book, CatalogFetcher, CatalogResponse};
use crate::lyrics::{LyricFetcher, LyricResponse};
use crate::media::{MediaSurface, NoMediaSurface};
use crate::mpris::ControlCmd;
use crate::playback::AudioEngine;
use crate::session::Session;

mod event_loop;
mod settings;

pub use event_loop::{Flow, Inbox, Player};
pub use settings::{Invocation, USAGE, default_config_toml, parse_args};

pub fn run(book: Option<Book>) -> anyhow::Result<()> {
    let (settings, config_warning) = settings::load_settings();

    let log_file = crate::logging::init(&settings.logging);
    info!(version = env!("CARGO_PKG_VERSION"), log = ?log_file, "starting");
    if let Some(w) = config_warning {
        warn!("{w}; using defaults");
    }

    let request_timeout = Duration::from_secs(settings.catalog.timeout_secs);
    let client = crate::remote::build_client(request_timeout).context("cannot create HTTP client")?;
    let audio_client =
        crate::remote::build_audio_client(request_timeout).context("cannot create HTTP client")?;

    let (engine, engine_rx) = AudioEngine::spawn(audio_client, settings.audio.clone());

    let (control_tx, control_rx) = mpsc::channel::<ControlCmd>();
    let media: Box<dyn MediaSurface> = if settings.controls.media_keys {
        Box::new(crate::mpris::spawn_mpris(control_tx))
    } else {
        info!("media keys disabled");
        Box::new(NoMediaSurface)
    };

    let (lyric_tx, lyric_rx) = mpsc::channel::<LyricResponse>();
    let (catalog_tx, catalog_rx) = mpsc::channel::<CatalogResponse>();
    let lyric_fetcher = LyricFetcher::new(client.clone(), lyric_tx);
    let catalog_fetcher = CatalogFetcher::new(client, settings.catalog.base_url.clone(), catalog_tx);

    let book = book
        .or_else(|| Book::from_number(settings.ui.initial_book))
        .unwrap_or_default();
    let (app, first_request) = App::new(book);
    let session = Session::new(engine, media, settings.playback.default_rate);
    let fade_out = Duration::from_millis(settings.audio.quit_fade_out_ms);

    let mut player = Player::new(app, session, lyric_fetcher, catalog_fetcher, settings);
    player.request_catalog(first_request);

    let inbox = Inbox {
        engine: engine_rx,
        lyrics: lyric_rx,
        catalog: catalog_rx,
        control: control_rx,
    };

    enable_raw_mode().context("cannot enable raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;

    let run_result = event_loop::run(&mut terminal, &mut player, &inbox);

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    player.session.transport().shutdown(fade_out);
    info!("bye");

    run_result.context("terminal I/O failed")
}
