use std::sync::mpsc::Receiver;
use std::time::Duration;

use crossterm::event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use ratatui::{Terminal, backend::CrosstermBackend};
use tracing::debug;

use crate::app::{App, CatalogRequest, Tab};
use crate::catalog::{Book, CatalogFetcher, CatalogResponse};
use crate::config;
use crate::lyrics::{LyricFetcher, LyricResponse};
use crate::media::MediaSurface;
use crate::mpris::ControlCmd;
use crate::playback::{EngineEvent, Transport};
use crate::session::Session;
use crate::ui;

const INPUT_POLL: Duration = Duration::from_millis(50);

/// Whether the loop keeps going after handling an input.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// Everything that feeds the loop from other threads.
pub struct Inbox {
    pub engine: Receiver<EngineEvent>,
    pub lyrics: Receiver<LyricResponse>,
    pub catalog: Receiver<CatalogResponse>,
    pub control: Receiver<ControlCmd>,
}

/// The single-threaded side of the player: view model, session and the
/// workers it hands downloads to.
pub struct Player<T: Transport, M: MediaSurface> {
    pub app: App,
    pub session: Session<T, M>,
    lyric_fetcher: LyricFetcher,
    catalog_fetcher: CatalogFetcher,
    settings: config::Settings,
}

impl<T: Transport, M: MediaSurface> Player<T, M> {
    pub fn new(
        app: App,
        session: Session<T, M>,
        lyric_fetcher: LyricFetcher,
        catalog_fetcher: CatalogFetcher,
        settings: config::Settings,
    ) -> Self {
        Self {
            app,
            session,
            lyric_fetcher,
            catalog_fetcher,
            settings,
        }
    }

    pub fn request_catalog(&self, req: CatalogRequest) {
        self.catalog_fetcher.request(req.generation, req.book);
    }

    /// Apply everything that arrived since the last tick, in arrival order
    /// per channel.
    pub fn drain(&mut self, inbox: &Inbox) -> Flow {
        while let Ok(ev) = inbox.engine.try_recv() {
            self.session.handle_event(ev);
        }
        while let Ok(resp) = inbox.catalog.try_recv() {
            if !self.app.apply_catalog(resp) {
                debug!("dropping stale catalog response");
            }
        }
        while let Ok(cmd) = inbox.control.try_recv() {
            if self.on_control(cmd) == Flow::Quit {
                return Flow::Quit;
            }
        }
        // After controls, so a response for a track that was just left is dropped.
        self.sync_lyrics();
        while let Ok(resp) = inbox.lyrics.try_recv() {
            if !self.app.lyrics.apply(resp.generation, resp.text) {
                debug!(generation = resp.generation, "dropping stale lyrics");
            }
        }
        self.sync_lyrics();
        Flow::Continue
    }

    /// Bind the lyric pane to the session's current track and position.
    pub fn sync_lyrics(&mut self) {
        let state = self.session.state();
        if let Some(req) = self.app.lyrics.track_changed(state.current_track()) {
            debug!(url = %req.url, generation = req.generation, "fetching lyrics");
            self.lyric_fetcher.request(req);
            self.app.follow_queue(state.current_index);
        }
        self.app.lyrics.update_position(state.current_time);
    }

    pub fn on_control(&mut self, cmd: ControlCmd) -> Flow {
        let playing = self.session.state().is_playing;
        match cmd {
            ControlCmd::Quit => return Flow::Quit,
            ControlCmd::Play if !playing => self.session.toggle(),
            ControlCmd::Play => {}
            ControlCmd::Pause if playing => self.session.pause(),
            ControlCmd::Pause => {}
            ControlCmd::PlayPause => self.session.toggle(),
            ControlCmd::Stop => self.session.stop(),
            ControlCmd::Next => self.session.next(),
            ControlCmd::Prev => self.session.prev(),
            ControlCmd::SeekBy(delta) => {
                let target = self.session.state().current_time + delta;
                self.session.seek(target);
            }
            ControlCmd::SeekTo(position) => self.session.seek(position),
            ControlCmd::SetRate(rate) => self.session.set_playback_rate(rate),
        }
        Flow::Continue
    }

    pub fn on_key(&mut self, key: KeyEvent) -> Flow {
        if self.app.filter_mode {
            self.on_filter_key(key);
            return Flow::Continue;
        }

        let queue_len = self.session.state().queue.len();
        match key.code {
            KeyCode::Char('q') => return Flow::Quit,
            KeyCode::Char(c @ '1'..='4') => {
                let book = c.to_digit(10).and_then(|n| Book::from_number(n as u8));
                if let Some(book) = book
                    && (book != self.app.book || !self.app.has_lessons())
                {
                    let req = self.app.set_book(book);
                    self.request_catalog(req);
                }
            }
            KeyCode::Char('r') => {
                let req = self.app.reload();
                self.request_catalog(req);
            }
            KeyCode::Tab => {
                self.app.toggle_tab();
                self.app.follow_queue(self.session.state().current_index);
            }
            KeyCode::Char('j') | KeyCode::Down => self.app.next(queue_len),
            KeyCode::Char('k') | KeyCode::Up => self.app.prev(queue_len),
            KeyCode::Enter => self.play_selection(),
            KeyCode::Char(' ') | KeyCode::Char('p') => self.session.toggle(),
            KeyCode::Char('h') => self.session.prev(),
            KeyCode::Char('l') => self.session.next(),
            KeyCode::Char('H') => self.seek_by(-(self.settings.controls.seek_seconds as f64)),
            KeyCode::Char('L') => self.seek_by(self.settings.controls.seek_seconds as f64),
            KeyCode::Char('[') => self.step_rate(-self.settings.playback.rate_step),
            KeyCode::Char(']') => self.step_rate(self.settings.playback.rate_step),
            KeyCode::Char('=') => self
                .session
                .set_playback_rate(self.settings.playback.default_rate),
            KeyCode::Char('/') => self.app.enter_filter_mode(),
            KeyCode::Char('x') => self.session.clear_error(),
            _ => {}
        }
        Flow::Continue
    }

    fn on_filter_key(&mut self, key: KeyEvent) {
        let ctrl = key.modifiers.contains(KeyModifiers::CONTROL);
        match key.code {
            KeyCode::Esc => self.app.clear_filter(),
            KeyCode::Backspace => self.app.pop_filter_char(),
            KeyCode::Down => self.app.next(0),
            KeyCode::Up => self.app.prev(0),
            KeyCode::Char('j') | KeyCode::Char('n') if ctrl => self.app.next(0),
            KeyCode::Char('k') | KeyCode::Char('p') if ctrl => self.app.prev(0),
            KeyCode::Enter => {
                if self.app.visible_lessons().is_empty() {
                    return;
                }
                self.app.exit_filter_mode();
                self.play_selection();
            }
            KeyCode::Char(c) if !c.is_control() => self.app.push_filter_char(c),
            _ => {}
        }
    }

    fn play_selection(&mut self) {
        match self.app.tab {
            Tab::Lessons => {
                if let Some((queue, index)) = self.app.queue_from_selection() {
                    self.session.set_queue_and_play(queue, index);
                    self.app.tab = Tab::Queue;
                    self.app.follow_queue(self.session.state().current_index);
                }
            }
            Tab::Queue => {
                if !self.session.state().queue.is_empty() {
                    self.session.play_index(self.app.queue_cursor);
                }
            }
        }
    }

    fn seek_by(&mut self, delta: f64) {
        let target = self.session.state().current_time + delta;
        self.session.seek(target);
    }

    fn step_rate(&mut self, delta: f32) {
        let rate = self.session.state().playback_rate + delta;
        self.session.set_playback_rate(rate);
    }
}

/// Main terminal event loop: drains worker channels, draws, and handles
/// input. Returns `Ok(())` when shutdown is requested.
pub fn run<T: Transport, M: MediaSurface>(
    terminal: &mut Terminal<CrosstermBackend<std::io::Stdout>>,
    player: &mut Player<T, M>,
    inbox: &Inbox,
) -> std::io::Result<()> {
    loop {
        if player.drain(inbox) == Flow::Quit {
            return Ok(());
        }

        terminal.draw(|f| {
            ui::draw(
                f,
                &player.app,
                player.session.state(),
                &player.settings.ui,
                &player.settings.controls,
            )
        })?;

        if event::poll(INPUT_POLL)?
            && let Event::Key(key) = event::read()?
            && key.kind == KeyEventKind::Press
            && player.on_key(key) == Flow::Quit
        {
            return Ok(());
        }
    }
}
