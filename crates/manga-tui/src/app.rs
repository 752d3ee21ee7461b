//! App — component-based event loop.
//!
//! Architecture:
//! - `App` owns all components and `AppState` (shared read-only data for components).
//! - A `tokio::mpsc` channel carries `AppMessage` events in from background tasks
//!   (terminal input, catalog responses, carousel ticks).
//! - The event loop draws each frame, then awaits the next message.
//! - Components return `Vec<Action>`; App dispatches each Action.

use std::future::Future;
use std::io;
use std::time::Duration;

use manga_proto::catalog::CatalogClient;
use manga_proto::config::Config;
use manga_proto::protocol::{ChapterImages, FeaturedItem, MangaPage, PopularManga};
use ratatui::crossterm::{
    event::{
        self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
        KeyModifiers, MouseEvent, MouseEventKind,
    },
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use ratatui::{
    backend::CrosstermBackend,
    layout::{Constraint, Direction, Layout, Rect},
    Terminal,
};
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::{
    action::{Action, ComponentId, Screen},
    app_state::{ActiveExport, AppState, SavedExport},
    carousel::CarouselTick,
    component::Component,
    components::{
        carousel_view::CarouselView, chapter_reader::ChapterReader,
        download_wizard::DownloadWizard, help_overlay::HelpOverlay, manga_detail::MangaDetail,
        popular_strip::PopularStrip,
    },
    export_manager::{ExportManager, ExportStatus},
    focus::FocusRing,
    widgets::{
        status_bar::{self, InputMode},
        toast::{Severity, ToastManager},
    },
    wizard::{fetch_info, InfoLoaded},
};

/// Screens remembered for `Back`.
const MAX_HISTORY: usize = 32;

// ── Internal event bus ────────────────────────────────────────────────────────

pub(crate) enum AppMessage {
    Event(Event),
    FeaturedLoaded(Result<Vec<FeaturedItem>, String>),
    PopularLoaded(Result<Vec<PopularManga>, String>),
    MangaLoaded {
        title: String,
        result: Result<MangaPage, String>,
    },
    ChapterLoaded {
        manga: String,
        chapter: String,
        result: Result<ChapterImages, String>,
    },
    InfoLoaded(InfoLoaded),
    CarouselTick(CarouselTick),
}

/// Last-drawn pane areas, for mouse hit-testing.
#[derive(Debug, Clone, Copy, Default)]
struct PaneAreas {
    carousel: Rect,
    popular: Rect,
    body: Rect,
}

pub struct App {
    state: AppState,
    client: CatalogClient,

    // ── Components ───────────────────────────────────────────────────────────
    carousel: CarouselView,
    popular: PopularStrip,
    detail: MangaDetail,
    reader: ChapterReader,
    wizard: DownloadWizard,
    help_overlay: HelpOverlay,

    focus: FocusRing,
    history: Vec<Screen>,
    exports: ExportManager,
    toast: ToastManager,
    pane_areas: PaneAreas,

    tx: mpsc::Sender<AppMessage>,
    rx: Option<mpsc::Receiver<AppMessage>>,
    should_quit: bool,
}

impl App {
    pub fn new(config: Config, client: CatalogClient) -> Self {
        let (tx, rx) = mpsc::channel::<AppMessage>(1024);
        let exports = ExportManager::new(client.clone(), config.paths.downloads_dir.clone());
        Self {
            carousel: CarouselView::new(
                config.carousel.advance_interval(),
                config.carousel.upcoming_window,
            ),
            popular: PopularStrip::new(&config.popular),
            detail: MangaDetail::new(),
            reader: ChapterReader::new(),
            wizard: DownloadWizard::new(),
            help_overlay: HelpOverlay::new(),
            focus: FocusRing::new(Self::focus_items(Screen::Browse)),
            history: Vec::new(),
            exports,
            toast: ToastManager::new(),
            pane_areas: PaneAreas::default(),
            state: AppState::new(config),
            client,
            tx,
            rx: Some(rx),
            should_quit: false,
        }
    }

    /// Kick off the initial browse-screen fetches.
    fn start(&mut self) {
        info!("catalog at {}", self.client.base_url());
        self.load_browse();
    }

    pub async fn run(mut self) -> anyhow::Result<()> {
        let mut rx = self
            .rx
            .take()
            .ok_or_else(|| anyhow::anyhow!("app is already running"))?;

        debug!("run(): enabling raw mode");
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
        let backend = CrosstermBackend::new(stdout);
        let mut terminal = Terminal::new(backend)?;
        debug!("run(): terminal created, size={:?}", terminal.size());

        self.start();

        // ── Background task: keyboard/mouse events ────────────────────────────
        let event_tx = self.tx.clone();
        tokio::task::spawn_blocking(move || loop {
            match event::read() {
                Ok(ev) => {
                    if event_tx.blocking_send(AppMessage::Event(ev)).is_err() {
                        break;
                    }
                }
                Err(_) => break,
            }
        });

        // ── Periodic timers ───────────────────────────────────────────────────
        // Toast expiry check + spinner animation.
        let mut toast_tick = tokio::time::interval(Duration::from_millis(100));
        toast_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // Export progress + carousel countdown bar.
        let mut ui_tick = tokio::time::interval(Duration::from_millis(100));
        ui_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

        // ── Main loop ─────────────────────────────────────────────────────────
        let mut needs_redraw = true;
        loop {
            if needs_redraw {
                terminal.draw(|f| self.draw(f))?;
            }
            needs_redraw = false;

            if self.should_quit {
                break;
            }

            tokio::select! {
                Some(msg) = rx.recv() => {
                    const MAX_DRAIN: usize = 256;
                    let mut redraw = self.handle_message(msg);
                    let mut drained = 0usize;
                    while drained < MAX_DRAIN {
                        let Ok(next) = rx.try_recv() else { break };
                        drained += 1;
                        redraw |= self.handle_message(next);
                    }
                    needs_redraw = redraw;
                }

                _ = ui_tick.tick() => {
                    self.on_ui_tick();
                    needs_redraw = true;
                }

                _ = toast_tick.tick() => {
                    if !self.toast.is_empty() {
                        self.toast.tick();
                        needs_redraw = true;
                    }
                }
            }

            if self.should_quit {
                break;
            }
        }

        // ── Teardown ──────────────────────────────────────────────────────────
        self.carousel.disarm();
        disable_raw_mode()?;
        execute!(
            terminal.backend_mut(),
            LeaveAlternateScreen,
            DisableMouseCapture
        )?;
        terminal.show_cursor()?;

        Ok(())
    }

    // ── Messages ──────────────────────────────────────────────────────────────

    /// Apply one message. Returns whether the screen needs a redraw.
    fn handle_message(&mut self, msg: AppMessage) -> bool {
        match msg {
            AppMessage::Event(Event::Key(key)) => {
                for action in self.handle_key(key) {
                    self.dispatch(action);
                }
                self.sync_input_mode();
                true
            }
            AppMessage::Event(Event::Mouse(mouse)) => {
                let actions = self.handle_mouse(mouse);
                let redraw = !actions.is_empty()
                    || !matches!(mouse.kind, MouseEventKind::Moved | MouseEventKind::Drag(_));
                for action in actions {
                    self.dispatch(action);
                }
                self.sync_input_mode();
                redraw
            }
            AppMessage::Event(Event::Resize(..)) => true,
            AppMessage::Event(_) => false,

            AppMessage::FeaturedLoaded(result) => {
                if self.state.screen != Screen::Browse {
                    debug!("featured: dropping result, browse screen not shown");
                    return false;
                }
                match result {
                    Ok(items) => {
                        info!("featured: {} items", items.len());
                        self.state.featured_error = None;
                        self.carousel.set_featured(items);
                    }
                    Err(e) => {
                        warn!("featured: {}", e);
                        self.state.featured_error = Some(e);
                        self.carousel.set_featured(Vec::new());
                    }
                }
                self.sync_carousel_timer();
                true
            }
            AppMessage::PopularLoaded(result) => {
                match result {
                    Ok(items) => {
                        info!("popular: {} items", items.len());
                        self.state.popular_error = None;
                        self.popular.set_popular(items);
                    }
                    Err(e) => {
                        warn!("popular: {}", e);
                        self.state.popular_error = Some(e);
                        self.popular.set_popular(Vec::new());
                    }
                }
                true
            }
            AppMessage::MangaLoaded { title, result } => {
                if let Err(e) = &result {
                    warn!("mangapage {:?}: {}", title, e);
                }
                self.detail.apply_page(&title, result)
            }
            AppMessage::ChapterLoaded {
                manga,
                chapter,
                result,
            } => {
                if let Err(e) = &result {
                    warn!("chapterimages {:?}/{:?}: {}", manga, chapter, e);
                }
                self.reader.apply_images(&manga, &chapter, result)
            }
            AppMessage::InfoLoaded(loaded) => {
                let failed = loaded.result.is_err();
                let title = loaded.title.clone();
                let applied = self.wizard.apply_info(loaded);
                if applied && failed {
                    self.toast.info(format!("no chapters found for {}", title));
                }
                applied
            }
            AppMessage::CarouselTick(tick) => self.carousel.on_tick(tick),
        }
    }

    fn on_ui_tick(&mut self) {
        for done in self.exports.update_statuses() {
            match done.status {
                ExportStatus::Saved { path, at } => {
                    let name = path
                        .file_name()
                        .map(|n| n.to_string_lossy().into_owned())
                        .unwrap_or_else(|| done.key.clone());
                    self.toast.resolve_spinner(Severity::Success, format!("saved {}", name));
                    self.state.last_saved = Some(SavedExport { path, at });
                }
                ExportStatus::Failed(e) => {
                    self.toast
                        .resolve_spinner(Severity::Error, format!("export failed: {}", e));
                }
                ExportStatus::Idle | ExportStatus::Exporting(_) => {}
            }
        }
        self.state.active_export = self.exports.active().map(|(key, progress)| ActiveExport {
            key: key.to_string(),
            progress,
        });
        if let Some(export) = &self.state.active_export {
            if !self.toast.has_spinner() {
                self.toast.spinner(format!("exporting {}", export.key));
            }
        }
    }

    // ── Background requests ───────────────────────────────────────────────────

    /// Run `request` on the runtime and feed its message back into the loop.
    fn spawn_request<F>(&self, request: F)
    where
        F: Future<Output = AppMessage> + Send + 'static,
    {
        let tx = self.tx.clone();
        tokio::spawn(async move {
            let _ = tx.send(request.await).await;
        });
    }

    fn load_browse(&self) {
        let client = self.client.clone();
        self.spawn_request(async move {
            AppMessage::FeaturedLoaded(client.featured().await.map_err(|e| e.to_string()))
        });
        let client = self.client.clone();
        self.spawn_request(async move {
            AppMessage::PopularLoaded(client.popular().await.map_err(|e| e.to_string()))
        });
    }

    fn sync_carousel_timer(&mut self) {
        let tx = self.tx.clone();
        self.carousel.sync_timer(&tx, AppMessage::CarouselTick);
    }

    // ── Screens ───────────────────────────────────────────────────────────────

    fn focus_items(screen: Screen) -> Vec<ComponentId> {
        match screen {
            Screen::Browse => vec![ComponentId::Carousel, ComponentId::PopularStrip],
            Screen::Detail => vec![ComponentId::MangaDetail],
            Screen::Reader => vec![ComponentId::ChapterReader],
            Screen::Download => vec![ComponentId::DownloadWizard],
        }
    }

    fn focused_component(&self) -> ComponentId {
        self.focus.current().unwrap_or(ComponentId::Carousel)
    }

    /// Leave the current screen for `screen`. Leaving browse stops the
    /// carousel; entering it refetches both lists.
    fn switch_screen(&mut self, screen: Screen, remember: bool) {
        let from = self.state.screen;
        if from == screen {
            return;
        }
        info!("screen: {} -> {}", from.label(), screen.label());
        if remember {
            self.history.push(from);
            if self.history.len() > MAX_HISTORY {
                self.history.remove(0);
            }
        }
        if from == Screen::Browse {
            self.carousel.disarm();
        }
        self.state.screen = screen;
        self.focus.set_items(Self::focus_items(screen));
        if screen == Screen::Browse {
            self.load_browse();
        }
        self.sync_input_mode();
    }

    fn go_back(&mut self) {
        match self.history.pop() {
            Some(prev) => self.switch_screen(prev, false),
            None => self.switch_screen(Screen::Browse, false),
        }
    }

    // ── Key handling ──────────────────────────────────────────────────────────

    fn handle_key(&mut self, key: KeyEvent) -> Vec<Action> {
        if key.kind == KeyEventKind::Release {
            return vec![];
        }
        if key.code == KeyCode::Char('c') && key.modifiers == KeyModifiers::CONTROL {
            return vec![Action::Quit];
        }

        // Help overlay captures all keys when visible
        if self.help_overlay.visible {
            return self.help_overlay.handle_key(key, &self.state);
        }

        // Global keys (Normal mode only)
        if self.state.input_mode == InputMode::Normal {
            let screen = self.state.screen;
            match key.code {
                KeyCode::Char('q') if key.modifiers == KeyModifiers::NONE => {
                    return vec![Action::Quit];
                }
                KeyCode::Char('?') => return vec![Action::ToggleHelp],
                KeyCode::Tab => return vec![Action::FocusNext],
                KeyCode::BackTab => return vec![Action::FocusPrev],
                KeyCode::Char('1') => return vec![Action::SwitchScreen(Screen::Browse)],
                KeyCode::Char('2') => return vec![Action::SwitchScreen(Screen::Detail)],
                KeyCode::Char('3') => return vec![Action::SwitchScreen(Screen::Reader)],
                // On the detail screen `d` carries the title along
                KeyCode::Char('d') if screen != Screen::Detail => {
                    return vec![Action::SwitchScreen(Screen::Download)];
                }
                KeyCode::Esc if screen != Screen::Browse => return vec![Action::Back],
                _ => {}
            }
        }

        // Dispatch to the focused component
        let s = &self.state;
        match self.focused_component() {
            ComponentId::Carousel => self.carousel.handle_key(key, s),
            ComponentId::PopularStrip => self.popular.handle_key(key, s),
            ComponentId::MangaDetail => self.detail.handle_key(key, s),
            ComponentId::ChapterReader => self.reader.handle_key(key, s),
            ComponentId::DownloadWizard => self.wizard.handle_key(key, s),
            ComponentId::HelpOverlay => self.help_overlay.handle_key(key, s),
        }
    }

    // ── Mouse handling ────────────────────────────────────────────────────────

    fn handle_mouse(&mut self, event: MouseEvent) -> Vec<Action> {
        let is_click = matches!(
            event.kind,
            MouseEventKind::Down(_)
                | MouseEventKind::ScrollUp
                | MouseEventKind::ScrollDown
                | MouseEventKind::ScrollLeft
                | MouseEventKind::ScrollRight
        );
        if !is_click || self.help_overlay.visible {
            return vec![];
        }

        let col = event.column;
        let row = event.row;

        fn hit(r: Rect, col: u16, row: u16) -> bool {
            r.width > 0
                && r.height > 0
                && col >= r.x
                && col < r.x + r.width
                && row >= r.y
                && row < r.y + r.height
        }

        let areas = self.pane_areas;
        let focused = self.focused_component();
        let s = &self.state;

        // Focus follows the click on the browse screen.
        macro_rules! click_pane {
            ($id:expr, $component:expr, $area:expr) => {{
                let mut actions = $component.handle_mouse(event, $area, s);
                if focused != $id {
                    actions.insert(0, Action::FocusPane($id));
                }
                return actions;
            }};
        }

        match s.screen {
            Screen::Browse => {
                if hit(areas.carousel, col, row) {
                    click_pane!(ComponentId::Carousel, self.carousel, areas.carousel);
                }
                if hit(areas.popular, col, row) {
                    click_pane!(ComponentId::PopularStrip, self.popular, areas.popular);
                }
                vec![]
            }
            _ if !hit(areas.body, col, row) => vec![],
            Screen::Detail => self.detail.handle_mouse(event, areas.body, s),
            Screen::Reader => self.reader.handle_mouse(event, areas.body, s),
            Screen::Download => self.wizard.handle_mouse(event, areas.body, s),
        }
    }

    // ── Action dispatcher ─────────────────────────────────────────────────────

    fn dispatch(&mut self, action: Action) {
        // Broadcast action to all components first
        let secondary: Vec<Action> = {
            let s = &self.state;
            let mut out = Vec::new();
            out.extend(self.carousel.on_action(&action, s));
            out.extend(self.popular.on_action(&action, s));
            out.extend(self.detail.on_action(&action, s));
            out.extend(self.reader.on_action(&action, s));
            out.extend(self.wizard.on_action(&action, s));
            out.extend(self.help_overlay.on_action(&action, s));
            out
        };

        // Handle the action at the app level
        self.apply_action(action);

        // Dispatch any secondary actions (depth-limited to 1 level)
        for a in secondary {
            self.apply_action(a);
        }
    }

    fn apply_action(&mut self, action: Action) {
        if action != Action::Noop {
            debug!("apply_action: {:?}", action);
        }
        match action {
            // ── Navigation ────────────────────────────────────────────────────
            Action::FocusNext => {
                self.focus.next();
            }
            Action::FocusPrev => {
                self.focus.prev();
            }
            Action::FocusPane(id) => self.focus.set(id),
            Action::SwitchScreen(screen) => self.switch_screen(screen, true),
            Action::Back => self.go_back(),
            Action::OpenManga(title) => {
                self.switch_screen(Screen::Detail, true);
                let client = self.client.clone();
                self.spawn_request(async move {
                    let result = client.manga_page(&title).await.map_err(|e| e.to_string());
                    AppMessage::MangaLoaded { title, result }
                });
            }
            Action::OpenChapter { manga, chapter } => {
                self.switch_screen(Screen::Reader, true);
                let client = self.client.clone();
                self.spawn_request(async move {
                    let result = client
                        .chapter_images(&manga, &chapter)
                        .await
                        .map_err(|e| e.to_string());
                    AppMessage::ChapterLoaded {
                        manga,
                        chapter,
                        result,
                    }
                });
            }

            // ── Download wizard ───────────────────────────────────────────────
            Action::PrefillDownload(_) => self.switch_screen(Screen::Download, true),
            Action::FetchTitleInfo(title) => {
                let client = self.client.clone();
                self.spawn_request(async move {
                    AppMessage::InfoLoaded(fetch_info(&client, title).await)
                });
            }
            Action::StartExport(request) => match self.exports.start_export(request) {
                Ok(key) => {
                    self.toast.spinner(format!("exporting {}", key));
                    self.state.active_export = Some(ActiveExport { key, progress: 0.0 });
                }
                Err(e) => {
                    warn!("export refused: {}", e);
                    self.toast.warning(e);
                }
            },

            // ── UI ────────────────────────────────────────────────────────────
            Action::OpenInput | Action::CloseInput => self.sync_input_mode(),
            Action::CopyToClipboard(text) => {
                match arboard::Clipboard::new().and_then(|mut cb| cb.set_text(text.clone())) {
                    Ok(()) => {
                        // Truncate for toast display
                        let display = if text.chars().count() > 40 {
                            format!("{}…", text.chars().take(40).collect::<String>())
                        } else {
                            text.clone()
                        };
                        self.toast.success(format!("copied: {}", display));
                    }
                    Err(e) => {
                        warn!("clipboard error: {}", e);
                        self.toast.error(format!("clipboard error: {}", e));
                    }
                }
            }

            // ── System ────────────────────────────────────────────────────────
            Action::Quit => {
                self.should_quit = true;
            }

            // Handled at component level / no-op here
            Action::CarouselNext
            | Action::CarouselPrev
            | Action::CarouselJump(_)
            | Action::WizardAdvance
            | Action::WizardRetreat
            | Action::ToggleHelp
            | Action::Noop => {}
        }
    }

    fn sync_input_mode(&mut self) {
        let editing = match self.focused_component() {
            ComponentId::MangaDetail => self.detail.is_editing(),
            ComponentId::DownloadWizard => self.wizard.is_editing(),
            _ => false,
        };
        self.state.input_mode = if editing {
            InputMode::Editing
        } else {
            InputMode::Normal
        };
    }

    // ── Drawing ───────────────────────────────────────────────────────────────

    fn draw(&mut self, frame: &mut ratatui::Frame) {
        use crate::theme::C_BG;
        use ratatui::widgets::Block;
        let area = frame.area();

        frame.render_widget(
            Block::default().style(ratatui::style::Style::default().bg(C_BG)),
            area,
        );

        // ── Outer layout: tabs | body | keys bar ──────────────────────────────
        let outer = Layout::default()
            .direction(Direction::Vertical)
            .constraints([
                Constraint::Length(1),
                Constraint::Min(0),
                Constraint::Length(1),
            ])
            .split(area);
        let body = outer[1];

        status_bar::draw_tabs(frame, outer[0], self.state.screen);
        status_bar::draw_keys_bar(frame, outer[2], self.state.screen, self.state.input_mode);

        self.pane_areas = PaneAreas {
            body,
            ..PaneAreas::default()
        };
        let s = &self.state;
        match s.screen {
            Screen::Browse => {
                let rows = Layout::default()
                    .direction(Direction::Vertical)
                    .constraints([Constraint::Min(8), Constraint::Length(5)])
                    .split(body);
                let carousel_focused = self.focus.is_focused(ComponentId::Carousel);
                let popular_focused = self.focus.is_focused(ComponentId::PopularStrip);
                self.carousel.draw(frame, rows[0], carousel_focused, s);
                self.popular.draw(frame, rows[1], popular_focused, s);
                self.pane_areas.carousel = rows[0];
                self.pane_areas.popular = rows[1];
            }
            Screen::Detail => self.detail.draw(frame, body, true, s),
            Screen::Reader => self.reader.draw(frame, body, true, s),
            Screen::Download => self.wizard.draw(frame, body, true, s),
        }

        // ── Help overlay (on top of everything) ──────────────────────────────
        self.help_overlay.draw(frame, area, false, s);

        // ── Toast notifications (topmost layer) ──────────────────────────────
        self.toast.draw(frame, area);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::{spawn_catalog, ExportMode, PDF_BYTES};
    use crate::wizard::{InfoState, STEP_CONFIRM};
    use tempfile::TempDir;

    async fn app_with_catalog(mode: ExportMode, dir: &TempDir) -> (App, mpsc::Receiver<AppMessage>) {
        let (url, _hits) = spawn_catalog(mode).await;
        let mut config = Config::default();
        config.paths.downloads_dir = dir.path().to_path_buf();
        let mut app = App::new(config, CatalogClient::new(url));
        let rx = app.rx.take().unwrap();
        (app, rx)
    }

    /// Feed catalog responses into the app until `done` holds.
    async fn pump_until(app: &mut App, rx: &mut mpsc::Receiver<AppMessage>, done: impl Fn(&App) -> bool) {
        tokio::time::timeout(Duration::from_secs(5), async {
            while !done(app) {
                let msg = rx.recv().await.expect("channel closed");
                app.handle_message(msg);
            }
        })
        .await
        .expect("timed out waiting for catalog responses");
    }

    fn press(app: &mut App, code: KeyCode) {
        let key = KeyEvent::new(code, KeyModifiers::NONE);
        app.handle_message(AppMessage::Event(Event::Key(key)));
    }

    #[tokio::test]
    async fn test_leaving_browse_disarms_and_returning_rearms() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut rx) = app_with_catalog(ExportMode::Pdf, &dir).await;
        app.start();
        pump_until(&mut app, &mut rx, |a| a.carousel.timer().is_armed()).await;
        let first = app.carousel.timer().identity();
        assert_eq!(app.carousel.selector().len(), 3);

        press(&mut app, KeyCode::Char('2'));
        assert_eq!(app.state.screen, Screen::Detail);
        assert!(!app.carousel.timer().is_armed());

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state.screen, Screen::Browse);
        pump_until(&mut app, &mut rx, |a| a.carousel.timer().is_armed()).await;
        assert_ne!(app.carousel.timer().identity(), first);
    }

    #[tokio::test]
    async fn test_open_manga_then_chapter_and_back() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut rx) = app_with_catalog(ExportMode::Pdf, &dir).await;
        app.start();
        pump_until(&mut app, &mut rx, |a| a.carousel.selector().len() == 3).await;

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.screen, Screen::Detail);
        assert_eq!(app.detail.title(), "demo");
        pump_until(&mut app, &mut rx, |a| a.detail.chapter_count() == 5).await;

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.screen, Screen::Reader);
        pump_until(&mut app, &mut rx, |a| a.reader.page_count() == 2).await;

        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state.screen, Screen::Detail);
        press(&mut app, KeyCode::Esc);
        assert_eq!(app.state.screen, Screen::Browse);
    }

    #[tokio::test]
    async fn test_wizard_walk_writes_export() {
        let dir = TempDir::new().unwrap();
        let (mut app, mut rx) = app_with_catalog(ExportMode::Pdf, &dir).await;

        app.dispatch(Action::PrefillDownload("Demo".into()));
        assert_eq!(app.state.screen, Screen::Download);
        app.sync_input_mode();
        assert_eq!(app.state.input_mode, InputMode::Editing);

        press(&mut app, KeyCode::Enter);
        assert_eq!(app.state.input_mode, InputMode::Normal);
        pump_until(&mut app, &mut rx, |a| {
            *a.wizard.wizard().info_state() == InfoState::Loaded
        })
        .await;

        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter); // start c2
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Down);
        press(&mut app, KeyCode::Enter); // end c4
        assert_eq!(app.wizard.wizard().step(), STEP_CONFIRM);
        press(&mut app, KeyCode::Enter);
        assert!(app.state.active_export.is_some());

        tokio::time::timeout(Duration::from_secs(5), async {
            while app.state.last_saved.is_none() {
                tokio::time::sleep(Duration::from_millis(10)).await;
                app.on_ui_tick();
            }
        })
        .await
        .expect("export never finished");

        let path = dir.path().join("Demo_c2-c4.pdf");
        assert_eq!(app.state.last_saved.as_ref().map(|s| s.path.clone()), Some(path.clone()));
        assert_eq!(std::fs::read(path).unwrap(), PDF_BYTES);
        assert!(app.state.active_export.is_none());
    }

    #[tokio::test]
    async fn test_failed_export_writes_nothing() {
        let dir = TempDir::new().unwrap();
        let (mut app, _rx) = app_with_catalog(ExportMode::Fail, &dir).await;
        app.dispatch(Action::StartExport(manga_proto::protocol::ExportRequest {
            title: "Demo".into(),
            chapters: vec!["c1".into()],
        }));

        tokio::time::timeout(Duration::from_secs(5), async {
            while app.state.active_export.is_some() {
                tokio::time::sleep(Duration::from_millis(10)).await;
                app.on_ui_tick();
            }
        })
        .await
        .expect("export never finished");

        assert!(app.state.last_saved.is_none());
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 0);
    }
}
