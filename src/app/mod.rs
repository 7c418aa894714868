use std::io::Stdout;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::event::{
    self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind,
    KeyModifiers,
};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use parking_lot::Mutex;
use rand::rngs::StdRng;
use rand::SeedableRng;
use ratatui::backend::CrosstermBackend;
use ratatui::widgets::ListState;
use ratatui::Terminal;

use crate::config::AppConfig;
use crate::notify::{NotificationEntry, NotificationService, Subscription};
use crate::ui;

pub mod actions;
pub mod chime;
pub mod state;
pub mod timers;

use self::actions::{map_key, Action};
use self::chime::{Chime, Silent, TerminalBell};
pub use state::{AppState, FocusPane, InputDraft, OverlayState, PrimaryAction};

/// Notifications currently on screen, as last delivered by the service.
pub type VisibleToasts = Arc<Mutex<Vec<NotificationEntry>>>;

pub struct App {
    pub config: Arc<AppConfig>,
    notifier: NotificationService,
    state: AppState,
    toasts: VisibleToasts,
    subscription: Option<Subscription>,
    list_state: ListState,
    should_quit: bool,
    tick_rate: Duration,
}

impl App {
    pub fn new(config: Arc<AppConfig>, notifier: NotificationService) -> Self {
        let chime: Box<dyn Chime> = if config.audible_cues {
            Box::new(TerminalBell)
        } else {
            Box::new(Silent)
        };
        Self::with_parts(config, notifier, chime, StdRng::from_entropy())
    }

    pub fn with_parts(
        config: Arc<AppConfig>,
        notifier: NotificationService,
        chime: Box<dyn Chime>,
        rng: StdRng,
    ) -> Self {
        let state = AppState::new(&config, notifier.clone(), chime, rng);
        let toasts: VisibleToasts = Arc::default();
        let sink = toasts.clone();
        let subscription = notifier.attach(move |entries: &[NotificationEntry]| {
            *sink.lock() = entries.to_vec();
        });
        tracing::info!("notification display attached");
        Self {
            tick_rate: config.timings.tick_rate(),
            config,
            notifier,
            state,
            toasts,
            subscription: Some(subscription),
            list_state: ListState::default(),
            should_quit: false,
        }
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    pub fn visible_toasts(&self) -> Vec<NotificationEntry> {
        self.toasts.lock().clone()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    pub fn run(&mut self) -> Result<()> {
        let mut terminal = setup_terminal()?;
        let result = self.event_loop(&mut terminal);
        self.teardown();
        restore_terminal(&mut terminal)?;
        result
    }

    /// Stops timers and detaches from the notification service. Safe to call
    /// more than once.
    pub fn teardown(&mut self) {
        self.state.teardown();
        if self.subscription.take().is_some() {
            tracing::info!("notification display detached");
        }
    }

    fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        let mut last_tick = Instant::now();
        loop {
            let toasts = self.visible_toasts();
            terminal
                .draw(|frame| {
                    if !self.state.is_empty() {
                        self.list_state.select(Some(self.state.selected));
                    } else {
                        self.list_state.select(None);
                    }
                    ui::draw_app(frame, &self.state, &toasts, &mut self.list_state);
                })
                .context("rendering frame")?;

            if self.should_quit {
                break;
            }

            let timeout = self
                .tick_rate
                .checked_sub(last_tick.elapsed())
                .unwrap_or_else(|| Duration::from_millis(0));

            if event::poll(timeout).context("polling for terminal events")? {
                if let Event::Key(key) = event::read().context("reading terminal event")? {
                    self.handle_key_at(Instant::now(), key);
                }
            }

            if last_tick.elapsed() >= self.tick_rate {
                self.on_tick(Instant::now());
                last_tick = Instant::now();
            }
        }
        Ok(())
    }

    pub fn on_tick(&mut self, now: Instant) {
        self.state.tick(now);
        if let Some(expired) = self.notifier.poll_at(now) {
            tracing::trace!(id = %expired.id, "notification expired");
        }
    }

    pub fn handle_key_at(&mut self, now: Instant, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        if self.handle_overlay_key(now, key) {
            return;
        }
        if let Some(action) = map_key(&key, self.state.focus) {
            self.handle_action(now, action);
        }
    }

    fn handle_action(&mut self, now: Instant, action: Action) {
        match action {
            Action::Quit => self.should_quit = true,
            Action::ToggleFocus => self.state.toggle_focus(),
            Action::SelectNext => self.state.move_selection(1),
            Action::SelectPrevious => self.state.move_selection(-1),
            Action::RequestPrimary => self.state.open_confirm_primary(),
            Action::DeleteRandom => {
                self.state.delete_random_note_at(now);
            }
            Action::ChangeBackground => {
                self.state.change_background();
            }
            Action::PickImage => self.state.open_image_prompt(),
            Action::BeginEdit => {
                self.state.begin_edit_selected();
            }
            Action::CancelEdit => {
                self.state.cancel_edit();
            }
            Action::InsertChar(ch) => self.state.insert_char_at(now, ch),
            Action::Newline => self.state.insert_char_at(now, '\n'),
            Action::Backspace => self.state.backspace_at(now),
            Action::Delete => self.state.delete_at(now),
            Action::CursorLeft => self.state.move_cursor_at(now, InputDraft::move_left),
            Action::CursorRight => self.state.move_cursor_at(now, InputDraft::move_right),
            Action::CursorHome => self.state.move_cursor_at(now, InputDraft::move_home),
            Action::CursorEnd => self.state.move_cursor_at(now, InputDraft::move_end),
        }
    }

    fn handle_overlay_key(&mut self, now: Instant, key: KeyEvent) -> bool {
        match self.state.overlay() {
            Some(OverlayState::ConfirmPrimary(_)) => {
                match key.code {
                    KeyCode::Enter | KeyCode::Char('y') | KeyCode::Char('Y') => {
                        self.state.confirm_primary_at(now);
                    }
                    KeyCode::Esc | KeyCode::Char('n') | KeyCode::Char('N') => {
                        self.state.close_overlay_at(now);
                    }
                    _ => {}
                }
                true
            }
            Some(OverlayState::ImagePath(_)) => {
                match key.code {
                    KeyCode::Esc => self.state.close_overlay_at(now),
                    KeyCode::Enter => {
                        self.state.submit_image_prompt_at(now);
                    }
                    KeyCode::Backspace => {
                        if let Some(prompt) = self.state.image_prompt_mut() {
                            prompt.path.pop();
                        }
                    }
                    KeyCode::Char(ch)
                        if !key.modifiers.intersects(
                            KeyModifiers::CONTROL | KeyModifiers::ALT | KeyModifiers::SUPER,
                        ) =>
                    {
                        if let Some(prompt) = self.state.image_prompt_mut() {
                            prompt.path.push(ch);
                        }
                    }
                    _ => {}
                }
                true
            }
            None => false,
        }
    }
}

impl Drop for App {
    fn drop(&mut self) {
        self.teardown();
    }
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode().context("enabling raw mode")?;
    let mut stdout = std::io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)
        .context("switching to alternate screen")?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend).context("creating terminal backend")?;
    terminal.hide_cursor().context("hiding cursor")?;
    Ok(terminal)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    terminal.show_cursor().ok();
    disable_raw_mode().context("disabling raw mode")?;
    execute!(
        terminal.backend_mut(),
        LeaveAlternateScreen,
        DisableMouseCapture
    )
    .context("restoring screen state")?;
    Ok(())
}
