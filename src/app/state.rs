use std::time::Instant;

use rand::rngs::StdRng;
use unicode_segmentation::UnicodeSegmentation;

use crate::app::chime::{play_cue, Chime, Cue};
use crate::app::timers::{IdleClearTimer, ProgressEvent, SaveProgress};
use crate::config::themes::{BackgroundPalette, BackgroundToken};
use crate::config::AppConfig;
use crate::notes::{ImageSelection, Note, NoteError, NoteId, NoteStore};
use crate::notify::{NotificationKind, NotificationService};

const ADDED_MESSAGE: &str = "Note added! (But it won't save, haha!)";
const EDITED_MESSAGE: &str = "Note edited! It still won't save, though.";
const IMAGE_SELECTED_MESSAGE: &str = "Image selected! Hope it looks bad!";
const IDLE_CLEARED_MESSAGE: &str = "Too slow! Your unfinished note got wiped.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FocusPane {
    Input,
    List,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PrimaryAction {
    Add,
    SaveEdit(NoteId),
}

impl PrimaryAction {
    pub fn label(&self) -> &'static str {
        match self {
            PrimaryAction::Add => "ADD THIS MESS",
            PrimaryAction::SaveEdit(_) => "SAVE EDIT",
        }
    }
}

#[derive(Debug, Clone, Default)]
pub struct ImagePathOverlay {
    pub path: String,
}

#[derive(Debug, Clone)]
pub enum OverlayState {
    ConfirmPrimary(PrimaryAction),
    ImagePath(ImagePathOverlay),
}

/// Text being composed in the input pane. The cursor is a byte offset that
/// always sits on a grapheme boundary.
#[derive(Debug, Clone, Default)]
pub struct InputDraft {
    buffer: String,
    cursor: usize,
}

impl InputDraft {
    pub fn buffer(&self) -> &str {
        &self.buffer
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn set(&mut self, text: &str) {
        self.buffer = text.to_string();
        self.cursor = self.buffer.len();
    }

    pub fn clear(&mut self) {
        self.buffer.clear();
        self.cursor = 0;
    }

    pub fn insert_char(&mut self, ch: char) {
        self.buffer.insert(self.cursor, ch);
        self.cursor += ch.len_utf8();
    }

    pub fn backspace(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        let prev = prev_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(prev..self.cursor);
        self.cursor = prev;
        true
    }

    pub fn delete(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        let next = next_grapheme_boundary(&self.buffer, self.cursor);
        self.buffer.drain(self.cursor..next);
        true
    }

    pub fn move_left(&mut self) -> bool {
        if self.cursor == 0 {
            return false;
        }
        self.cursor = prev_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_right(&mut self) -> bool {
        if self.cursor >= self.buffer.len() {
            return false;
        }
        self.cursor = next_grapheme_boundary(&self.buffer, self.cursor);
        true
    }

    pub fn move_home(&mut self) {
        self.cursor = self.buffer[..self.cursor]
            .rfind('\n')
            .map(|idx| idx + 1)
            .unwrap_or(0);
    }

    pub fn move_end(&mut self) {
        self.cursor = self.buffer[self.cursor..]
            .find('\n')
            .map(|idx| self.cursor + idx)
            .unwrap_or(self.buffer.len());
    }
}

pub struct AppState {
    pub focus: FocusPane,
    pub selected: usize,
    pub overlay: Option<OverlayState>,
    store: NoteStore,
    input: InputDraft,
    pending_image: Option<ImageSelection>,
    editing: Option<NoteId>,
    background: BackgroundToken,
    palette: BackgroundPalette,
    progress: SaveProgress,
    idle_clear: IdleClearTimer,
    preview_chars: usize,
    notifier: NotificationService,
    chime: Box<dyn Chime>,
    rng: StdRng,
}

impl AppState {
    pub fn new(
        config: &AppConfig,
        notifier: NotificationService,
        chime: Box<dyn Chime>,
        rng: StdRng,
    ) -> Self {
        Self {
            focus: FocusPane::Input,
            selected: 0,
            overlay: None,
            store: NoteStore::new(),
            input: InputDraft::default(),
            pending_image: None,
            editing: None,
            background: BackgroundToken::default(),
            palette: config.background_palette(),
            progress: SaveProgress::new(
                config.timings.progress_step,
                config.timings.progress_interval(),
            ),
            idle_clear: IdleClearTimer::new(config.timings.idle_clear()),
            preview_chars: config.preview_chars,
            notifier,
            chime,
            rng,
        }
    }

    pub fn notes(&self) -> &[Note] {
        self.store.notes()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    pub fn input(&self) -> &InputDraft {
        &self.input
    }

    pub fn pending_image(&self) -> Option<&ImageSelection> {
        self.pending_image.as_ref()
    }

    pub fn editing(&self) -> Option<NoteId> {
        self.editing
    }

    pub fn is_editing(&self) -> bool {
        self.editing.is_some()
    }

    pub fn background(&self) -> BackgroundToken {
        self.background
    }

    pub fn progress(&self) -> &SaveProgress {
        &self.progress
    }

    pub fn notifier(&self) -> &NotificationService {
        &self.notifier
    }

    pub fn selected_note(&self) -> Option<&Note> {
        self.store.notes().get(self.selected)
    }

    pub fn primary_action(&self) -> PrimaryAction {
        match self.editing {
            Some(id) => PrimaryAction::SaveEdit(id),
            None => PrimaryAction::Add,
        }
    }

    fn notify(&self, now: Instant, kind: NotificationKind, message: impl Into<String>) {
        self.notifier.post_at(now, message, kind);
    }

    fn notify_error(&self, now: Instant, err: &NoteError) {
        tracing::debug!(%err, "note action rejected");
        self.notify(now, NotificationKind::Error, err.to_string());
    }

    /// Builds a note from the input and pending image. Rejected with an
    /// error notification when there is neither text nor image.
    pub fn add_note_at(&mut self, now: Instant) -> bool {
        let result = self
            .store
            .add(&mut self.rng, self.input.buffer(), self.pending_image.as_ref())
            .map(|note| note.id);
        match result {
            Ok(_) => {
                self.input.clear();
                self.pending_image = None;
                self.idle_clear.cancel();
                self.progress.start(now);
                play_cue(self.chime.as_ref(), Cue::Saved);
                self.notify(now, NotificationKind::Success, ADDED_MESSAGE);
                true
            }
            Err(err) => {
                self.notify_error(now, &err);
                false
            }
        }
    }

    /// Writes the input back into the note being edited. Does nothing when no
    /// edit is in progress.
    pub fn edit_note_at(&mut self, now: Instant) -> bool {
        let Some(id) = self.editing else {
            return false;
        };
        self.editing = None;
        match self.store.replace_content(id, self.input.buffer()) {
            Ok(_) => {
                self.input.clear();
                self.idle_clear.cancel();
                self.progress.start(now);
                play_cue(self.chime.as_ref(), Cue::Saved);
                self.notify(now, NotificationKind::Success, EDITED_MESSAGE);
                true
            }
            Err(err) => {
                self.notify_error(now, &err);
                false
            }
        }
    }

    /// Points the editor at `id` and pre-fills the input with its content.
    pub fn begin_edit(&mut self, id: NoteId) -> bool {
        let Some(note) = self.store.get(id) else {
            return false;
        };
        let content = note.content.clone();
        self.input.set(&content);
        self.editing = Some(id);
        self.idle_clear.cancel();
        self.focus = FocusPane::Input;
        true
    }

    pub fn begin_edit_selected(&mut self) -> bool {
        match self.selected_note().map(|note| note.id) {
            Some(id) => self.begin_edit(id),
            None => false,
        }
    }

    pub fn cancel_edit(&mut self) -> bool {
        if self.editing.take().is_none() {
            return false;
        }
        self.input.clear();
        true
    }

    pub fn delete_random_note_at(&mut self, now: Instant) -> bool {
        match self.store.remove_random(&mut self.rng) {
            Ok(removed) => {
                if self.editing == Some(removed.id) {
                    self.editing = None;
                }
                self.normalize_selection();
                play_cue(self.chime.as_ref(), Cue::Deleted);
                self.notify(
                    now,
                    NotificationKind::Warning,
                    format!(
                        "Poof! A random note is gone: \"{}\"",
                        removed.preview(self.preview_chars)
                    ),
                );
                true
            }
            Err(err) => {
                self.notify_error(now, &err);
                false
            }
        }
    }

    pub fn change_background(&mut self) -> BackgroundToken {
        self.background = self.palette.pick(&mut self.rng);
        tracing::debug!(background = %self.background, "background changed");
        self.background
    }

    /// Validates `path` as an image and keeps it for the next add.
    pub fn select_image_at(&mut self, now: Instant, path: &str) -> bool {
        match ImageSelection::from_path(path.trim()) {
            Ok(selection) => {
                self.pending_image = Some(selection);
                self.notify(now, NotificationKind::Info, IMAGE_SELECTED_MESSAGE);
                true
            }
            Err(err) => {
                self.notify_error(now, &err);
                false
            }
        }
    }

    pub fn note_keystroke(&mut self, now: Instant) {
        self.idle_clear.rearm(now);
    }

    pub fn insert_char_at(&mut self, now: Instant, ch: char) {
        self.input.insert_char(ch);
        self.note_keystroke(now);
    }

    pub fn backspace_at(&mut self, now: Instant) {
        self.input.backspace();
        self.note_keystroke(now);
    }

    pub fn delete_at(&mut self, now: Instant) {
        self.input.delete();
        self.note_keystroke(now);
    }

    /// Applies a cursor movement; moving counts as typing for the idle timer.
    pub fn move_cursor_at<R>(
        &mut self,
        now: Instant,
        movement: impl FnOnce(&mut InputDraft) -> R,
    ) {
        movement(&mut self.input);
        self.note_keystroke(now);
    }

    #[cfg(test)]
    pub(crate) fn input_mut(&mut self) -> &mut InputDraft {
        &mut self.input
    }

    /// Runs the idle-clear and fake-progress timers. The idle clear holds off
    /// while an overlay is open so a confirmation never acts on wiped text.
    pub fn tick(&mut self, now: Instant) {
        if self.overlay.is_none()
            && self.idle_clear.fire_if_due(now)
            && !self.input.is_empty()
            && self.editing.is_none()
        {
            self.input.clear();
            self.notify(now, NotificationKind::Warning, IDLE_CLEARED_MESSAGE);
        }
        if let Some(ProgressEvent::Finished) = self.progress.tick(now) {
            tracing::debug!("fake save finished");
        }
    }

    /// Drops every pending timer; used when the view is torn down.
    pub fn teardown(&mut self) {
        self.idle_clear.cancel();
        self.progress.cancel();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            FocusPane::Input => FocusPane::List,
            FocusPane::List => FocusPane::Input,
        };
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.store.is_empty() {
            return;
        }
        let len = self.store.len() as isize;
        let next = (self.selected as isize + delta).clamp(0, len - 1);
        self.selected = next as usize;
    }

    pub fn overlay(&self) -> Option<&OverlayState> {
        self.overlay.as_ref()
    }

    /// Closes any overlay. A pending idle clear restarts from `now` so the
    /// time spent in the overlay does not count as idle.
    pub fn close_overlay_at(&mut self, now: Instant) {
        self.overlay = None;
        if self.idle_clear.is_pending() {
            self.idle_clear.rearm(now);
        }
    }

    pub fn open_confirm_primary(&mut self) {
        self.overlay = Some(OverlayState::ConfirmPrimary(self.primary_action()));
    }

    /// Applies the action captured when the confirmation opened.
    pub fn confirm_primary_at(&mut self, now: Instant) -> bool {
        let action = match self.overlay {
            Some(OverlayState::ConfirmPrimary(action)) => action,
            _ => return false,
        };
        self.close_overlay_at(now);
        match action {
            PrimaryAction::Add => self.add_note_at(now),
            PrimaryAction::SaveEdit(id) if self.editing == Some(id) => self.edit_note_at(now),
            PrimaryAction::SaveEdit(_) => false,
        }
    }

    pub fn open_image_prompt(&mut self) {
        self.overlay = Some(OverlayState::ImagePath(ImagePathOverlay::default()));
    }

    pub fn image_prompt_mut(&mut self) -> Option<&mut ImagePathOverlay> {
        match self.overlay.as_mut() {
            Some(OverlayState::ImagePath(overlay)) => Some(overlay),
            _ => None,
        }
    }

    pub fn submit_image_prompt_at(&mut self, now: Instant) -> bool {
        let path = match self.overlay.take() {
            Some(OverlayState::ImagePath(prompt)) => prompt.path,
            other => {
                self.overlay = other;
                return false;
            }
        };
        self.close_overlay_at(now);
        self.select_image_at(now, &path)
    }

    fn normalize_selection(&mut self) {
        if self.store.is_empty() {
            self.selected = 0;
        } else if self.selected >= self.store.len() {
            self.selected = self.store.len() - 1;
        }
    }
}

fn prev_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[..cursor]
        .grapheme_indices(true)
        .last()
        .map(|(idx, _)| idx)
        .unwrap_or(0)
}

fn next_grapheme_boundary(text: &str, cursor: usize) -> usize {
    text[cursor..]
        .graphemes(true)
        .next()
        .map(|grapheme| cursor + grapheme.len())
        .unwrap_or(text.len())
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use rand::SeedableRng;

    use super::*;
    use crate::app::chime::testing::RecordingChime;
    use crate::notify::NotificationEntry;

    struct Harness {
        state: AppState,
        notifier: NotificationService,
        chime: RecordingChime,
        config: AppConfig,
    }

    fn harness() -> Harness {
        let config = AppConfig::default();
        let notifier = NotificationService::new(config.timings.notification_visible());
        let chime = RecordingChime::default();
        let state = AppState::new(
            &config,
            notifier.clone(),
            Box::new(chime.clone()),
            StdRng::seed_from_u64(11),
        );
        Harness {
            state,
            notifier,
            chime,
            config,
        }
    }

    fn type_text(state: &mut AppState, now: Instant, text: &str) {
        for ch in text.chars() {
            state.insert_char_at(now, ch);
        }
    }

    fn kinds(entries: &[NotificationEntry]) -> Vec<NotificationKind> {
        entries.iter().map(|entry| entry.kind).collect()
    }

    #[test]
    fn add_then_reject_then_delete_scenario() {
        let Harness {
            mut state,
            notifier,
            chime,
            ..
        } = harness();
        let now = Instant::now();

        type_text(&mut state, now, "hello");
        assert!(state.add_note_at(now));
        assert_eq!(state.len(), 1);
        assert_eq!(state.notes()[0].content, "hello");
        assert!(state.notes()[0].image.is_none());
        assert!(state.input().is_empty());
        assert_eq!(kinds(&notifier.snapshot()), vec![NotificationKind::Success]);

        assert!(!state.add_note_at(now));
        assert_eq!(state.len(), 1);
        assert_eq!(
            kinds(&notifier.snapshot()),
            vec![NotificationKind::Success, NotificationKind::Error]
        );

        assert!(state.delete_random_note_at(Instant::now()));
        assert!(state.is_empty());
        let posted = notifier.snapshot();
        assert_eq!(posted.len(), 3);
        assert_eq!(posted[2].kind, NotificationKind::Warning);
        assert!(posted[2].message.contains("hello"));
        assert_eq!(chime.played(), vec![Cue::Saved, Cue::Deleted]);
    }

    #[test]
    fn whitespace_only_input_is_rejected_once() {
        let Harness {
            mut state, notifier, ..
        } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "  \n ");
        assert!(!state.add_note_at(now));
        assert!(state.is_empty());
        assert_eq!(kinds(&notifier.snapshot()), vec![NotificationKind::Error]);
        assert!(!state.progress().is_visible());
    }

    #[test]
    fn add_starts_the_fake_save_and_it_finishes() {
        let Harness {
            mut state, config, ..
        } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "saving");
        state.add_note_at(now);
        assert!(state.progress().is_visible());

        let interval = config.timings.progress_interval();
        let mut at = now;
        for _ in 0..20 {
            at += interval;
            state.tick(at);
        }
        assert!(!state.progress().is_visible());
        assert_eq!(state.progress().value(), 0);
    }

    #[test]
    fn edit_without_target_is_a_noop() {
        let Harness {
            mut state, notifier, ..
        } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "keep me");
        state.add_note_at(now);
        let before = state.notes().to_vec();
        let posted = notifier.len();

        type_text(&mut state, now, "replacement");
        assert!(!state.edit_note_at(now));
        assert_eq!(state.notes(), before.as_slice());
        assert_eq!(notifier.len(), posted);
    }

    #[test]
    fn edit_replaces_content_in_place() {
        let Harness {
            mut state, chime, ..
        } = harness();
        let now = Instant::now();
        for word in ["first", "second", "third"] {
            type_text(&mut state, now, word);
            state.add_note_at(now);
        }
        let target = state.notes()[1].clone();

        assert!(state.begin_edit(target.id));
        assert_eq!(state.input().buffer(), "second");
        assert_eq!(state.primary_action(), PrimaryAction::SaveEdit(target.id));

        state.input_mut().clear();
        type_text(&mut state, now, "2nd");
        assert!(state.edit_note_at(now));

        let edited = &state.notes()[1];
        assert_eq!(edited.id, target.id);
        assert_eq!(edited.content, "2nd");
        assert_eq!(edited.timestamp, target.timestamp);
        assert_eq!(state.notes()[0].content, "first");
        assert_eq!(state.notes()[2].content, "third");
        assert_eq!(state.editing(), None);
        assert!(state.input().is_empty());
        assert_eq!(chime.played().len(), 4);
    }

    #[test]
    fn editing_a_note_that_vanished_reports_it() {
        let Harness {
            mut state, notifier, ..
        } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "doomed");
        state.add_note_at(now);
        let id = state.notes()[0].id;
        state.begin_edit(id);
        state.editing = Some(id);
        state.store = NoteStore::new();

        assert!(!state.edit_note_at(now));
        assert_eq!(state.editing(), None);
        assert_eq!(
            notifier.snapshot().last().map(|entry| entry.kind),
            Some(NotificationKind::Error)
        );
    }

    #[test]
    fn deleting_from_empty_store_posts_one_error() {
        let Harness {
            mut state,
            notifier,
            chime,
            ..
        } = harness();
        assert!(!state.delete_random_note_at(Instant::now()));
        assert!(state.is_empty());
        assert_eq!(kinds(&notifier.snapshot()), vec![NotificationKind::Error]);
        assert!(chime.played().is_empty());
    }

    #[test]
    fn random_delete_shrinks_by_exactly_one() {
        let Harness { mut state, .. } = harness();
        let now = Instant::now();
        for idx in 0..6 {
            type_text(&mut state, now, &format!("note {idx}"));
            state.add_note_at(now);
        }
        state.selected = 5;
        assert!(state.delete_random_note_at(Instant::now()));
        assert_eq!(state.len(), 5);
        assert!(state.selected < 5);
    }

    #[test]
    fn deleted_preview_is_truncated() {
        let Harness {
            mut state, notifier, ..
        } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "abcdefghijklmnopqrstuvwxyz");
        state.add_note_at(now);
        state.delete_random_note_at(Instant::now());
        let warning = notifier.snapshot().pop().expect("warning posted");
        assert!(warning.message.contains("abcdefghijklmnopqrst..."));
        assert!(!warning.message.contains("uvwxyz"));
    }

    #[test]
    fn idle_input_is_cleared_with_one_warning() {
        let Harness {
            mut state,
            notifier,
            config,
            ..
        } = harness();
        let idle = config.timings.idle_clear();
        let start = Instant::now();
        type_text(&mut state, start, "half a thought");

        state.tick(start + idle - Duration::from_millis(1));
        assert_eq!(state.input().buffer(), "half a thought");

        state.tick(start + idle);
        assert!(state.input().is_empty());
        assert_eq!(kinds(&notifier.snapshot()), vec![NotificationKind::Warning]);

        state.tick(start + idle * 3);
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn keystroke_before_expiry_prevents_the_clear() {
        let Harness {
            mut state,
            notifier,
            config,
            ..
        } = harness();
        let idle = config.timings.idle_clear();
        let start = Instant::now();
        type_text(&mut state, start, "typing");
        let later = start + idle - Duration::from_millis(10);
        state.insert_char_at(later, 's');

        state.tick(start + idle);
        assert_eq!(state.input().buffer(), "typings");
        assert!(notifier.is_empty());

        state.tick(later + idle);
        assert!(state.input().is_empty());
    }

    #[test]
    fn idle_timer_leaves_edits_alone() {
        let Harness {
            mut state,
            notifier,
            config,
            ..
        } = harness();
        let start = Instant::now();
        type_text(&mut state, start, "original");
        state.add_note_at(start);
        let id = state.notes()[0].id;
        state.begin_edit(id);
        state.insert_char_at(start, '!');

        state.tick(start + config.timings.idle_clear());
        assert_eq!(state.input().buffer(), "original!");
        assert_eq!(notifier.len(), 1);
    }

    #[test]
    fn random_delete_of_the_edit_target_ends_the_edit() {
        let Harness { mut state, .. } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "only one");
        state.add_note_at(now);
        let id = state.notes()[0].id;
        assert!(state.begin_edit(id));
        type_text(&mut state, now, "!");

        assert!(state.delete_random_note_at(now));
        assert!(state.is_empty());
        assert_eq!(state.editing(), None);
        assert_eq!(state.primary_action(), PrimaryAction::Add);
        assert_eq!(state.input().buffer(), "only one!");
    }

    #[test]
    fn cancel_edit_clears_the_draft_and_keeps_the_note() {
        let Harness { mut state, .. } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "untouched");
        state.add_note_at(now);
        let before = state.notes()[0].clone();
        state.begin_edit(before.id);
        type_text(&mut state, now, " scribbles");

        assert!(state.cancel_edit());
        assert_eq!(state.editing(), None);
        assert!(state.input().is_empty());
        assert_eq!(state.notes()[0], before);
        assert!(!state.cancel_edit());
    }

    #[test]
    fn notifications_are_stamped_with_the_caller_clock() {
        let config = AppConfig::default();
        let visible = config.timings.notification_visible();
        let notifier = NotificationService::new(visible);
        let mut state = AppState::new(
            &config,
            notifier.clone(),
            Box::new(RecordingChime::default()),
            StdRng::seed_from_u64(5),
        );
        let seen = std::sync::Arc::new(parking_lot::Mutex::new(Vec::new()));
        let sink = seen.clone();
        let _subscription = notifier.attach(move |entries: &[NotificationEntry]| {
            *sink.lock() = entries.to_vec();
        });

        let start = Instant::now() + Duration::from_secs(3600);
        type_text(&mut state, start, "hello");
        let cleared_at = start + config.timings.idle_clear();
        state.tick(cleared_at);
        assert_eq!(notifier.len(), 1);
        assert_eq!(notifier.next_expiry(), Some(cleared_at + visible));

        assert!(notifier.poll_at(cleared_at).is_none());
        assert_eq!(seen.lock().len(), 1);
        assert!(notifier.poll_at(cleared_at + visible).is_some());
        assert!(seen.lock().is_empty());
    }

    #[test]
    fn idle_clear_waits_for_open_overlays() {
        let Harness {
            mut state,
            notifier,
            config,
            ..
        } = harness();
        let idle = config.timings.idle_clear();
        let start = Instant::now();
        type_text(&mut state, start, "pending");
        state.open_image_prompt();

        state.tick(start + idle * 3);
        assert_eq!(state.input().buffer(), "pending");

        let closed = start + idle * 3;
        state.close_overlay_at(closed);
        state.tick(closed + idle - Duration::from_millis(1));
        assert_eq!(state.input().buffer(), "pending");
        state.tick(closed + idle);
        assert!(state.input().is_empty());
        assert_eq!(kinds(&notifier.snapshot()), vec![NotificationKind::Warning]);
    }

    #[test]
    fn confirmation_applies_the_captured_action() {
        let Harness { mut state, .. } = harness();
        let now = Instant::now();
        type_text(&mut state, now, "confirmed");
        state.open_confirm_primary();
        assert!(matches!(
            state.overlay(),
            Some(OverlayState::ConfirmPrimary(PrimaryAction::Add))
        ));
        assert!(state.confirm_primary_at(now));
        assert!(state.overlay().is_none());
        assert_eq!(state.len(), 1);

        state.close_overlay_at(now);
        assert!(!state.confirm_primary_at(now));
    }

    #[test]
    fn background_comes_from_the_palette() {
        let Harness {
            mut state, config, ..
        } = harness();
        for _ in 0..50 {
            let token = state.change_background();
            assert!(config.palette.contains(&token));
        }
    }

    #[test]
    fn bad_image_path_keeps_previous_selection() -> anyhow::Result<()> {
        let Harness {
            mut state, notifier, ..
        } = harness();
        let temp = tempfile::TempDir::new()?;
        let good = temp.path().join("ugly.gif");
        std::fs::write(&good, b"gif")?;

        assert!(state.select_image_at(Instant::now(), &good.display().to_string()));
        assert!(!state.select_image_at(Instant::now(), "readme.md"));
        assert_eq!(
            state.pending_image().map(|image| image.path().to_path_buf()),
            Some(good)
        );
        assert_eq!(
            kinds(&notifier.snapshot()),
            vec![NotificationKind::Info, NotificationKind::Error]
        );

        let now = Instant::now();
        assert!(state.add_note_at(now));
        assert!(state.notes()[0].image.is_some());
        assert!(state.pending_image().is_none());
        Ok(())
    }

    #[test]
    fn input_backspace_respects_graphemes() {
        let mut draft = InputDraft::default();
        draft.set("ae\u{301}");
        assert!(draft.backspace());
        assert_eq!(draft.buffer(), "a");
        assert!(draft.move_left());
        assert!(!draft.move_left());
        draft.insert_char('>');
        assert_eq!(draft.buffer(), ">a");
    }
}
