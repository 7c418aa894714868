use std::fmt;
use std::path::PathBuf;

use rand::Rng;
use thiserror::Error;
use time::{macros::format_description, Duration, OffsetDateTime};
use unicode_segmentation::UnicodeSegmentation;

pub mod images;

pub use images::{ImageRegistry, ImageSelection, ImageUrl};

const ID_JITTER_SPACE: u64 = 1_000;
const TIMESTAMP_SKEW_SECS: i64 = 3 * 86_400;

/// Validation and empty-collection failures. None of these are fatal; the
/// view turns the `Display` text into a notification.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum NoteError {
    #[error("You must enter some text or pick an image to add a note!")]
    EmptyNote,
    #[error("No notes to delete. Add some garbage first!")]
    NothingToDelete,
    #[error("The note you were editing vanished before you saved it")]
    NoteVanished(NoteId),
    #[error("{} is not an image. Pictures only!", .0.display())]
    NotAnImage(PathBuf),
    #[error("No image found at {}", .0.display())]
    ImageMissing(PathBuf),
}

/// Creation time in milliseconds times a jitter space plus random jitter, so
/// sorting by id says nothing useful about creation order within a burst.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NoteId(u64);

impl NoteId {
    fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        let millis = OffsetDateTime::now_utc().unix_timestamp_nanos() / 1_000_000;
        let millis = u64::try_from(millis).unwrap_or_default();
        NoteId(millis.saturating_mul(ID_JITTER_SPACE) + rng.gen_range(0..ID_JITTER_SPACE))
    }

    pub fn value(&self) -> u64 {
        self.0
    }
}

impl fmt::Display for NoteId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Note {
    pub id: NoteId,
    pub content: String,
    pub image: Option<ImageUrl>,
    /// Display only; skewed by a random offset of up to three days.
    pub timestamp: OffsetDateTime,
}

impl Note {
    pub fn timestamp_label(&self) -> String {
        self.timestamp
            .format(&format_description!(
                "[year]-[month]-[day] [hour]:[minute]:[second]"
            ))
            .unwrap_or_else(|_| self.timestamp.unix_timestamp().to_string())
    }

    /// First `max_graphemes` user-perceived characters of the content.
    pub fn preview(&self, max_graphemes: usize) -> String {
        let mut graphemes = self.content.graphemes(true);
        let mut preview: String = graphemes.by_ref().take(max_graphemes).collect();
        if graphemes.next().is_some() {
            preview.push_str("...");
        }
        preview
    }
}

#[derive(Debug, Default)]
pub struct NoteStore {
    notes: Vec<Note>,
    images: ImageRegistry,
}

impl NoteStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn notes(&self) -> &[Note] {
        &self.notes
    }

    pub fn len(&self) -> usize {
        self.notes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.notes.is_empty()
    }

    pub fn get(&self, id: NoteId) -> Option<&Note> {
        self.notes.iter().find(|note| note.id == id)
    }

    pub fn images(&self) -> &ImageRegistry {
        &self.images
    }

    /// Appends a note. `content` is stored verbatim; only the emptiness check
    /// looks at the trimmed text.
    pub fn add<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
        content: &str,
        image: Option<&ImageSelection>,
    ) -> Result<&Note, NoteError> {
        if content.trim().is_empty() && image.is_none() {
            return Err(NoteError::EmptyNote);
        }
        let mut id = NoteId::generate(rng);
        while self.get(id).is_some() {
            id = NoteId::generate(rng);
        }
        let image = image.map(|selection| self.images.create_url(selection));
        let skew = rng.gen_range(-TIMESTAMP_SKEW_SECS..=TIMESTAMP_SKEW_SECS);
        let timestamp = OffsetDateTime::now_utc()
            .checked_add(Duration::seconds(skew))
            .unwrap_or_else(OffsetDateTime::now_utc);
        tracing::debug!(%id, has_image = image.is_some(), "note added");
        self.notes.push(Note {
            id,
            content: content.to_string(),
            image,
            timestamp,
        });
        let last = self.notes.len() - 1;
        Ok(&self.notes[last])
    }

    /// Replaces the content in place; id, image, timestamp and position stay.
    pub fn replace_content(&mut self, id: NoteId, content: &str) -> Result<&Note, NoteError> {
        let note = self
            .notes
            .iter_mut()
            .find(|note| note.id == id)
            .ok_or(NoteError::NoteVanished(id))?;
        note.content = content.to_string();
        tracing::debug!(%id, "note content replaced");
        Ok(note)
    }

    /// Removes the note at a uniformly random index.
    pub fn remove_random<R: Rng + ?Sized>(&mut self, rng: &mut R) -> Result<Note, NoteError> {
        if self.notes.is_empty() {
            return Err(NoteError::NothingToDelete);
        }
        let index = rng.gen_range(0..self.notes.len());
        let removed = self.notes.remove(index);
        tracing::debug!(id = %removed.id, index, "note removed at random");
        Ok(removed)
    }
}
