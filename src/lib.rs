pub mod app;
pub mod cli;
pub mod config;
pub mod notes;
pub mod notify;
pub mod ui;

pub use config::{AppConfig, ConfigLoader, ConfigPaths};
pub use notes::{Note, NoteError, NoteId, NoteStore};
pub use notify::{NotificationEntry, NotificationKind, NotificationService};
