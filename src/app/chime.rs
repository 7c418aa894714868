use std::io::{self, Write};

use anyhow::{Context, Result};
use strum::Display;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Display)]
#[strum(serialize_all = "lowercase")]
pub enum Cue {
    Saved,
    Deleted,
}

/// Audible feedback for note mutations.
pub trait Chime {
    fn play(&self, cue: Cue) -> Result<()>;
}

/// Rings the terminal bell: once for a save, three times for a deletion.
#[derive(Debug, Default)]
pub struct TerminalBell;

impl Chime for TerminalBell {
    fn play(&self, cue: Cue) -> Result<()> {
        let rings = match cue {
            Cue::Saved => 1,
            Cue::Deleted => 3,
        };
        let mut stdout = io::stdout().lock();
        for _ in 0..rings {
            stdout.write_all(b"\x07").context("writing terminal bell")?;
        }
        stdout.flush().context("flushing terminal bell")?;
        Ok(())
    }
}

#[derive(Debug, Default)]
pub struct Silent;

impl Chime for Silent {
    fn play(&self, _cue: Cue) -> Result<()> {
        Ok(())
    }
}

/// Playback failures are logged and otherwise ignored.
pub fn play_cue(chime: &dyn Chime, cue: Cue) {
    if let Err(err) = chime.play(cue) {
        tracing::warn!(?err, %cue, "audible cue failed");
    }
}
