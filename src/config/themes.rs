use rand::seq::SliceRandom;
use rand::Rng;
use serde::{Deserialize, Serialize};
use strum::{Display, EnumIter, IntoEnumIterator};

/// Styling token for the window background. The UI maps each token to a
/// concrete terminal colour.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "kebab-case")]
#[strum(serialize_all = "kebab-case")]
pub enum BackgroundToken {
    Plain,
    HotPink,
    Lime,
    Tangerine,
    Cyan,
    Grape,
    Mustard,
    Blood,
}

impl Default for BackgroundToken {
    fn default() -> Self {
        BackgroundToken::Plain
    }
}

#[derive(Debug, Clone)]
pub struct BackgroundPalette {
    tokens: Vec<BackgroundToken>,
}

impl BackgroundPalette {
    pub fn new(tokens: Vec<BackgroundToken>) -> Self {
        if tokens.is_empty() {
            return Self::default();
        }
        Self { tokens }
    }

    pub fn contains(&self, token: &BackgroundToken) -> bool {
        self.tokens.contains(token)
    }

    pub fn all(&self) -> impl Iterator<Item = &BackgroundToken> {
        self.tokens.iter()
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }

    /// Uniform pick. The current token may come up again.
    pub fn pick<R: Rng + ?Sized>(&self, rng: &mut R) -> BackgroundToken {
        self.tokens.choose(rng).copied().unwrap_or_default()
    }
}

impl Default for BackgroundPalette {
    fn default() -> Self {
        Self {
            tokens: BackgroundToken::iter().collect(),
        }
    }
}
