//! Keyword-phrase category tagging.

use std::fmt;

use tracing::debug;

/// Content category announced by the operator's lead-in phrase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Category {
    Useful,
    Humor,
    BoredomCure,
    Interesting,
    Cool,
    Game,
    Relaxation,
    HowTo,
}

impl Category {
    /// Hashtag line appended to the channel post.
    pub fn hashtag(self) -> &'static str {
        match self {
            Self::Useful => "#useful",
            Self::Humor => "#haha",
            Self::BoredomCure => "#cure",
            Self::Interesting => "#interesting",
            Self::Cool => "#cool",
            Self::Game => "#game",
            Self::Relaxation => "#chill",
            Self::HowTo => "#howto",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.hashtag())
    }
}

/// Phrase table, checked top to bottom. The first phrase contained in the
/// normalized text decides the category, so order matters.
const RULES: &[(&str, Category)] = &[
    ("useful:", Category::Useful),
    ("haha:", Category::Humor),
    ("cure boredom:", Category::BoredomCure),
    ("that's interesting:", Category::Interesting),
    ("that's cool:", Category::Cool),
    ("game:", Category::Game),
    ("chill out:", Category::Relaxation),
    ("how to:", Category::HowTo),
];

/// Pick the category for `text`, or `None` when no phrase matches.
pub fn tag(text: &str) -> Option<Category> {
    let normalized = normalize_text(text);
    let category = RULES
        .iter()
        .find(|(phrase, _)| normalized.contains(phrase))
        .map(|&(phrase, category)| {
            debug!(phrase, tag = category.hashtag(), "category phrase matched");
            category
        });
    if category.is_none() {
        debug!("no category phrase found");
    }
    category
}

/// Collapse whitespace runs, lowercase, and fold typographic quotes to ASCII.
fn normalize_text(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
        .chars()
        .map(fold_quote)
        .collect()
}

fn fold_quote(c: char) -> char {
    match c {
        '\u{201C}' | '\u{201D}' | '\u{201E}' | '\u{201F}' | '\u{00AB}' | '\u{00BB}' => '"',
        '\u{2018}' | '\u{2019}' | '\u{201A}' | '\u{201B}' | '\u{2032}' | '`' => '\'',
        other => other,
    }
}
