//! Note and category types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// A note category. Names are stored lowercase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Category(String);

impl Category {
    pub const WORK: &'static str = "work";
    pub const PERSONAL: &'static str = "personal";
    pub const RANDOM: &'static str = "random";

    pub fn new(name: impl AsRef<str>) -> Self {
        Category(name.as_ref().trim().to_lowercase())
    }

    pub fn work() -> Self {
        Category(Self::WORK.to_string())
    }

    pub fn personal() -> Self {
        Category(Self::PERSONAL.to_string())
    }

    /// Fallback for captures without a usable category suffix
    pub fn random() -> Self {
        Category(Self::RANDOM.to_string())
    }

    pub fn defaults() -> Vec<Category> {
        vec![Self::work(), Self::personal(), Self::random()]
    }

    pub fn name(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Split captured text into `(text, category)`.
///
/// The category is whatever follows the LAST colon, so `"ratio 3:2: work"`
/// yields `("ratio 3:2", work)`. When either side of that colon is blank the
/// whole input is kept as the text and filed under `random`.
pub fn parse_category(input: &str) -> (String, Category) {
    if let Some((text, name)) = input.rsplit_once(':') {
        let text = text.trim();
        let name = name.trim();
        if !text.is_empty() && !name.is_empty() {
            return (text.to_string(), Category::new(name));
        }
    }
    (input.to_string(), Category::random())
}

/// A captured idea
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Note {
    pub id: Uuid,
    pub text: String,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    /// Free-form provenance, e.g. the app that was frontmost
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
}

impl Note {
    pub fn new(text: impl Into<String>, category: Category) -> Self {
        Self::with_timestamp(text, category, Utc::now())
    }

    pub fn with_timestamp(
        text: impl Into<String>,
        category: Category,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Note {
            id: Uuid::new_v4(),
            text: text.into(),
            timestamp,
            category,
            context: None,
        }
    }

    /// Build a note from raw overlay text: trim, then split off the category.
    ///
    /// Returns `None` for blank input.
    pub fn from_capture(raw: &str) -> Option<Self> {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            return None;
        }
        let (text, category) = parse_category(trimmed);
        Some(Note::new(text, category))
    }
}
