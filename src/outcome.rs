//! Outcome model: what happens to a queue item when its page slot is
//! dispatched, and the buttons/hotkeys that trigger it.

use std::fmt;

use anyhow::Result;

use crate::queue::QueueItem;

/// Caller-supplied outcome behavior. Receives the absolute queue index and
/// the item acted on.
pub type CustomHandler = Box<dyn Fn(usize, &QueueItem) -> Result<()>>;

/// What to do with the targeted item. Consumed uniformly by the engine:
/// resolve the slot, run the outcome, advance.
pub enum Outcome {
    /// Drop the item: no copy, just move on.
    Reject,
    /// Copy the item into the named category directory.
    Accept(String),
    /// Caller-supplied behavior.
    Custom(CustomHandler),
}

impl fmt::Debug for Outcome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Outcome::Reject => write!(f, "Reject"),
            Outcome::Accept(cat) => write!(f, "Accept({:?})", cat),
            Outcome::Custom(_) => write!(f, "Custom(..)"),
        }
    }
}

/// An action the user can trigger on a page slot.
pub struct ActionButton {
    pub label: String,
    /// Single-key trigger in the session driver.
    pub key: char,
    pub outcome: Outcome,
}

impl ActionButton {
    pub fn reject(label: &str, key: char) -> Self {
        ActionButton {
            label: label.to_string(),
            key,
            outcome: Outcome::Reject,
        }
    }

    /// Accept into a category directory named after the label.
    pub fn accept(label: &str, key: char) -> Self {
        ActionButton {
            label: label.to_string(),
            key,
            outcome: Outcome::Accept(sanitize_file_name(label)),
        }
    }

    pub fn custom(label: &str, key: char, handler: CustomHandler) -> Self {
        ActionButton {
            label: label.to_string(),
            key,
            outcome: Outcome::Custom(handler),
        }
    }
}

/// The stock button set: discard, favorite, save.
pub fn default_buttons() -> Vec<ActionButton> {
    vec![
        ActionButton::reject("Discard", 'd'),
        ActionButton::accept("Favorite", 'f'),
        ActionButton::accept("Save", 's'),
    ]
}

/// Directory-safe form of a button label: anything outside alphanumerics,
/// space, dash, underscore and dot becomes an underscore.
pub fn sanitize_file_name(name: &str) -> String {
    let cleaned: String = name
        .chars()
        .map(|c| {
            if c.is_alphanumeric() || matches!(c, ' ' | '-' | '_' | '.') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim();
    if trimmed.is_empty() {
        "_".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sanitize_keeps_safe_chars() {
        assert_eq!(sanitize_file_name("Keep #1"), "Keep _1");
        assert_eq!(sanitize_file_name("Favorite"), "Favorite");
        assert_eq!(sanitize_file_name("my-dir_2.0"), "my-dir_2.0");
    }

    #[test]
    fn sanitize_replaces_separators() {
        assert_eq!(sanitize_file_name("a/b\\c"), "a_b_c");
        assert_eq!(sanitize_file_name("x:y*z?"), "x_y_z_");
    }

    #[test]
    fn sanitize_trims_whitespace() {
        assert_eq!(sanitize_file_name("  Keep  "), "Keep");
    }

    #[test]
    fn sanitize_empty_becomes_underscore() {
        assert_eq!(sanitize_file_name(""), "_");
        assert_eq!(sanitize_file_name("   "), "_");
    }

    #[test]
    fn default_buttons_cover_the_three_outcomes() {
        let buttons = default_buttons();
        assert_eq!(buttons.len(), 3);
        assert!(matches!(buttons[0].outcome, Outcome::Reject));
        assert!(matches!(&buttons[1].outcome, Outcome::Accept(c) if c == "Favorite"));
        assert!(matches!(&buttons[2].outcome, Outcome::Accept(c) if c == "Save"));
    }

    #[test]
    fn accept_sanitizes_category() {
        let b = ActionButton::accept("Keep #2", '2');
        assert!(matches!(&b.outcome, Outcome::Accept(c) if c == "Keep _2"));
    }
}
