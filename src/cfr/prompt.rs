//! Blocking decision prompts.
//!
//! A prompt suspends the dispatch sequence until the player answers or dismisses it.
//! Both answer types have an explicit "dismissed" value, so a prompt can never end
//! without producing something the dispatcher can turn into a reply.

use smallvec::SmallVec;

use crate::cfr::CfrKind;

/// A single-choice question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChoicePrompt {
    /// Which request this prompt belongs to.
    pub kind: CfrKind,
    /// Dialog title.
    pub title: String,
    /// The question shown above the options.
    pub question: String,
    /// Options in display order.
    pub options: SmallVec<[String; 4]>,
}

impl ChoicePrompt {
    /// Creates a prompt.
    #[must_use]
    pub fn new(
        kind: CfrKind,
        title: impl Into<String>,
        question: impl Into<String>,
        options: SmallVec<[String; 4]>,
    ) -> Self {
        Self {
            kind,
            title: title.into(),
            question: question.into(),
            options,
        }
    }

    /// Maps an answer to an option index, treating out-of-range answers as dismissal.
    #[must_use]
    pub fn selected_index(&self, choice: Choice) -> Option<usize> {
        match choice {
            Choice::Selected(index) if index < self.options.len() => Some(index),
            Choice::Selected(_) | Choice::Dismissed => None,
        }
    }
}

/// The answer to a [`ChoicePrompt`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Choice {
    /// The option at this zero-based list position was picked.
    Selected(usize),
    /// The dialog was closed without picking anything.
    Dismissed,
}

/// A yes/no question.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConfirmPrompt {
    /// Which request this prompt belongs to.
    pub kind: CfrKind,
    /// Dialog title.
    pub title: String,
    /// The question.
    pub question: String,
}

/// The answer to a [`ConfirmPrompt`].
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum Confirmation {
    /// The player said yes.
    Accepted,
    /// The player said no.
    Declined,
    /// The dialog was closed without answering.
    Dismissed,
}

/// Presents decisions to the player.
///
/// Calls block until the player answers; the controller processes no other event in
/// the meantime.
pub trait DecisionPrompter {
    /// Shows a single-choice list.
    fn choose(&mut self, prompt: &ChoicePrompt) -> Choice;

    /// Shows a yes/no question.
    fn confirm(&mut self, prompt: &ConfirmPrompt) -> Confirmation;
}
