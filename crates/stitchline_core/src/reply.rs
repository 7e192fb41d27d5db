//! Outgoing messages and the option sets attached to them.

use crate::routing::Payload;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Button {
    pub label: String,
    pub payload: String,
}

impl Button {
    pub fn new(label: impl Into<String>, payload: Payload) -> Self {
        Self {
            label: label.into(),
            payload: payload.to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Keyboard {
    /// Buttons carrying an opaque payload back to the router.
    Inline(Vec<Vec<Button>>),
    /// Persistent menu whose buttons send their label as plain text.
    Menu(Vec<Vec<String>>),
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Reply {
    pub text: String,
    pub keyboard: Option<Keyboard>,
}

impl Reply {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            keyboard: None,
        }
    }

    /// One button per row.
    pub fn with_column(self, buttons: Vec<Button>) -> Self {
        self.with_rows(buttons.into_iter().map(|b| vec![b]).collect())
    }

    /// Attach inline buttons. An empty set attaches nothing.
    pub fn with_rows(mut self, rows: Vec<Vec<Button>>) -> Self {
        let rows: Vec<_> = rows.into_iter().filter(|row| !row.is_empty()).collect();
        self.keyboard = (!rows.is_empty()).then_some(Keyboard::Inline(rows));
        self
    }

    pub fn with_menu(mut self, rows: Vec<Vec<String>>) -> Self {
        self.keyboard = Some(Keyboard::Menu(rows));
        self
    }

    /// Every payload attached to this reply, in order.
    pub fn payloads(&self) -> Vec<&str> {
        match &self.keyboard {
            Some(Keyboard::Inline(rows)) => rows
                .iter()
                .flatten()
                .map(|b| b.payload.as_str())
                .collect(),
            _ => Vec::new(),
        }
    }
}

impl From<&str> for Reply {
    fn from(text: &str) -> Self {
        Reply::text(text)
    }
}

impl From<String> for Reply {
    fn from(text: String) -> Self {
        Reply::text(text)
    }
}
