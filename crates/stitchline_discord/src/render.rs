//! Turning workflow replies into Discord messages.
//!
//! Discord caps a message at 2000 characters, an action row at five buttons
//! and a message at five rows. Long text is split on line boundaries and
//! keyboards that do not fit continue in follow-up messages.

use serenity::all::{ButtonStyle, CreateActionRow, CreateButton};
use stitchline_core::{Keyboard, Reply};

pub const MAX_MESSAGE_LENGTH: usize = 2000;
pub const MAX_BUTTONS_PER_ROW: usize = 5;
pub const MAX_ROWS_PER_MESSAGE: usize = 5;
pub const MAX_LABEL_LENGTH: usize = 80;

/// `custom_id` prefix for menu buttons. Pressing one sends the label as text.
pub const MENU_PREFIX: &str = "text:";

const CONTINUATION: &str = "More options:";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenderedButton {
    pub label: String,
    pub custom_id: String,
    pub style: ButtonStyle,
}

/// One Discord message ready to send.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Outgoing {
    pub content: String,
    pub rows: Vec<Vec<RenderedButton>>,
}

impl Outgoing {
    pub fn components(&self) -> Vec<CreateActionRow> {
        self.rows
            .iter()
            .map(|row| {
                CreateActionRow::Buttons(
                    row.iter()
                        .map(|b| {
                            CreateButton::new(b.custom_id.clone())
                                .label(b.label.clone())
                                .style(b.style)
                        })
                        .collect(),
                )
            })
            .collect()
    }
}

/// Split a message into chunks that fit Discord's message length limit
pub fn split_message(content: &str, max_length: usize) -> Vec<String> {
    if content.chars().count() <= max_length {
        return vec![content.to_string()];
    }

    let mut chunks = Vec::new();
    let mut current = String::new();
    let mut current_len = 0;

    for line in content.lines() {
        let line_len = line.chars().count();
        if current_len + line_len + 1 > max_length {
            if !current.is_empty() {
                chunks.push(std::mem::take(&mut current));
                current_len = 0;
            }

            // A single line that is too long gets cut mid-line.
            if line_len > max_length {
                for chunk in line.chars().collect::<Vec<_>>().chunks(max_length) {
                    chunks.push(chunk.iter().collect());
                }
            } else {
                current = line.to_string();
                current_len = line_len;
            }
        } else {
            if !current.is_empty() {
                current.push('\n');
                current_len += 1;
            }
            current.push_str(line);
            current_len += line_len;
        }
    }

    if !current.is_empty() {
        chunks.push(current);
    }

    chunks
}

pub fn truncate_label(label: &str) -> String {
    if label.chars().count() <= MAX_LABEL_LENGTH {
        return label.to_string();
    }
    let mut truncated: String = label.chars().take(MAX_LABEL_LENGTH - 1).collect();
    truncated.push('…');
    truncated
}

/// Lay a keyboard out as Discord button rows, wrapping rows longer than
/// five buttons.
pub fn layout(keyboard: &Keyboard) -> Vec<Vec<RenderedButton>> {
    let rows: Vec<Vec<RenderedButton>> = match keyboard {
        Keyboard::Inline(rows) => rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|b| RenderedButton {
                        label: truncate_label(&b.label),
                        custom_id: b.payload.clone(),
                        style: ButtonStyle::Secondary,
                    })
                    .collect()
            })
            .collect(),
        Keyboard::Menu(rows) => rows
            .iter()
            .map(|row| {
                row.iter()
                    .map(|label| RenderedButton {
                        label: truncate_label(label),
                        custom_id: format!("{MENU_PREFIX}{label}"),
                        style: ButtonStyle::Primary,
                    })
                    .collect()
            })
            .collect(),
    };

    rows.into_iter()
        .flat_map(|row| {
            row.chunks(MAX_BUTTONS_PER_ROW)
                .map(<[RenderedButton]>::to_vec)
                .collect::<Vec<_>>()
        })
        .collect()
}

/// Every message needed to deliver `reply`, in order. Buttons ride on the
/// last text chunk; rows beyond the fifth go into follow-ups.
pub fn render(reply: &Reply) -> Vec<Outgoing> {
    let mut messages: Vec<Outgoing> = split_message(&reply.text, MAX_MESSAGE_LENGTH)
        .into_iter()
        .map(|content| Outgoing {
            content,
            rows: Vec::new(),
        })
        .collect();

    let Some(keyboard) = &reply.keyboard else {
        return messages;
    };
    let rows = layout(keyboard);
    let mut groups = rows.chunks(MAX_ROWS_PER_MESSAGE);
    if let (Some(first), Some(last)) = (groups.next(), messages.last_mut()) {
        last.rows = first.to_vec();
    }
    for group in groups {
        messages.push(Outgoing {
            content: CONTINUATION.to_string(),
            rows: group.to_vec(),
        });
    }
    messages
}
