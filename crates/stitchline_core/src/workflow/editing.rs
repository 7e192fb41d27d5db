//! Correcting one's own earlier entries.

use tracing::info;

use super::{Turn, Workshop, batch_buttons, cancel_button, menu_reply};
use crate::error::Result;
use crate::model::{MAX_COUNT, MaterialLine, SlotEntry, User};
use crate::reply::{Button, Reply};
use crate::routing::Payload;
use crate::session::{BatchRef, EditStep, LineRef, Stage};
use crate::station::Station;

/// Every done slot on `lines` that `user` wrote.
fn own_entries<'a>(
    user: &'a User,
    lines: &'a [MaterialLine],
) -> impl Iterator<Item = (&'a MaterialLine, Station, i64)> + 'a {
    lines.iter().flat_map(move |line| {
        Station::ALL.into_iter().filter_map(move |station| {
            let slot = line.slot(station);
            (slot.is_done() && slot.belongs_to(user))
                .then(|| (line, station, slot.quantity.unwrap_or_default()))
        })
    })
}

impl Workshop {
    /// "Edit entries": batches holding at least one entry of the user's.
    pub(super) async fn start_editing(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };

        let mut editable = Vec::new();
        for batch in self.gateway.list_batches().await? {
            let lines = self.gateway.list_materials(batch.id).await?;
            if own_entries(&user, &lines).next().is_some() {
                editable.push(batch);
            }
        }
        if editable.is_empty() {
            turn.say("You have no recorded entries to edit.");
            return Ok(());
        }

        let mut buttons = batch_buttons(&editable, |b| Payload::SelectBatch(b.number.clone()));
        buttons.push(cancel_button());
        turn.say(Reply::text("Choose the batch with the entry to fix:").with_column(buttons));
        turn.set_stage(Stage::Editing(EditStep::SelectingBatch));
        Ok(())
    }

    pub(super) async fn edit_batch_selected(&self, turn: &mut Turn<'_>, number: String) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        let Some(batch) = self.gateway.get_batch(&number).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        let lines = self.gateway.list_materials(batch.id).await?;
        let mut buttons: Vec<Button> = own_entries(&user, &lines)
            .map(|(line, station, quantity)| {
                Button::new(
                    format!("{} · {}: {}", line.color, station.label(), quantity),
                    Payload::EditCount(line.id, station),
                )
            })
            .collect();
        if buttons.is_empty() {
            turn.session.clear();
            turn.say(format!("You have no entries in batch №{}.", batch.number));
            return Ok(());
        }
        buttons.push(cancel_button());

        turn.say(Reply::text(format!("Batch №{}: choose an entry:", batch.number)).with_column(buttons));
        turn.set_stage(Stage::Editing(EditStep::SelectingEntry {
            batch: BatchRef {
                id: batch.id,
                number: batch.number,
            },
        }));
        Ok(())
    }

    pub(super) async fn entry_selected(
        &self,
        turn: &mut Turn<'_>,
        batch: BatchRef,
        line_id: i64,
        station: Station,
    ) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        let Some(line) = self.gateway.get_material(line_id).await? else {
            turn.not_found("Entry");
            return Ok(());
        };
        let slot = line.slot(station);
        if !slot.belongs_to(&user) {
            turn.say("You can only edit your own entries.");
            return Ok(());
        }

        let previous = slot.quantity.unwrap_or_default();
        turn.say(
            Reply::text(format!(
                "{} at {}: currently {}. Enter the new count:",
                line.color,
                station.label(),
                previous
            ))
            .with_column(vec![cancel_button()]),
        );
        turn.set_stage(Stage::Editing(EditStep::AwaitingCount {
            batch,
            line: LineRef {
                id: line.id,
                color: line.color,
            },
            station,
            previous,
        }));
        Ok(())
    }

    pub(super) async fn edit_count_entered(
        &self,
        turn: &mut Turn<'_>,
        batch: BatchRef,
        line: LineRef,
        station: Station,
        previous: i64,
        text: String,
    ) -> Result<()> {
        let count = match text.trim().parse::<i64>() {
            Ok(count) if (0..=MAX_COUNT).contains(&count) => count,
            Ok(count) if count < 0 => {
                turn.say("The count cannot be negative. Enter the new count:");
                return Ok(());
            }
            Ok(_) => {
                turn.say(format!("The count can be at most {MAX_COUNT}. Enter the new count:"));
                return Ok(());
            }
            Err(_) => {
                turn.say("Please enter the new count as a whole number:");
                return Ok(());
            }
        };
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        if !self
            .gateway
            .update_station_slot(line.id, station, SlotEntry::by(&user, count))
            .await?
        {
            turn.not_found("Entry");
            return Ok(());
        }
        info!(user = %user.name, color = %line.color, %station, previous, count, "Edited entry");

        turn.session.clear();
        turn.session.current_batch = Some(batch.number);
        let text = format!(
            "Updated {} at {}: {} → {}.",
            line.color,
            station.label(),
            previous,
            count
        );
        turn.say(menu_reply(&user, text));
        Ok(())
    }
}
