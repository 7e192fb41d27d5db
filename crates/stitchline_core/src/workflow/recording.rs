//! Station recording, the same flow for every station.

use tracing::{info, warn};

use super::{Turn, Workshop, batch_buttons, cancel_button, menu_reply};
use crate::error::Result;
use crate::model::{Batch, MAX_COUNT, MIN_COUNT, SlotEntry, User};
use crate::reply::{Button, Reply};
use crate::role::Role;
use crate::routing::Payload;
use crate::session::{BatchRef, LineRef, RecordingStep, Stage};
use crate::station::Station;

impl Workshop {
    /// The station the current user records into, or a reply saying why
    /// there is none.
    async fn current_station(&self, turn: &mut Turn<'_>) -> Result<Option<(User, Station)>> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(None);
        };
        match user.station() {
            Some(station) => Ok(Some((user, station))),
            None if user.is_cutter() => {
                turn.say("The cutter does not record station work.");
                Ok(None)
            }
            None => {
                warn!(user = %user.name, role = %user.role, "No station for role");
                turn.say(format!(
                    "Your role \"{}\" is not linked to a station. Ask the cutter to fix it.",
                    user.role
                ));
                Ok(None)
            }
        }
    }

    /// "Start work": choose a batch to record against.
    pub(super) async fn start_work(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some((_, station)) = self.current_station(turn).await? else {
            return Ok(());
        };
        let batches = self.gateway.list_batches().await?;
        if batches.is_empty() {
            turn.say("There are no batches yet.");
            return Ok(());
        }

        let mut buttons = batch_buttons(&batches, |b| Payload::SelectBatch(b.number.clone()));
        buttons.push(cancel_button());
        turn.say(Reply::text(format!("{}: choose a batch:", station.label())).with_column(buttons));
        turn.set_stage(Stage::Recording {
            station,
            step: RecordingStep::SelectingBatch,
        });
        Ok(())
    }

    pub(super) async fn change_batch(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        turn.session.clear();
        if user.station().is_some() {
            self.start_work(turn).await
        } else {
            self.batch_list(turn).await
        }
    }

    /// "Continue work" shortcut: straight to the colors of a known batch.
    pub(super) async fn continue_work(&self, turn: &mut Turn<'_>, batch_id: i64) -> Result<()> {
        let Some((_, station)) = self.current_station(turn).await? else {
            return Ok(());
        };
        let Some(batch) = self.gateway.get_batch_by_id(batch_id).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        self.show_colors(turn, station, batch).await
    }

    pub(super) async fn recording_batch_selected(
        &self,
        turn: &mut Turn<'_>,
        station: Station,
        number: String,
    ) -> Result<()> {
        let Some(batch) = self.gateway.get_batch(&number).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        self.show_colors(turn, station, batch).await
    }

    async fn show_colors(&self, turn: &mut Turn<'_>, station: Station, batch: Batch) -> Result<()> {
        let lines = self.gateway.list_materials(batch.id).await?;
        turn.session.current_batch = Some(batch.number.clone());
        if lines.is_empty() {
            turn.session.clear();
            turn.say(format!("Batch №{} has no colors yet.", batch.number));
            return Ok(());
        }

        let mut buttons: Vec<Button> = lines
            .iter()
            .map(|line| {
                Button::new(
                    format!("{} ({} pcs)", line.color, line.piece_count),
                    Payload::SelectColor(line.id),
                )
            })
            .collect();
        buttons.push(cancel_button());
        turn.say(Reply::text(format!("Batch №{}: choose a color:", batch.number)).with_column(buttons));
        turn.set_stage(Stage::Recording {
            station,
            step: RecordingStep::SelectingColor {
                batch: BatchRef {
                    id: batch.id,
                    number: batch.number,
                },
            },
        });
        Ok(())
    }

    pub(super) async fn color_selected(
        &self,
        turn: &mut Turn<'_>,
        station: Station,
        batch: BatchRef,
        line_id: i64,
    ) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        let line = match self.gateway.get_material(line_id).await? {
            Some(line) if line.batch_id == batch.id => line,
            _ => {
                turn.not_found("Color");
                return Ok(());
            }
        };
        let line = LineRef {
            id: line.id,
            color: line.color,
        };

        let has_equipment = user
            .equipment
            .as_deref()
            .is_some_and(|e| !e.trim().is_empty());
        if station.requires_equipment() && !has_equipment {
            turn.say(
                Reply::text("Enter your machine label first:").with_column(vec![cancel_button()]),
            );
            turn.set_stage(Stage::Recording {
                station,
                step: RecordingStep::AwaitingEquipment { batch, line },
            });
            return Ok(());
        }
        self.ask_count(turn, station, batch, line).await
    }

    async fn ask_count(
        &self,
        turn: &mut Turn<'_>,
        station: Station,
        batch: BatchRef,
        line: LineRef,
    ) -> Result<()> {
        let mut text = format!("{} at {}: how many pieces?", line.color, station.label());
        if let Some(current) = self.gateway.get_material(line.id).await? {
            let slot = current.slot(station);
            if let (Some(worker), Some(quantity)) = (slot.worker, slot.quantity) {
                text.push_str(&format!("\nCurrently recorded: {quantity} by {worker}."));
            }
        }
        turn.say(Reply::text(text).with_column(vec![cancel_button()]));
        turn.set_stage(Stage::Recording {
            station,
            step: RecordingStep::AwaitingCount { batch, line },
        });
        Ok(())
    }

    pub(super) async fn equipment_entered(
        &self,
        turn: &mut Turn<'_>,
        station: Station,
        batch: BatchRef,
        line: LineRef,
        text: String,
    ) -> Result<()> {
        let equipment = text.trim().to_string();
        if equipment.is_empty() {
            turn.say("The machine label cannot be empty. Enter your machine label:");
            return Ok(());
        }
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        self.gateway
            .update_user_equipment(user.id, equipment.clone())
            .await?;
        info!(user = %user.name, %equipment, "Saved machine label");
        turn.say(format!("Machine label saved: {equipment}."));
        self.ask_count(turn, station, batch, line).await
    }

    /// Overwrite the station's slot. Negative counts are accepted here, as
    /// long as they fit the stored range.
    pub(super) async fn count_entered(
        &self,
        turn: &mut Turn<'_>,
        station: Station,
        batch: BatchRef,
        line: LineRef,
        text: String,
    ) -> Result<()> {
        let Ok(count) = text.trim().parse::<i64>() else {
            turn.say("Please enter the number of pieces as a whole number:");
            return Ok(());
        };
        if !(MIN_COUNT..=MAX_COUNT).contains(&count) {
            turn.say(format!(
                "The number of pieces must be between {MIN_COUNT} and {MAX_COUNT}. Enter the number of pieces:"
            ));
            return Ok(());
        }
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        if !self
            .gateway
            .update_station_slot(line.id, station, SlotEntry::by(&user, count))
            .await?
        {
            turn.not_found("Color");
            return Ok(());
        }
        info!(
            user = %user.name,
            batch = %batch.number,
            color = %line.color,
            %station,
            count,
            "Recorded station work"
        );

        turn.session.clear();
        turn.session.current_batch = Some(batch.number.clone());
        turn.say(
            Reply::text(format!(
                "Recorded {count} for {} at {} in batch №{}.",
                line.color,
                station.label(),
                batch.number
            ))
            .with_column(vec![
                Button::new(
                    format!("Continue in batch №{}", batch.number),
                    Payload::ContinueWork(batch.id),
                ),
                Button::new("Change batch", Payload::ChangeBatch),
            ]),
        );
        Ok(())
    }

    /// `/equipment`: replace the stored machine label.
    pub(super) async fn change_equipment(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        if user.role() != Some(Role::FourNeedle) {
            turn.say("Only four-needle operators have a machine label.");
            return Ok(());
        }
        let current = user.equipment.as_deref().unwrap_or("not set");
        turn.say(
            Reply::text(format!("Current machine: {current}. Enter the new label:"))
                .with_column(vec![cancel_button()]),
        );
        turn.set_stage(Stage::ChangingEquipment);
        Ok(())
    }

    pub(super) async fn equipment_changed(&self, turn: &mut Turn<'_>, text: String) -> Result<()> {
        let equipment = text.trim().to_string();
        if equipment.is_empty() {
            turn.say("The machine label cannot be empty. Enter the new label:");
            return Ok(());
        }
        let Some(mut user) = self.current_user(turn).await? else {
            return Ok(());
        };
        turn.session.clear();
        if !self
            .gateway
            .update_user_equipment(user.id, equipment.clone())
            .await?
        {
            turn.not_found("User");
            return Ok(());
        }
        user.equipment = Some(equipment);
        let text = format!(
            "Machine label updated to {}.",
            user.equipment.as_deref().unwrap_or_default()
        );
        turn.say(menu_reply(&user, text));
        Ok(())
    }
}
