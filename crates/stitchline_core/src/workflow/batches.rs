//! Cutter flows: opening batches, adding colors, renaming and removing them.

use tracing::info;

use super::{Turn, Workshop, batch_buttons, cancel_button};
use crate::db::Insert;
use crate::error::Result;
use crate::model::{MAX_BATCH_NUMBER_LEN, MAX_COLOR_LEN, MAX_UNIT_COUNT, NewMaterial};
use crate::reply::{Button, Reply};
use crate::routing::{Payload, is_addressable_batch_number};
use crate::session::{BatchRef, LineRef, Stage};

impl Workshop {
    /// "New record": pick an existing batch or start a new one.
    pub(super) async fn new_record(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let batches = self.gateway.list_batches().await?;
        if batches.is_empty() {
            return self.new_batch(turn).await;
        }

        let mut buttons = batch_buttons(&batches, |b| Payload::SelectBatch(b.number.clone()));
        buttons.push(Button::new("New batch", Payload::NewBatch));
        buttons.push(cancel_button());
        turn.say(Reply::text("Choose a batch or create a new one:").with_column(buttons));
        Ok(())
    }

    pub(super) async fn new_batch(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        turn.set_stage(Stage::AwaitingBatchNumber);
        turn.say(Reply::text("Enter the batch number:").with_column(vec![cancel_button()]));
        Ok(())
    }

    pub(super) async fn batch_number_entered(&self, turn: &mut Turn<'_>, text: String) -> Result<()> {
        let number = text.trim().to_string();
        if number.is_empty() {
            turn.say("The batch number cannot be empty. Enter the batch number:");
            return Ok(());
        }
        if number.chars().count() > MAX_BATCH_NUMBER_LEN {
            turn.say(format!(
                "The batch number can be at most {MAX_BATCH_NUMBER_LEN} characters. Enter the batch number:"
            ));
            return Ok(());
        }
        if !is_addressable_batch_number(&number) {
            turn.say(format!(
                "\"{number}\" cannot be used as a batch number. Enter another batch number:"
            ));
            return Ok(());
        }
        turn.say(
            Reply::text(format!(
                "Enter the design for batch №{number}, or skip (\"-\" also skips):"
            ))
            .with_column(vec![Button::new("Skip", Payload::SkipDesign), cancel_button()]),
        );
        turn.set_stage(Stage::AwaitingDesign { number });
        Ok(())
    }

    pub(super) async fn design_entered(
        &self,
        turn: &mut Turn<'_>,
        number: String,
        text: String,
    ) -> Result<()> {
        let design = text.trim();
        let design = (!design.is_empty() && design != "-").then(|| design.to_string());
        self.open_batch_for_lines(turn, number, design).await
    }

    /// Create the batch, or reuse it when the number is taken, then ask for
    /// the first color.
    pub(super) async fn open_batch_for_lines(
        &self,
        turn: &mut Turn<'_>,
        number: String,
        design: Option<String>,
    ) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }

        let batch = match self.gateway.create_batch(number.clone(), design.clone()).await? {
            Insert::Created(batch) => {
                info!(number = %batch.number, "Created batch");
                turn.say(format!("Batch №{} created.", batch.number));
                batch
            }
            Insert::Duplicate => {
                let Some(mut batch) = self.gateway.get_batch(&number).await? else {
                    turn.not_found("Batch");
                    return Ok(());
                };
                if let Some(design) = design {
                    if self.gateway.update_batch_design(batch.id, design.clone()).await? {
                        batch.design = Some(design);
                    }
                }
                turn.say(format!(
                    "Batch №{} already exists. New colors will be added to it.",
                    batch.number
                ));
                batch
            }
        };

        turn.session.current_batch = Some(batch.number.clone());
        self.ask_color(
            turn,
            BatchRef {
                id: batch.id,
                number: batch.number,
            },
        );
        Ok(())
    }

    fn ask_color(&self, turn: &mut Turn<'_>, batch: BatchRef) {
        turn.say(
            Reply::text(format!("Enter the color for batch №{}:", batch.number))
                .with_column(vec![cancel_button()]),
        );
        turn.set_stage(Stage::AwaitingColor { batch });
    }

    pub(super) async fn color_entered(
        &self,
        turn: &mut Turn<'_>,
        batch: BatchRef,
        text: String,
    ) -> Result<()> {
        let color = text.trim().to_string();
        if color.is_empty() {
            turn.say("The color cannot be empty. Enter the color:");
            return Ok(());
        }
        if color.chars().count() > MAX_COLOR_LEN {
            turn.say(format!(
                "The color can be at most {MAX_COLOR_LEN} characters. Enter the color:"
            ));
            return Ok(());
        }
        turn.say(format!("How many lines of {color}?"));
        turn.set_stage(Stage::AwaitingUnitCount { batch, color });
        Ok(())
    }

    pub(super) async fn unit_count_entered(
        &self,
        turn: &mut Turn<'_>,
        batch: BatchRef,
        color: String,
        text: String,
    ) -> Result<()> {
        let units = match text.trim().parse::<i64>() {
            Ok(units) if (1..=MAX_UNIT_COUNT).contains(&units) => units,
            Ok(units) if units < 1 => {
                turn.say("The number of lines must be greater than zero. Enter the number of lines:");
                return Ok(());
            }
            Ok(_) => {
                turn.say(format!(
                    "The number of lines can be at most {MAX_UNIT_COUNT}. Enter the number of lines:"
                ));
                return Ok(());
            }
            Err(_) => {
                turn.say("Please enter the number of lines as a whole number:");
                return Ok(());
            }
        };

        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        if self.gateway.get_batch_by_id(batch.id).await?.is_none() {
            turn.not_found("Batch");
            return Ok(());
        }

        let line = self
            .gateway
            .create_material(NewMaterial::new(batch.id, color, units))
            .await?;
        info!(batch = %batch.number, color = %line.color, units = line.unit_count, "Added material line");

        turn.session.clear();
        turn.session.current_batch = Some(batch.number.clone());
        turn.say(format!(
            "Added {} to batch №{}: {} lines, {} pieces.",
            line.color, batch.number, line.unit_count, line.piece_count
        ));
        self.batch_view_by_id(turn, batch.id).await
    }

    /// "Add color" shortcut from the batch view.
    pub(super) async fn add_material(&self, turn: &mut Turn<'_>, batch_id: i64) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let Some(batch) = self.gateway.get_batch_by_id(batch_id).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        turn.session.current_batch = Some(batch.number.clone());
        self.ask_color(
            turn,
            BatchRef {
                id: batch.id,
                number: batch.number,
            },
        );
        Ok(())
    }

    pub(super) async fn manage_colors(&self, turn: &mut Turn<'_>, batch_id: i64) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let Some(batch) = self.gateway.get_batch_by_id(batch_id).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        let lines = self.gateway.list_materials(batch.id).await?;
        let back = Button::new("Back to batch", Payload::BatchBack(batch.id));
        if lines.is_empty() {
            turn.say(
                Reply::text(format!("Batch №{} has no colors yet.", batch.number))
                    .with_column(vec![back]),
            );
            return Ok(());
        }

        let mut rows: Vec<Vec<Button>> = lines
            .iter()
            .map(|line| {
                vec![
                    Button::new(format!("Rename {}", line.color), Payload::EditColor(line.id)),
                    Button::new(format!("Delete {}", line.color), Payload::DeleteMaterial(line.id)),
                ]
            })
            .collect();
        rows.push(vec![back]);
        turn.say(Reply::text(format!("Colors in batch №{}:", batch.number)).with_rows(rows));
        Ok(())
    }

    pub(super) async fn rename_requested(&self, turn: &mut Turn<'_>, line_id: i64) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let Some(line) = self.gateway.get_material(line_id).await? else {
            turn.not_found("Color");
            return Ok(());
        };
        turn.say(
            Reply::text(format!("Enter the new name for {}:", line.color))
                .with_column(vec![cancel_button()]),
        );
        turn.set_stage(Stage::RenamingColor {
            line: LineRef {
                id: line.id,
                color: line.color,
            },
            batch_id: line.batch_id,
        });
        Ok(())
    }

    pub(super) async fn rename_entered(
        &self,
        turn: &mut Turn<'_>,
        line: LineRef,
        batch_id: i64,
        text: String,
    ) -> Result<()> {
        let color = text.trim().to_string();
        if color.is_empty() {
            turn.say("The color cannot be empty. Enter the new name:");
            return Ok(());
        }
        if color.chars().count() > MAX_COLOR_LEN {
            turn.say(format!(
                "The color can be at most {MAX_COLOR_LEN} characters. Enter the new name:"
            ));
            return Ok(());
        }
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        if !self.gateway.rename_material(line.id, color.clone()).await? {
            turn.not_found("Color");
            return Ok(());
        }
        turn.session.clear();
        turn.say(format!("Renamed {} to {}.", line.color, color));
        self.manage_colors(turn, batch_id).await
    }

    pub(super) async fn material_delete_requested(
        &self,
        turn: &mut Turn<'_>,
        line_id: i64,
    ) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let Some(line) = self.gateway.get_material(line_id).await? else {
            turn.not_found("Color");
            return Ok(());
        };
        turn.say(
            Reply::text(format!(
                "Delete {} ({} lines, {} pieces) and all work recorded on it?",
                line.color, line.unit_count, line.piece_count
            ))
            .with_rows(vec![vec![
                Button::new("Delete", Payload::ConfirmMaterialDelete),
                Button::new("Keep", Payload::CancelMaterialDelete),
            ]]),
        );
        turn.set_stage(Stage::ConfirmingMaterialDelete {
            line: LineRef {
                id: line.id,
                color: line.color,
            },
            batch_id: line.batch_id,
        });
        Ok(())
    }

    pub(super) async fn material_delete_confirmed(
        &self,
        turn: &mut Turn<'_>,
        line: LineRef,
        batch_id: i64,
    ) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        turn.session.clear();
        if !self.gateway.delete_material(line.id).await? {
            turn.not_found("Color");
            return Ok(());
        }
        info!(color = %line.color, id = line.id, "Deleted material line");
        turn.say(format!("Deleted {}.", line.color));
        self.manage_colors(turn, batch_id).await
    }
}
