//! Read-only views: batch lists, batch reports and worker statistics.

use super::{Turn, Workshop, batch_buttons};
use crate::error::Result;
use crate::model::{Batch, User};
use crate::reply::{Button, Reply};
use crate::report;
use crate::routing::Payload;

impl Workshop {
    pub(super) async fn batch_list(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        let batches = self.gateway.list_batches().await?;
        let mut buttons = batch_buttons(&batches, |b| Payload::SelectBatch(b.number.clone()));
        if user.is_cutter() {
            buttons.push(Button::new("New batch", Payload::NewBatch));
        }
        let text = if batches.is_empty() {
            "No batches yet."
        } else {
            "Choose a batch:"
        };
        turn.say(Reply::text(text).with_column(buttons));
        Ok(())
    }

    pub(super) async fn batch_view(&self, turn: &mut Turn<'_>, number: String) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        match self.gateway.get_batch(&number).await? {
            Some(batch) => self.show_batch(turn, &user, batch).await,
            None => {
                turn.not_found("Batch");
                Ok(())
            }
        }
    }

    pub(super) async fn batch_view_by_id(&self, turn: &mut Turn<'_>, batch_id: i64) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        match self.gateway.get_batch_by_id(batch_id).await? {
            Some(batch) => self.show_batch(turn, &user, batch).await,
            None => {
                turn.not_found("Batch");
                Ok(())
            }
        }
    }

    /// The cutter gets the full report and editing shortcuts, everyone else
    /// the color summary and work shortcuts.
    async fn show_batch(&self, turn: &mut Turn<'_>, user: &User, batch: Batch) -> Result<()> {
        let lines = self.gateway.list_materials(batch.id).await?;
        turn.session.current_batch = Some(batch.number.clone());

        let back = Button::new("All batches", Payload::BackToBatches);
        let reply = if user.is_cutter() {
            Reply::text(report::detailed(&batch, &lines)).with_rows(vec![
                vec![Button::new("Add color", Payload::AddMaterial(batch.id))],
                vec![
                    Button::new("Manage colors", Payload::ManageColors(batch.id)),
                    Button::new("Who did what", Payload::ViewWorkers(batch.id)),
                ],
                vec![back],
            ])
        } else {
            Reply::text(report::simplified(&batch, &lines)).with_rows(vec![
                vec![
                    Button::new("Continue work", Payload::ContinueWork(batch.id)),
                    Button::new("Change batch", Payload::ChangeBatch),
                ],
                vec![back],
            ])
        };
        turn.say(reply);
        Ok(())
    }

    /// `/info`: the batch this chat last worked on.
    pub(super) async fn current_batch_info(&self, turn: &mut Turn<'_>) -> Result<()> {
        match turn.session.current_batch.clone() {
            Some(number) => self.batch_view(turn, number).await,
            None => {
                turn.say("No batch selected yet. Open one from the batch list.");
                Ok(())
            }
        }
    }

    pub(super) async fn workers_for_batch(&self, turn: &mut Turn<'_>, batch_id: i64) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let Some(batch) = self.gateway.get_batch_by_id(batch_id).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        let lines = self.gateway.list_materials(batch.id).await?;
        turn.say(
            Reply::text(report::who_did_what(&batch, &lines)).with_rows(vec![vec![
                Button::new("Back to batch", Payload::BatchBack(batch.id)),
                Button::new("All batches", Payload::AllWorkerStats),
            ]]),
        );
        Ok(())
    }

    pub(super) async fn all_worker_stats(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let batches = self.gateway.list_batches().await?;
        let mut all = Vec::with_capacity(batches.len());
        for batch in batches {
            let lines = self.gateway.list_materials(batch.id).await?;
            all.push((batch, lines));
        }
        turn.say(report::who_did_what_all(&all));
        Ok(())
    }
}
