//! Cutter administration of users and batches.

use tracing::info;

use super::{Turn, Workshop, batch_buttons};
use crate::error::Result;
use crate::reply::{Button, Reply};
use crate::report;
use crate::routing::Payload;
use crate::session::{BatchAdminStep, Stage, UserAdminStep};

impl Workshop {
    pub(super) async fn manage_users(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        turn.say(Reply::text("User management:").with_column(vec![
            Button::new("List users", Payload::ListUsers),
            Button::new("Delete a user", Payload::DeleteUser),
            Button::new("Cancel", Payload::CancelUserManagement),
        ]));
        turn.set_stage(Stage::ManagingUsers(UserAdminStep::ChoosingAction));
        Ok(())
    }

    pub(super) async fn list_users(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let users = self.gateway.list_users().await?;
        turn.say(report::user_list(&users));
        Ok(())
    }

    pub(super) async fn choose_user_target(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(me) = self.require_cutter(turn).await? else {
            return Ok(());
        };
        let others: Vec<_> = self
            .gateway
            .list_users()
            .await?
            .into_iter()
            .filter(|user| user.id != me.id)
            .collect();
        if others.is_empty() {
            turn.session.clear();
            turn.say("There are no other users.");
            return Ok(());
        }

        let mut buttons: Vec<Button> = others
            .iter()
            .map(|user| {
                Button::new(
                    format!("{} ({})", user.name, user.role_display()),
                    Payload::SelectUser(user.id),
                )
            })
            .collect();
        buttons.push(Button::new("Cancel", Payload::CancelDelete));
        turn.say(Reply::text("Choose the user to delete:").with_column(buttons));
        turn.set_stage(Stage::ManagingUsers(UserAdminStep::SelectingTarget));
        Ok(())
    }

    pub(super) async fn user_selected(&self, turn: &mut Turn<'_>, user_id: i64) -> Result<()> {
        let Some(me) = self.require_cutter(turn).await? else {
            return Ok(());
        };
        if user_id == me.id {
            turn.say("You cannot delete yourself.");
            return Ok(());
        }
        let Some(target) = self.gateway.get_user(user_id).await? else {
            turn.not_found("User");
            return Ok(());
        };

        turn.say(
            Reply::text(format!(
                "Delete {} ({})? Work they recorded stays on the batches.",
                target.name,
                target.role_display()
            ))
            .with_rows(vec![vec![
                Button::new("Delete", Payload::ConfirmDelete),
                Button::new("Keep", Payload::CancelDelete),
            ]]),
        );
        turn.set_stage(Stage::ManagingUsers(UserAdminStep::Confirming {
            user_id: target.id,
            name: target.name,
        }));
        Ok(())
    }

    pub(super) async fn user_delete_confirmed(
        &self,
        turn: &mut Turn<'_>,
        user_id: i64,
        name: String,
    ) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        turn.session.clear();
        if !self.gateway.delete_user(user_id).await? {
            turn.not_found("User");
            return Ok(());
        }
        info!(user = %name, id = user_id, "Deleted user");
        self.show_menu(turn, Some(&format!("User {name} deleted."))).await
    }

    pub(super) async fn manage_batches(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        turn.say(Reply::text("Batch management:").with_column(vec![
            Button::new("List batches", Payload::ListAllBatches),
            Button::new("Delete a batch", Payload::DeleteBatchAction),
            Button::new("Cancel", Payload::CancelBatchManagement),
        ]));
        turn.set_stage(Stage::ManagingBatches(BatchAdminStep::ChoosingAction));
        Ok(())
    }

    pub(super) async fn list_batches_info(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let batches = self.gateway.list_batches().await?;
        let mut counted = Vec::with_capacity(batches.len());
        for batch in batches {
            let count = self.gateway.count_materials(batch.id).await?;
            counted.push((batch, count));
        }
        turn.say(report::batch_list(&counted));
        Ok(())
    }

    pub(super) async fn choose_batch_target(&self, turn: &mut Turn<'_>) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let batches = self.gateway.list_batches().await?;
        if batches.is_empty() {
            turn.session.clear();
            turn.say("There are no batches to delete.");
            return Ok(());
        }

        let mut buttons = batch_buttons(&batches, |b| Payload::DeleteBatch(b.number.clone()));
        buttons.push(Button::new("Cancel", Payload::CancelBatchManagement));
        turn.say(Reply::text("Choose the batch to delete:").with_column(buttons));
        turn.set_stage(Stage::ManagingBatches(BatchAdminStep::SelectingTarget));
        Ok(())
    }

    pub(super) async fn batch_target_selected(&self, turn: &mut Turn<'_>, number: String) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        let Some(batch) = self.gateway.get_batch(&number).await? else {
            turn.not_found("Batch");
            return Ok(());
        };
        let line_count = self.gateway.count_materials(batch.id).await?;

        let warning = match line_count {
            0 => "It has no colors.".to_string(),
            1 => "Its 1 color and all work recorded on it will be deleted too.".to_string(),
            n => format!("Its {n} colors and all work recorded on them will be deleted too."),
        };
        turn.say(
            Reply::text(format!("Delete batch №{}? {warning}", batch.number)).with_rows(vec![vec![
                Button::new("Delete", Payload::ConfirmBatchDelete),
                Button::new("Keep", Payload::CancelBatchDelete),
            ]]),
        );
        turn.set_stage(Stage::ManagingBatches(BatchAdminStep::Confirming {
            number: batch.number,
            line_count,
        }));
        Ok(())
    }

    pub(super) async fn batch_delete_confirmed(
        &self,
        turn: &mut Turn<'_>,
        number: String,
        line_count: usize,
    ) -> Result<()> {
        if self.require_cutter(turn).await?.is_none() {
            return Ok(());
        }
        turn.session.clear();
        if !self.gateway.delete_batch(&number).await? {
            turn.not_found("Batch");
            return Ok(());
        }
        info!(%number, line_count, "Deleted batch");
        if turn.session.current_batch.as_deref() == Some(number.as_str()) {
            turn.session.current_batch = None;
        }
        let text = format!("Batch №{number} deleted along with {line_count} colors.");
        self.show_menu(turn, Some(&text)).await
    }
}
