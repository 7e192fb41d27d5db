use super::{Turn, Workshop, menu_reply};
use crate::error::{CoreError, Result};
use crate::report;

impl Workshop {
    /// `/me`
    pub(super) async fn show_profile(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        turn.say(menu_reply(&user, report::profile(&user)));
        Ok(())
    }

    /// `/mydata`: the stored user row, verbatim.
    pub(super) async fn raw_record(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };
        let json = serde_json::to_string_pretty(&user).map_err(|cause| CoreError::SerializationError {
            data_type: "User".to_string(),
            cause,
        })?;
        turn.say(format!("Stored record:\n{json}"));
        Ok(())
    }

    /// "My data": role, current batch and what the user has recorded.
    pub(super) async fn my_stats(&self, turn: &mut Turn<'_>) -> Result<()> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(());
        };

        let mut text = format!("Name: {}\nRole: {}", user.name, user.role_display());
        if let Some(equipment) = &user.equipment {
            text.push_str(&format!("\nMachine: {equipment}"));
        }
        let current = turn.session.current_batch.as_deref().unwrap_or("none");
        text.push_str(&format!("\nCurrent batch: {current}"));

        if user.is_cutter() {
            let stats = self.gateway.stats().await?;
            text.push_str(&format!("\nMaterial lines in the system: {}", stats.materials));
        } else {
            let mut total: i64 = 0;
            for batch in self.gateway.list_batches().await? {
                let lines = self.gateway.list_materials(batch.id).await?;
                total = report::own_total(&user, &lines).saturating_add(total);
            }
            text.push_str(&format!("\nYour recorded total: {total}"));
        }

        turn.say(menu_reply(&user, text));
        Ok(())
    }
}
