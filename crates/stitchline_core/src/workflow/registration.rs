use tracing::{info, warn};

use super::{Turn, Workshop, menu_reply};
use crate::db::Insert;
use crate::error::Result;
use crate::model::NewUser;
use crate::reply::{Button, Reply};
use crate::role::Role;
use crate::routing::Payload;
use crate::session::Stage;

impl Workshop {
    /// `/start`: greet a known user or begin registration.
    pub(super) async fn start(&self, turn: &mut Turn<'_>) -> Result<()> {
        turn.session.clear();
        let Some(mut user) = self.gateway.get_user_by_chat(turn.chat).await? else {
            turn.set_stage(Stage::AwaitingName);
            turn.say("Welcome! Please enter your name:");
            return Ok(());
        };

        if self.is_privileged(turn.chat) && !user.is_cutter() {
            info!(user = %user.name, from = %user.role, "Upgrading privileged chat to cutter");
            let role = Role::Cutter.label().to_string();
            if self.gateway.update_user_role(user.id, role.clone()).await? {
                user.role = role;
            }
        }
        turn.say(menu_reply(&user, format!("Welcome back, {}!", user.name)));
        Ok(())
    }

    pub(super) async fn name_entered(&self, turn: &mut Turn<'_>, text: String) -> Result<()> {
        let name = text.trim().to_string();
        if name.is_empty() {
            turn.say("The name cannot be empty. Please enter your name:");
            return Ok(());
        }

        if self.is_privileged(turn.chat) {
            return self.register(turn, name, Role::Cutter).await;
        }

        let buttons = Role::ALL
            .into_iter()
            .filter(|role| *role != Role::Cutter)
            .map(|role| Button::new(role.display_name(), Payload::SelectRole(role)))
            .collect();
        turn.say(Reply::text(format!("Nice to meet you, {name}! Choose your role:")).with_column(buttons));
        turn.set_stage(Stage::AwaitingRole { name });
        Ok(())
    }

    pub(super) async fn role_selected(
        &self,
        turn: &mut Turn<'_>,
        name: String,
        role: Role,
    ) -> Result<()> {
        if role == Role::Cutter && !self.is_privileged(turn.chat) {
            warn!(chat = %turn.chat, "Refused self-assigned cutter role");
            turn.say("That role cannot be chosen. Pick your station:");
            return Ok(());
        }
        self.register(turn, name, role).await
    }

    async fn register(&self, turn: &mut Turn<'_>, name: String, role: Role) -> Result<()> {
        turn.session.clear();
        let new = NewUser {
            chat_id: turn.chat,
            name,
            role: role.label().to_string(),
            equipment: None,
        };
        match self.gateway.create_user(new).await? {
            Insert::Created(user) => {
                info!(chat = %turn.chat, user = %user.name, role = %user.role, "Registered user");
                let text = format!(
                    "Registration complete. {}, you are registered as {}.",
                    user.name,
                    user.role_display()
                );
                turn.say(menu_reply(&user, text));
                Ok(())
            }
            Insert::Duplicate => {
                turn.say("You are already registered.");
                self.show_menu(turn, None).await
            }
        }
    }
}
