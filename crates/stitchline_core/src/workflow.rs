//! The conversation engine.
//!
//! [`Workshop::handle`] takes one event, resolves it against the chat's
//! current stage and runs the matching handler. Handlers live in the
//! submodules, one per workflow, as `impl Workshop` blocks sharing the
//! [`Turn`] context.

use tracing::{debug, error, warn};

use crate::config::StitchlineConfig;
use crate::db::Gateway;
use crate::error::Result;
use crate::model::{Batch, ChatId, User};
use crate::reply::{Button, Reply};
use crate::role::Role;
use crate::routing::{self, Command, Incoming, MenuItem, Payload, Route};
use crate::session::{
    BatchAdminStep, EditStep, RecordingStep, Session, SessionStore, Stage, UserAdminStep,
};

mod admin;
mod batches;
mod editing;
mod profile;
mod recording;
mod registration;
mod views;

const GENERIC_FAILURE: &str = "Something went wrong. Please try again from the menu.";
const NOT_REGISTERED: &str = "You are not registered yet. Send /start to register.";
const CUTTER_ONLY: &str = "Only the cutter can do that.";
const EXPIRED: &str = "This action has expired. Start again from the menu.";

/// One incoming event from one chat.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Event {
    pub chat: ChatId,
    pub incoming: Incoming,
}

impl Event {
    pub fn text(chat: ChatId, text: impl Into<String>) -> Self {
        Self {
            chat,
            incoming: Incoming::Text(text.into()),
        }
    }

    pub fn button(chat: ChatId, payload: impl Into<String>) -> Self {
        Self {
            chat,
            incoming: Incoming::Button(payload.into()),
        }
    }

    pub fn command(chat: ChatId, name: impl Into<String>) -> Self {
        Self {
            chat,
            incoming: Incoming::Command {
                name: name.into(),
                args: String::new(),
            },
        }
    }
}

/// Per-turn context handed to every handler.
pub(crate) struct Turn<'s> {
    chat: ChatId,
    session: &'s mut Session,
    replies: Vec<Reply>,
}

impl<'s> Turn<'s> {
    fn new(chat: ChatId, session: &'s mut Session) -> Self {
        Self {
            chat,
            session,
            replies: Vec::new(),
        }
    }

    fn say(&mut self, reply: impl Into<Reply>) {
        self.replies.push(reply.into());
    }

    fn stage(&self) -> &Stage {
        &self.session.stage
    }

    fn set_stage(&mut self, stage: Stage) {
        self.session.stage = stage;
    }

    /// Report a vanished row and drop whatever form referenced it.
    fn not_found(&mut self, what: &str) {
        self.say(format!("{what} not found. It may have been deleted."));
        self.session.clear();
    }
}

/// The workflow engine shared by every chat.
pub struct Workshop {
    gateway: Gateway,
    sessions: SessionStore,
    privileged: Option<ChatId>,
}

impl Workshop {
    pub fn new(gateway: Gateway, sessions: SessionStore, privileged: Option<ChatId>) -> Self {
        Self {
            gateway,
            sessions,
            privileged,
        }
    }

    pub fn from_config(config: &StitchlineConfig) -> Self {
        Self::new(
            Gateway::new(config.database.clone()),
            SessionStore::new(config.workflow.session_ttl()),
            config.workflow.privileged_chat(),
        )
    }

    pub fn gateway(&self) -> &Gateway {
        &self.gateway
    }

    pub fn sessions(&self) -> &SessionStore {
        &self.sessions
    }

    fn is_privileged(&self, chat: ChatId) -> bool {
        self.privileged == Some(chat)
    }

    /// Handle one event and return the replies to send, in order.
    pub async fn handle(&self, event: Event) -> Vec<Reply> {
        let mut session = self.sessions.lock(event.chat).await;
        let route = routing::resolve(&event.incoming, &session.stage);
        debug!(chat = %event.chat, stage = ?session.stage, ?route, "Routing event");

        let outcome = {
            let mut turn = Turn::new(event.chat, &mut session);
            let result = self.dispatch(route, &mut turn).await;
            result.map(|()| turn.replies)
        };
        match outcome {
            Ok(replies) => replies,
            Err(e) => {
                error!(chat = %event.chat, "Failed to handle event: {:?}", e);
                session.clear();
                vec![Reply::text(GENERIC_FAILURE)]
            }
        }
    }

    async fn dispatch(&self, route: Route, turn: &mut Turn<'_>) -> Result<()> {
        match route {
            Route::Command(command) => self.command(command, turn).await,
            Route::UnknownCommand(name) => {
                turn.say(format!("Unknown command /{name}."));
                self.show_menu(turn, None).await
            }
            Route::Cancel => self.cancel(turn).await,
            Route::Menu(item) => self.menu(item, turn).await,
            Route::Input(text) => self.input(text, turn).await,
            Route::StageButton(payload) => self.stage_button(payload, turn).await,
            Route::Button(payload) => self.button(payload, turn).await,
            Route::StaleButton(raw) => {
                warn!(chat = %turn.chat, "Unparseable button payload '{}'", raw);
                turn.say(EXPIRED);
                Ok(())
            }
            Route::Unrecognized(_) => {
                turn.say("I did not understand that. Choose an action from the menu.");
                self.show_menu(turn, None).await
            }
        }
    }

    async fn command(&self, command: Command, turn: &mut Turn<'_>) -> Result<()> {
        match command {
            Command::Start => self.start(turn).await,
            Command::Batches => self.batch_list(turn).await,
            Command::Cancel => self.cancel(turn).await,
            Command::Me => self.show_profile(turn).await,
            Command::Reset => self.reset(turn).await,
            Command::Info => self.current_batch_info(turn).await,
            Command::NewBatch => self.new_batch(turn).await,
            Command::MyData => self.raw_record(turn).await,
            Command::Equipment => self.change_equipment(turn).await,
            Command::Users => self.manage_users(turn).await,
            Command::ManageBatches => self.manage_batches(turn).await,
            Command::Stats => self.all_worker_stats(turn).await,
        }
    }

    async fn menu(&self, item: MenuItem, turn: &mut Turn<'_>) -> Result<()> {
        match item {
            MenuItem::NewRecord => self.new_record(turn).await,
            MenuItem::ManageBatches => self.manage_batches(turn).await,
            MenuItem::ManageUsers => self.manage_users(turn).await,
            MenuItem::AllBatches => self.batch_list(turn).await,
            MenuItem::WorkerStats => self.all_worker_stats(turn).await,
            MenuItem::StartWork => self.start_work(turn).await,
            MenuItem::ChangeBatch => self.change_batch(turn).await,
            MenuItem::MyData => self.my_stats(turn).await,
            MenuItem::EditEntries => self.start_editing(turn).await,
        }
    }

    /// Free text for the stage that asked for it.
    async fn input(&self, text: String, turn: &mut Turn<'_>) -> Result<()> {
        match turn.stage().clone() {
            Stage::AwaitingName => self.name_entered(turn, text).await,
            Stage::AwaitingBatchNumber => self.batch_number_entered(turn, text).await,
            Stage::AwaitingDesign { number } => self.design_entered(turn, number, text).await,
            Stage::AwaitingColor { batch } => self.color_entered(turn, batch, text).await,
            Stage::AwaitingUnitCount { batch, color } => {
                self.unit_count_entered(turn, batch, color, text).await
            }
            Stage::RenamingColor { line, batch_id } => {
                self.rename_entered(turn, line, batch_id, text).await
            }
            Stage::ChangingEquipment => self.equipment_changed(turn, text).await,
            Stage::Recording {
                station,
                step: RecordingStep::AwaitingEquipment { batch, line },
            } => self.equipment_entered(turn, station, batch, line, text).await,
            Stage::Recording {
                station,
                step: RecordingStep::AwaitingCount { batch, line },
            } => self.count_entered(turn, station, batch, line, text).await,
            Stage::Editing(EditStep::AwaitingCount {
                batch,
                line,
                station,
                previous,
            }) => {
                self.edit_count_entered(turn, batch, line, station, previous, text)
                    .await
            }
            _ => self.show_menu(turn, None).await,
        }
    }

    /// A button the current stage was waiting for.
    async fn stage_button(&self, payload: Payload, turn: &mut Turn<'_>) -> Result<()> {
        use Payload as P;
        match (turn.stage().clone(), payload) {
            (Stage::AwaitingRole { name }, P::SelectRole(role)) => {
                self.role_selected(turn, name, role).await
            }
            (Stage::AwaitingDesign { number }, P::SkipDesign) => {
                self.open_batch_for_lines(turn, number, None).await
            }
            (Stage::ConfirmingMaterialDelete { line, batch_id }, P::ConfirmMaterialDelete) => {
                self.material_delete_confirmed(turn, line, batch_id).await
            }
            (Stage::ConfirmingMaterialDelete { batch_id, .. }, P::CancelMaterialDelete) => {
                turn.session.clear();
                turn.say("Deletion cancelled.");
                self.manage_colors(turn, batch_id).await
            }
            (
                Stage::Recording {
                    station,
                    step: RecordingStep::SelectingBatch,
                },
                P::SelectBatch(number),
            ) => self.recording_batch_selected(turn, station, number).await,
            (
                Stage::Recording {
                    station,
                    step: RecordingStep::SelectingColor { batch },
                },
                P::SelectColor(line_id),
            ) => self.color_selected(turn, station, batch, line_id).await,
            (Stage::Editing(EditStep::SelectingBatch), P::SelectBatch(number)) => {
                self.edit_batch_selected(turn, number).await
            }
            (Stage::Editing(EditStep::SelectingEntry { batch }), P::EditCount(line_id, station)) => {
                self.entry_selected(turn, batch, line_id, station).await
            }
            (Stage::ManagingUsers(UserAdminStep::Confirming { user_id, name }), P::ConfirmDelete) => {
                self.user_delete_confirmed(turn, user_id, name).await
            }
            (Stage::ManagingUsers(_), P::SelectUser(user_id)) => {
                self.user_selected(turn, user_id).await
            }
            (Stage::ManagingBatches(BatchAdminStep::Confirming { number, line_count }), P::ConfirmBatchDelete) => {
                self.batch_delete_confirmed(turn, number, line_count).await
            }
            (Stage::ManagingBatches(_), P::DeleteBatch(number)) => {
                self.batch_target_selected(turn, number).await
            }
            (_, payload) => self.button(payload, turn).await,
        }
    }

    /// Buttons that mean the same thing in any stage.
    async fn button(&self, payload: Payload, turn: &mut Turn<'_>) -> Result<()> {
        use Payload as P;
        match payload {
            P::SelectBatch(number) => self.batch_view(turn, number).await,
            P::BatchBack(batch_id) => self.batch_view_by_id(turn, batch_id).await,
            P::BackToBatches => self.batch_list(turn).await,
            P::NewBatch => self.new_batch(turn).await,
            P::AddMaterial(batch_id) => self.add_material(turn, batch_id).await,
            P::ManageColors(batch_id) => self.manage_colors(turn, batch_id).await,
            P::EditColor(line_id) => self.rename_requested(turn, line_id).await,
            P::DeleteMaterial(line_id) => self.material_delete_requested(turn, line_id).await,
            P::ViewWorkers(batch_id) => self.workers_for_batch(turn, batch_id).await,
            P::AllWorkerStats => self.all_worker_stats(turn).await,
            P::ContinueWork(batch_id) => self.continue_work(turn, batch_id).await,
            P::ChangeBatch => self.change_batch(turn).await,
            P::ListUsers => self.list_users(turn).await,
            P::DeleteUser => self.choose_user_target(turn).await,
            P::ListAllBatches => self.list_batches_info(turn).await,
            P::DeleteBatchAction => self.choose_batch_target(turn).await,
            P::Cancel
            | P::CancelDelete
            | P::CancelBatchDelete
            | P::CancelMaterialDelete
            | P::CancelBatchManagement
            | P::CancelUserManagement => self.cancel(turn).await,
            P::SelectColor(_)
            | P::SelectRole(_)
            | P::SelectUser(_)
            | P::DeleteBatch(_)
            | P::EditCount(..)
            | P::SkipDesign
            | P::ConfirmBatchDelete
            | P::ConfirmMaterialDelete
            | P::ConfirmDelete => {
                debug!(chat = %turn.chat, stage = ?turn.stage(), "Button outside its stage");
                turn.say(EXPIRED);
                Ok(())
            }
        }
    }

    async fn cancel(&self, turn: &mut Turn<'_>) -> Result<()> {
        turn.session.clear();
        self.show_menu(turn, Some("Cancelled.")).await
    }

    async fn reset(&self, turn: &mut Turn<'_>) -> Result<()> {
        turn.session.reset();
        self.show_menu(turn, Some("Conversation reset.")).await
    }

    /// The registered user behind this chat, or a prompt to register.
    async fn current_user(&self, turn: &mut Turn<'_>) -> Result<Option<User>> {
        let user = self.gateway.get_user_by_chat(turn.chat).await?;
        if user.is_none() {
            turn.say(NOT_REGISTERED);
        }
        Ok(user)
    }

    /// The current user if, right now, they are the cutter.
    async fn require_cutter(&self, turn: &mut Turn<'_>) -> Result<Option<User>> {
        let Some(user) = self.current_user(turn).await? else {
            return Ok(None);
        };
        if user.is_cutter() {
            Ok(Some(user))
        } else {
            debug!(chat = %turn.chat, role = %user.role, "Denied privileged action");
            turn.say(CUTTER_ONLY);
            Ok(None)
        }
    }

    /// Send the role's main menu, headed by `text` or a generic prompt.
    async fn show_menu(&self, turn: &mut Turn<'_>, text: Option<&str>) -> Result<()> {
        match self.gateway.get_user_by_chat(turn.chat).await? {
            Some(user) => {
                let text = text.unwrap_or("Choose an action:");
                turn.say(menu_reply(&user, text));
            }
            None => {
                if let Some(text) = text {
                    turn.say(text);
                }
                turn.say(NOT_REGISTERED);
            }
        }
        Ok(())
    }
}

/// Main menu rows for `user`'s role.
pub(crate) fn main_menu(user: &User) -> Vec<Vec<String>> {
    let rows: Vec<Vec<MenuItem>> = match user.role() {
        Some(Role::Cutter) => vec![
            vec![MenuItem::NewRecord],
            vec![MenuItem::ManageBatches, MenuItem::ManageUsers],
            vec![MenuItem::AllBatches, MenuItem::WorkerStats],
        ],
        Some(_) => vec![
            vec![MenuItem::StartWork, MenuItem::ChangeBatch],
            vec![MenuItem::MyData, MenuItem::EditEntries],
        ],
        None => {
            warn!(user = %user.name, role = %user.role, "Unrecognized role, showing fallback menu");
            vec![
                vec![MenuItem::StartWork, MenuItem::ChangeBatch],
                vec![MenuItem::MyData],
            ]
        }
    };
    rows.into_iter()
        .map(|row| row.into_iter().map(|item| item.label().to_string()).collect())
        .collect()
}

pub(crate) fn menu_reply(user: &User, text: impl Into<String>) -> Reply {
    Reply::text(text).with_menu(main_menu(user))
}

/// One button per batch.
pub(crate) fn batch_buttons(batches: &[Batch], payload: impl Fn(&Batch) -> Payload) -> Vec<Button> {
    batches
        .iter()
        .map(|batch| Button::new(format!("№{}", batch.number), payload(batch)))
        .collect()
}

pub(crate) fn cancel_button() -> Button {
    Button::new("Cancel", Payload::Cancel)
}
