//! Turning incoming events into routes.
//!
//! Button payloads are short underscore-delimited strings: an action tag,
//! optionally followed by a batch number or a numeric row id. Parsing does
//! prefix matching and field extraction only; whether the referenced row still
//! exists is the handler's problem.

use std::fmt;

use crate::role::Role;
use crate::session::{BatchAdminStep, EditStep, RecordingStep, Stage, UserAdminStep};
use crate::station::Station;

/// An event as delivered by the transport.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Incoming {
    Command { name: String, args: String },
    Button(String),
    Text(String),
}

impl Incoming {
    /// Classify a raw chat message. Anything starting with `/` or `prefix` is
    /// a command.
    pub fn from_message(content: &str, prefix: &str) -> Incoming {
        let trimmed = content.trim();
        let body = trimmed
            .strip_prefix('/')
            .or_else(|| (!prefix.is_empty()).then(|| trimmed.strip_prefix(prefix)).flatten());
        match body {
            Some(body) if !body.is_empty() => {
                let (name, args) = body.split_once(char::is_whitespace).unwrap_or((body, ""));
                Incoming::Command {
                    name: name.to_lowercase(),
                    args: args.trim().to_string(),
                }
            }
            _ => Incoming::Text(trimmed.to_string()),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Command {
    Start,
    Batches,
    Cancel,
    Me,
    Reset,
    Info,
    NewBatch,
    MyData,
    Equipment,
    Users,
    ManageBatches,
    Stats,
}

impl Command {
    pub const ALL: [Command; 12] = [
        Command::Start,
        Command::Batches,
        Command::Cancel,
        Command::Me,
        Command::Reset,
        Command::Info,
        Command::NewBatch,
        Command::MyData,
        Command::Equipment,
        Command::Users,
        Command::ManageBatches,
        Command::Stats,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Command::Start => "start",
            Command::Batches => "batches",
            Command::Cancel => "cancel",
            Command::Me => "me",
            Command::Reset => "reset",
            Command::Info => "info",
            Command::NewBatch => "newbatch",
            Command::MyData => "mydata",
            Command::Equipment => "equipment",
            Command::Users => "users",
            Command::ManageBatches => "managebatches",
            Command::Stats => "stats",
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            Command::Start => "Register or open your main menu",
            Command::Batches => "List batches",
            Command::Cancel => "Cancel the current action",
            Command::Me => "Show your profile",
            Command::Reset => "Reset the conversation",
            Command::Info => "Show the batch you are working on",
            Command::NewBatch => "Create a new batch (cutter)",
            Command::MyData => "Show your raw stored record",
            Command::Equipment => "Change your machine label",
            Command::Users => "Manage users (cutter)",
            Command::ManageBatches => "Manage batches (cutter)",
            Command::Stats => "Who did what across all batches (cutter)",
        }
    }

    /// Resolve a command name, accepting the legacy localized aliases.
    pub fn parse(name: &str) -> Option<Command> {
        let name = name.trim().trim_start_matches('/').to_lowercase();
        let command = match name.as_str() {
            "start" => Command::Start,
            "batches" | "parties" | "партии" => Command::Batches,
            "cancel" | "отмена" => Command::Cancel,
            "me" | "profile" => Command::Me,
            "reset" => Command::Reset,
            "info" | "инфо" => Command::Info,
            "newbatch" | "new_batch" | "new_party" | "новая_партия" => Command::NewBatch,
            "mydata" | "my_data" | "проверка" => Command::MyData,
            "equipment" | "change_machine" | "сменить_машинку" => Command::Equipment,
            "users" | "manage_users" | "управление_пользователями" => Command::Users,
            "managebatches" | "manage_batches" | "manage_parties" => Command::ManageBatches,
            "stats" | "workers_stats" => Command::Stats,
            _ => return None,
        };
        Some(command)
    }
}

/// Main menu entries. Pressing one sends its label as text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuItem {
    NewRecord,
    ManageBatches,
    ManageUsers,
    AllBatches,
    WorkerStats,
    StartWork,
    ChangeBatch,
    MyData,
    EditEntries,
}

impl MenuItem {
    pub const ALL: [MenuItem; 9] = [
        MenuItem::NewRecord,
        MenuItem::ManageBatches,
        MenuItem::ManageUsers,
        MenuItem::AllBatches,
        MenuItem::WorkerStats,
        MenuItem::StartWork,
        MenuItem::ChangeBatch,
        MenuItem::MyData,
        MenuItem::EditEntries,
    ];

    pub fn label(self) -> &'static str {
        match self {
            MenuItem::NewRecord => "New record",
            MenuItem::ManageBatches => "Manage batches",
            MenuItem::ManageUsers => "Manage users",
            MenuItem::AllBatches => "All batches",
            MenuItem::WorkerStats => "Worker stats",
            MenuItem::StartWork => "Start work",
            MenuItem::ChangeBatch => "Change batch",
            MenuItem::MyData => "My data",
            MenuItem::EditEntries => "Edit entries",
        }
    }

    pub fn from_label(text: &str) -> Option<MenuItem> {
        let text = text.trim();
        MenuItem::ALL
            .into_iter()
            .find(|item| item.label().eq_ignore_ascii_case(text))
    }
}

/// Every button payload the bot emits.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Payload {
    SelectBatch(String),
    SelectColor(i64),
    SelectRole(Role),
    SelectUser(i64),
    DeleteBatch(String),
    DeleteMaterial(i64),
    EditColor(i64),
    AddMaterial(i64),
    ContinueWork(i64),
    ViewWorkers(i64),
    ManageColors(i64),
    BatchBack(i64),
    EditCount(i64, Station),
    Cancel,
    ChangeBatch,
    NewBatch,
    SkipDesign,
    ConfirmBatchDelete,
    CancelBatchDelete,
    ConfirmMaterialDelete,
    CancelMaterialDelete,
    ConfirmDelete,
    CancelDelete,
    ListUsers,
    DeleteUser,
    ListAllBatches,
    DeleteBatchAction,
    CancelBatchManagement,
    CancelUserManagement,
    BackToBatches,
    AllWorkerStats,
}

const BARE_TAGS: &[(&str, Payload)] = &[
    ("cancel", Payload::Cancel),
    ("change_party", Payload::ChangeBatch),
    ("new_party", Payload::NewBatch),
    ("skip_design", Payload::SkipDesign),
    ("confirm_party_delete", Payload::ConfirmBatchDelete),
    ("cancel_party_delete", Payload::CancelBatchDelete),
    ("confirm_material_delete", Payload::ConfirmMaterialDelete),
    ("cancel_material_delete", Payload::CancelMaterialDelete),
    ("confirm_delete", Payload::ConfirmDelete),
    ("cancel_delete", Payload::CancelDelete),
    ("list_users", Payload::ListUsers),
    ("delete_user", Payload::DeleteUser),
    ("list_all_parties", Payload::ListAllBatches),
    ("delete_party_action", Payload::DeleteBatchAction),
    ("cancel_party_management", Payload::CancelBatchManagement),
    ("cancel_user_management", Payload::CancelUserManagement),
    ("back_to_parties", Payload::BackToBatches),
    ("full_workers_stats", Payload::AllWorkerStats),
];

fn id(raw: &str) -> Option<i64> {
    raw.parse().ok()
}

fn number(raw: &str) -> Option<String> {
    (!raw.is_empty()).then(|| raw.to_string())
}

impl Payload {
    pub fn parse(raw: &str) -> Option<Payload> {
        if let Some((_, payload)) = BARE_TAGS.iter().find(|(tag, _)| *tag == raw) {
            return Some(payload.clone());
        }

        // `party_back_<id>` shares its prefix with `party_<number>`; a
        // non-numeric tail is a batch number.
        if let Some(back) = raw.strip_prefix("party_back_").and_then(id) {
            return Some(Payload::BatchBack(back));
        }
        if let Some(rest) = raw.strip_prefix("party_") {
            return number(rest).map(Payload::SelectBatch);
        }
        if let Some(rest) = raw.strip_prefix("delete_party_") {
            return number(rest).map(Payload::DeleteBatch);
        }
        if let Some(rest) = raw.strip_prefix("edit_count_") {
            let (line, station) = rest.split_once('_')?;
            return Some(Payload::EditCount(id(line)?, Station::from_key(station)?));
        }
        if let Some(rest) = raw.strip_prefix("role_") {
            return Role::from_key(rest).map(Payload::SelectRole);
        }

        let numeric: [(&str, fn(i64) -> Payload); 8] = [
            ("color_", Payload::SelectColor),
            ("select_user_", Payload::SelectUser),
            ("delete_material_", Payload::DeleteMaterial),
            ("edit_color_", Payload::EditColor),
            ("add_material_", Payload::AddMaterial),
            ("continue_work_", Payload::ContinueWork),
            ("view_workers_", Payload::ViewWorkers),
            ("manage_colors_", Payload::ManageColors),
        ];
        numeric
            .iter()
            .find_map(|(prefix, build)| raw.strip_prefix(prefix).and_then(id).map(build))
    }
}

impl fmt::Display for Payload {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Payload::SelectBatch(n) => write!(f, "party_{n}"),
            Payload::SelectColor(id) => write!(f, "color_{id}"),
            Payload::SelectRole(role) => write!(f, "role_{}", role.key()),
            Payload::SelectUser(id) => write!(f, "select_user_{id}"),
            Payload::DeleteBatch(n) => write!(f, "delete_party_{n}"),
            Payload::DeleteMaterial(id) => write!(f, "delete_material_{id}"),
            Payload::EditColor(id) => write!(f, "edit_color_{id}"),
            Payload::AddMaterial(id) => write!(f, "add_material_{id}"),
            Payload::ContinueWork(id) => write!(f, "continue_work_{id}"),
            Payload::ViewWorkers(id) => write!(f, "view_workers_{id}"),
            Payload::ManageColors(id) => write!(f, "manage_colors_{id}"),
            Payload::BatchBack(id) => write!(f, "party_back_{id}"),
            Payload::EditCount(id, station) => write!(f, "edit_count_{id}_{}", station.key()),
            bare => {
                let tag = BARE_TAGS
                    .iter()
                    .find(|(_, payload)| payload == bare)
                    .map(|(tag, _)| *tag)
                    .unwrap_or("cancel");
                f.write_str(tag)
            }
        }
    }
}

/// Whether `number` survives the trip through the payloads that carry it.
/// Numbers like `action` or `back_3` would be read back as other buttons.
pub fn is_addressable_batch_number(number: &str) -> bool {
    [
        Payload::SelectBatch(number.to_string()),
        Payload::DeleteBatch(number.to_string()),
    ]
    .into_iter()
    .all(|payload| Payload::parse(&payload.to_string()).as_ref() == Some(&payload))
}

/// What the workflow should do with an event.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Route {
    Command(Command),
    UnknownCommand(String),
    Cancel,
    Menu(MenuItem),
    /// Free text consumed by the current stage.
    Input(String),
    /// A button the current stage is waiting for.
    StageButton(Payload),
    /// A button handled the same way in any stage.
    Button(Payload),
    /// A payload nothing understands, usually from an outdated message.
    StaleButton(String),
    Unrecognized(String),
}

/// Whether `stage` is the one waiting for `payload`.
fn stage_accepts(stage: &Stage, payload: &Payload) -> bool {
    use Payload as P;
    match stage {
        Stage::AwaitingRole { .. } => matches!(payload, P::SelectRole(_)),
        Stage::AwaitingDesign { .. } => matches!(payload, P::SkipDesign),
        Stage::ConfirmingMaterialDelete { .. } => {
            matches!(payload, P::ConfirmMaterialDelete | P::CancelMaterialDelete)
        }
        Stage::Recording { step, .. } => match step {
            RecordingStep::SelectingBatch => matches!(payload, P::SelectBatch(_)),
            RecordingStep::SelectingColor { .. } => matches!(payload, P::SelectColor(_)),
            _ => false,
        },
        Stage::Editing(step) => match step {
            EditStep::SelectingBatch => matches!(payload, P::SelectBatch(_)),
            EditStep::SelectingEntry { .. } => matches!(payload, P::EditCount(..)),
            EditStep::AwaitingCount { .. } => false,
        },
        Stage::ManagingUsers(step) => match step {
            UserAdminStep::ChoosingAction => matches!(
                payload,
                P::ListUsers | P::DeleteUser | P::CancelUserManagement
            ),
            UserAdminStep::SelectingTarget => matches!(payload, P::SelectUser(_) | P::CancelDelete),
            UserAdminStep::Confirming { .. } => matches!(payload, P::ConfirmDelete | P::CancelDelete),
        },
        Stage::ManagingBatches(step) => match step {
            BatchAdminStep::ChoosingAction => matches!(
                payload,
                P::ListAllBatches | P::DeleteBatchAction | P::CancelBatchManagement
            ),
            BatchAdminStep::SelectingTarget => {
                matches!(payload, P::DeleteBatch(_) | P::CancelBatchManagement)
            }
            BatchAdminStep::Confirming { .. } => {
                matches!(payload, P::ConfirmBatchDelete | P::CancelBatchDelete)
            }
        },
        _ => false,
    }
}

/// Resolve an event against the chat's current stage.
pub fn resolve(incoming: &Incoming, stage: &Stage) -> Route {
    match incoming {
        Incoming::Command { name, .. } => match Command::parse(name) {
            Some(Command::Cancel) => Route::Cancel,
            Some(command) => Route::Command(command),
            None => Route::UnknownCommand(name.clone()),
        },
        Incoming::Button(raw) => match Payload::parse(raw) {
            Some(Payload::Cancel) => Route::Cancel,
            Some(payload) if stage_accepts(stage, &payload) => Route::StageButton(payload),
            Some(payload) => Route::Button(payload),
            None => Route::StaleButton(raw.clone()),
        },
        Incoming::Text(text) => {
            if stage.expects_text() {
                Route::Input(text.clone())
            } else if let Some(item) = MenuItem::from_label(text) {
                Route::Menu(item)
            } else {
                Route::Unrecognized(text.clone())
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::session::BatchRef;
    use pretty_assertions::assert_eq;

    #[test]
    fn payloads_round_trip() {
        let samples = vec![
            Payload::SelectBatch("100".into()),
            Payload::SelectBatch("A_7".into()),
            Payload::SelectColor(3),
            Payload::SelectRole(Role::QualityControl),
            Payload::SelectUser(9),
            Payload::DeleteBatch("100".into()),
            Payload::DeleteMaterial(4),
            Payload::EditColor(4),
            Payload::AddMaterial(2),
            Payload::ContinueWork(2),
            Payload::ViewWorkers(2),
            Payload::ManageColors(2),
            Payload::BatchBack(2),
            Payload::EditCount(12, Station::QualityControl),
            Payload::ConfirmBatchDelete,
            Payload::CancelUserManagement,
            Payload::AllWorkerStats,
        ];
        for payload in samples {
            let encoded = payload.to_string();
            assert_eq!(Payload::parse(&encoded), Some(payload), "{encoded}");
        }
    }

    #[test]
    fn payload_grammar_matches_wire_strings() {
        assert_eq!(
            Payload::parse("party_back_5"),
            Some(Payload::BatchBack(5))
        );
        assert_eq!(
            Payload::parse("party_100"),
            Some(Payload::SelectBatch("100".into()))
        );
        assert_eq!(
            Payload::parse("delete_party_action"),
            Some(Payload::DeleteBatchAction)
        );
        assert_eq!(
            Payload::parse("delete_party_100"),
            Some(Payload::DeleteBatch("100".into()))
        );
        assert_eq!(
            Payload::parse("edit_count_7_four_needle"),
            Some(Payload::EditCount(7, Station::FourNeedle))
        );
        assert_eq!(Payload::parse("delete_user"), Some(Payload::DeleteUser));
        assert_eq!(Payload::parse("color_x"), None);
        assert_eq!(Payload::parse("edit_count_7_spinning"), None);
        assert_eq!(Payload::parse("party_"), None);
    }

    #[test]
    fn batch_numbers_that_collide_with_tags() {
        assert!(is_addressable_batch_number("100"));
        assert!(is_addressable_batch_number("A-7 winter"));
        assert!(is_addressable_batch_number("back_x"));
        assert_eq!(
            Payload::parse("party_back_x"),
            Some(Payload::SelectBatch("back_x".into()))
        );
        assert!(!is_addressable_batch_number("action"));
        assert!(!is_addressable_batch_number("back_3"));
    }

    #[test]
    fn messages_become_commands_or_text() {
        assert_eq!(
            Incoming::from_message("/start", "!"),
            Incoming::Command {
                name: "start".into(),
                args: String::new()
            }
        );
        assert_eq!(
            Incoming::from_message("!Info now", "!"),
            Incoming::Command {
                name: "info".into(),
                args: "now".into()
            }
        );
        assert_eq!(
            Incoming::from_message("  Red ", "!"),
            Incoming::Text("Red".into())
        );
        assert_eq!(Incoming::from_message("/", "!"), Incoming::Text("/".into()));
    }

    #[test]
    fn commands_accept_legacy_aliases() {
        assert_eq!(Command::parse("parties"), Some(Command::Batches));
        assert_eq!(Command::parse("отмена"), Some(Command::Cancel));
        assert_eq!(Command::parse("change_machine"), Some(Command::Equipment));
        for command in Command::ALL {
            assert_eq!(Command::parse(command.name()), Some(command));
        }
        assert_eq!(Command::parse("dance"), None);
    }

    #[test]
    fn text_goes_to_the_waiting_stage_first() {
        let waiting = Stage::AwaitingColor {
            batch: BatchRef {
                id: 1,
                number: "100".into(),
            },
        };
        assert_eq!(
            resolve(&Incoming::Text("Start work".into()), &waiting),
            Route::Input("Start work".into())
        );
        assert_eq!(
            resolve(&Incoming::Text("start work".into()), &Stage::Idle),
            Route::Menu(MenuItem::StartWork)
        );
        assert_eq!(
            resolve(&Incoming::Text("hello".into()), &Stage::Idle),
            Route::Unrecognized("hello".into())
        );
    }

    #[test]
    fn buttons_prefer_the_waiting_stage() {
        let picking = Stage::Recording {
            station: Station::Collar,
            step: RecordingStep::SelectingBatch,
        };
        let button = Incoming::Button("party_100".into());
        assert_eq!(
            resolve(&button, &picking),
            Route::StageButton(Payload::SelectBatch("100".into()))
        );
        assert_eq!(
            resolve(&button, &Stage::Idle),
            Route::Button(Payload::SelectBatch("100".into()))
        );
        assert_eq!(
            resolve(&Incoming::Button("cancel".into()), &picking),
            Route::Cancel
        );
        assert_eq!(
            resolve(&Incoming::Button("bogus".into()), &picking),
            Route::StaleButton("bogus".into())
        );
    }

    #[test]
    fn cancel_command_routes_everywhere() {
        let cancel = Incoming::Command {
            name: "cancel".into(),
            args: String::new(),
        };
        assert_eq!(resolve(&cancel, &Stage::AwaitingName), Route::Cancel);
        assert_eq!(resolve(&cancel, &Stage::Idle), Route::Cancel);
    }
}
