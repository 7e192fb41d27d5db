//! End-to-end conversations against an in-memory store.

use pretty_assertions::assert_eq;
use stitchline_core::db::{Gateway, client};
use stitchline_core::model::{
    MAX_BATCH_NUMBER_LEN, MAX_COLOR_LEN, MAX_COUNT, MAX_UNIT_COUNT, MIN_COUNT, NewUser, SlotEntry,
};
use stitchline_core::session::{RecordingStep, SessionStore, Stage};
use stitchline_core::{Batch, ChatId, Event, MaterialLine, Reply, Station, Workshop};

const CUTTER: ChatId = ChatId(1);
const IVAN: ChatId = ChatId(2);
const MARIA: ChatId = ChatId(3);

async fn workshop() -> Workshop {
    let db = client::create_test_db().await.unwrap();
    Workshop::new(Gateway::with_connection(db), SessionStore::new(None), Some(CUTTER))
}

async fn say(shop: &Workshop, chat: ChatId, text: &str) -> Vec<Reply> {
    shop.handle(Event::text(chat, text)).await
}

async fn press(shop: &Workshop, chat: ChatId, payload: &str) -> Vec<Reply> {
    shop.handle(Event::button(chat, payload)).await
}

async fn command(shop: &Workshop, chat: ChatId, name: &str) -> Vec<Reply> {
    shop.handle(Event::command(chat, name)).await
}

fn last(replies: &[Reply]) -> &str {
    replies.last().map(|r| r.text.as_str()).unwrap_or_default()
}

fn all_text(replies: &[Reply]) -> String {
    replies
        .iter()
        .map(|r| r.text.as_str())
        .collect::<Vec<_>>()
        .join("\n")
}

async fn register_cutter(shop: &Workshop) {
    command(shop, CUTTER, "start").await;
    let replies = say(shop, CUTTER, "Olga").await;
    assert!(last(&replies).contains("registered as Cutter"), "{replies:?}");
}

async fn register_worker(shop: &Workshop, chat: ChatId, name: &str, role_key: &str) {
    command(shop, chat, "start").await;
    let replies = say(shop, chat, name).await;
    assert!(
        replies[0].payloads().contains(&format!("role_{role_key}").as_str()),
        "{replies:?}"
    );
    let replies = press(shop, chat, &format!("role_{role_key}")).await;
    assert!(last(&replies).contains("Registration complete"), "{replies:?}");
}

/// The cutter opens batch 100 and adds Red with three lines.
async fn batch_100_red(shop: &Workshop) -> (Batch, MaterialLine) {
    register_cutter(shop).await;
    say(shop, CUTTER, "New record").await;
    assert_eq!(shop.sessions().stage(CUTTER).await, Stage::AwaitingBatchNumber);
    say(shop, CUTTER, "100").await;
    press(shop, CUTTER, "skip_design").await;
    say(shop, CUTTER, "Red").await;
    say(shop, CUTTER, "3").await;

    let batch = shop.gateway().get_batch("100").await.unwrap().unwrap();
    let lines = shop.gateway().list_materials(batch.id).await.unwrap();
    assert_eq!(lines.len(), 1);
    (batch, lines.into_iter().next().unwrap())
}

async fn record(shop: &Workshop, chat: ChatId, line: &MaterialLine, count: &str) -> Vec<Reply> {
    say(shop, chat, "Start work").await;
    press(shop, chat, "party_100").await;
    press(shop, chat, &format!("color_{}", line.id)).await;
    say(shop, chat, count).await
}

#[tokio::test]
async fn cutter_creates_batch_with_derived_pieces() {
    let shop = workshop().await;
    let (batch, line) = batch_100_red(&shop).await;

    assert_eq!(batch.design, None);
    assert_eq!(line.color, "Red");
    assert_eq!(line.unit_count, 3);
    assert_eq!(line.piece_count, 15);
    for station in Station::ALL {
        assert!(!line.slot(station).is_done(), "{station} should be empty");
    }
    assert_eq!(shop.sessions().stage(CUTTER).await, Stage::Idle);
}

#[tokio::test]
async fn cutter_sees_detailed_report_after_adding_a_color() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    command(&shop, CUTTER, "newbatch").await;
    say(&shop, CUTTER, "100").await;
    say(&shop, CUTTER, "Nike").await;
    say(&shop, CUTTER, "Red").await;
    let replies = say(&shop, CUTTER, "3").await;

    let text = all_text(&replies);
    assert!(text.contains("Added Red to batch №100: 3 lines, 15 pieces."), "{text}");
    assert!(text.contains("Design: Nike"), "{text}");
    assert!(text.contains("Total pieces: 15"), "{text}");
    let batch = shop.gateway().get_batch("100").await.unwrap().unwrap();
    assert!(replies.last().unwrap().payloads().contains(&format!("add_material_{}", batch.id).as_str()));
}

#[tokio::test]
async fn four_needle_is_asked_for_a_machine_then_overwrites() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "four_needle").await;

    say(&shop, IVAN, "Start work").await;
    press(&shop, IVAN, "party_100").await;
    let replies = press(&shop, IVAN, &format!("color_{}", line.id)).await;
    assert!(last(&replies).contains("machine label"), "{replies:?}");
    assert!(matches!(
        shop.sessions().stage(IVAN).await,
        Stage::Recording {
            step: RecordingStep::AwaitingEquipment { .. },
            ..
        }
    ));
    say(&shop, IVAN, "Machine-3").await;
    let replies = say(&shop, IVAN, "10").await;
    assert!(last(&replies).starts_with("Recorded 10 for Red"), "{replies:?}");

    let ivan = shop.gateway().get_user_by_chat(IVAN).await.unwrap().unwrap();
    assert_eq!(ivan.equipment.as_deref(), Some("Machine-3"));
    let slot = shop.gateway().get_material(line.id).await.unwrap().unwrap().slot(Station::FourNeedle);
    assert_eq!(slot.worker.as_deref(), Some("Ivan"));
    assert_eq!(slot.worker_id, Some(ivan.id));
    assert_eq!(slot.quantity, Some(10));

    // Machine is on file now, so the second pass goes straight to the count.
    let replies = record(&shop, IVAN, &line, "7").await;
    assert!(last(&replies).starts_with("Recorded 7 for Red"), "{replies:?}");
    let slot = shop.gateway().get_material(line.id).await.unwrap().unwrap().slot(Station::FourNeedle);
    assert_eq!(slot.quantity, Some(7));
}

#[tokio::test]
async fn other_stations_skip_the_machine_prompt() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, MARIA, "Maria", "quality_control").await;

    record(&shop, MARIA, &line, "15").await;
    let stored = shop.gateway().get_material(line.id).await.unwrap().unwrap();
    assert_eq!(stored.slot(Station::QualityControl).quantity, Some(15));
    assert_eq!(stored.slot(Station::FourNeedle).quantity, None);
}

#[tokio::test]
async fn unit_count_rejects_bad_input_in_place() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    command(&shop, CUTTER, "newbatch").await;
    say(&shop, CUTTER, "100").await;
    press(&shop, CUTTER, "skip_design").await;
    say(&shop, CUTTER, "Red").await;
    let waiting = shop.sessions().stage(CUTTER).await;
    assert!(matches!(waiting, Stage::AwaitingUnitCount { .. }));

    for bad in ["abc", "-1", "0", "2.5"] {
        say(&shop, CUTTER, bad).await;
        assert_eq!(shop.sessions().stage(CUTTER).await, waiting, "input {bad}");
    }
    let batch = shop.gateway().get_batch("100").await.unwrap().unwrap();
    assert_eq!(shop.gateway().count_materials(batch.id).await.unwrap(), 0);
}

#[tokio::test]
async fn negative_counts_are_accepted_when_recording_but_not_when_editing() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, MARIA, "Maria", "packer").await;

    say(&shop, MARIA, "Start work").await;
    press(&shop, MARIA, "party_100").await;
    press(&shop, MARIA, &format!("color_{}", line.id)).await;
    let waiting = shop.sessions().stage(MARIA).await;
    say(&shop, MARIA, "abc").await;
    assert_eq!(shop.sessions().stage(MARIA).await, waiting);
    say(&shop, MARIA, "-1").await;
    assert_eq!(shop.sessions().stage(MARIA).await, Stage::Idle);
    let slot = shop.gateway().get_material(line.id).await.unwrap().unwrap().slot(Station::Packer);
    assert_eq!(slot.quantity, Some(-1));

    say(&shop, MARIA, "Edit entries").await;
    press(&shop, MARIA, "party_100").await;
    let replies = press(&shop, MARIA, &format!("edit_count_{}_packer", line.id)).await;
    assert!(last(&replies).contains("currently -1"), "{replies:?}");
    let waiting = shop.sessions().stage(MARIA).await;
    for bad in ["-1", "abc"] {
        say(&shop, MARIA, bad).await;
        assert_eq!(shop.sessions().stage(MARIA).await, waiting, "input {bad}");
    }
    let replies = say(&shop, MARIA, "12").await;
    assert_eq!(last(&replies), "Updated Red at Packing: -1 → 12.");
    let slot = shop.gateway().get_material(line.id).await.unwrap().unwrap().slot(Station::Packer);
    assert_eq!(slot.quantity, Some(12));
}

#[tokio::test]
async fn unit_count_too_large_for_pieces_is_rejected_in_place() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    command(&shop, CUTTER, "newbatch").await;
    say(&shop, CUTTER, "100").await;
    press(&shop, CUTTER, "skip_design").await;
    say(&shop, CUTTER, "Red").await;
    let waiting = shop.sessions().stage(CUTTER).await;

    let replies = say(&shop, CUTTER, "2000000000000000000").await;
    assert!(last(&replies).contains("at most"), "{replies:?}");
    assert_eq!(shop.sessions().stage(CUTTER).await, waiting);
    let too_many = (MAX_UNIT_COUNT + 1).to_string();
    say(&shop, CUTTER, &too_many).await;
    assert_eq!(shop.sessions().stage(CUTTER).await, waiting);
    let batch = shop.gateway().get_batch("100").await.unwrap().unwrap();
    assert_eq!(shop.gateway().count_materials(batch.id).await.unwrap(), 0);

    say(&shop, CUTTER, &MAX_UNIT_COUNT.to_string()).await;
    let lines = shop.gateway().list_materials(batch.id).await.unwrap();
    assert_eq!(lines[0].piece_count, MAX_UNIT_COUNT * 5);
}

#[tokio::test]
async fn station_counts_are_bounded_and_reports_survive_large_values() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "splitter").await;
    register_worker(&shop, MARIA, "Maria", "binder").await;

    say(&shop, IVAN, "Start work").await;
    press(&shop, IVAN, "party_100").await;
    press(&shop, IVAN, &format!("color_{}", line.id)).await;
    let waiting = shop.sessions().stage(IVAN).await;
    for bad in ["9223372036854775807", "-9223372036854775808", "2147483648"] {
        let replies = say(&shop, IVAN, bad).await;
        assert!(last(&replies).contains("must be between"), "input {bad}: {replies:?}");
        assert_eq!(shop.sessions().stage(IVAN).await, waiting, "input {bad}");
    }
    let replies = say(&shop, IVAN, &MAX_COUNT.to_string()).await;
    assert!(last(&replies).starts_with(&format!("Recorded {MAX_COUNT} for Red")), "{replies:?}");
    let replies = record(&shop, MARIA, &line, &MAX_COUNT.to_string()).await;
    assert!(last(&replies).starts_with(&format!("Recorded {MAX_COUNT} for Red")), "{replies:?}");

    let replies = press(&shop, CUTTER, "party_100").await;
    let text = all_text(&replies);
    assert!(text.contains(&format!("Completed operations: {}", MAX_COUNT * 2)), "{text}");

    // Negative counts still pass when recording.
    let replies = record(&shop, MARIA, &line, &MIN_COUNT.to_string()).await;
    assert!(last(&replies).starts_with(&format!("Recorded {MIN_COUNT} for Red")), "{replies:?}");
}

#[tokio::test]
async fn edited_counts_are_bounded() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, MARIA, "Maria", "packer").await;
    record(&shop, MARIA, &line, "4").await;

    say(&shop, MARIA, "Edit entries").await;
    press(&shop, MARIA, "party_100").await;
    press(&shop, MARIA, &format!("edit_count_{}_packer", line.id)).await;
    let waiting = shop.sessions().stage(MARIA).await;
    let replies = say(&shop, MARIA, "9223372036854775807").await;
    assert!(last(&replies).contains("at most"), "{replies:?}");
    assert_eq!(shop.sessions().stage(MARIA).await, waiting);

    say(&shop, MARIA, &MAX_COUNT.to_string()).await;
    let slot = shop.gateway().get_material(line.id).await.unwrap().unwrap().slot(Station::Packer);
    assert_eq!(slot.quantity, Some(MAX_COUNT));
}

#[tokio::test]
async fn long_batch_numbers_and_colors_are_rejected_in_place() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    command(&shop, CUTTER, "newbatch").await;

    let replies = say(&shop, CUTTER, &"9".repeat(MAX_BATCH_NUMBER_LEN + 1)).await;
    assert!(last(&replies).contains("at most"), "{replies:?}");
    assert_eq!(shop.sessions().stage(CUTTER).await, Stage::AwaitingBatchNumber);
    assert!(shop.gateway().list_batches().await.unwrap().is_empty());

    let number = "Ж".repeat(MAX_BATCH_NUMBER_LEN);
    say(&shop, CUTTER, &number).await;
    press(&shop, CUTTER, "skip_design").await;
    let waiting = shop.sessions().stage(CUTTER).await;
    let replies = say(&shop, CUTTER, &"r".repeat(MAX_COLOR_LEN + 1)).await;
    assert!(last(&replies).contains("at most"), "{replies:?}");
    assert_eq!(shop.sessions().stage(CUTTER).await, waiting);

    say(&shop, CUTTER, &"r".repeat(MAX_COLOR_LEN)).await;
    let replies = say(&shop, CUTTER, "2").await;
    assert!(replies.iter().flat_map(|r| r.payloads()).all(|p| p.chars().count() <= 100), "{replies:?}");
    let batch = shop.gateway().get_batch(&number).await.unwrap().unwrap();
    let lines = shop.gateway().list_materials(batch.id).await.unwrap();
    assert_eq!(lines[0].color.len(), MAX_COLOR_LEN);

    press(&shop, CUTTER, &format!("edit_color_{}", lines[0].id)).await;
    let waiting = shop.sessions().stage(CUTTER).await;
    say(&shop, CUTTER, &"c".repeat(MAX_COLOR_LEN + 1)).await;
    assert_eq!(shop.sessions().stage(CUTTER).await, waiting);
}

#[tokio::test]
async fn batch_numbers_that_shadow_buttons_are_rejected() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    command(&shop, CUTTER, "newbatch").await;

    for bad in ["action", "back_3"] {
        let replies = say(&shop, CUTTER, bad).await;
        assert!(last(&replies).contains("cannot be used"), "input {bad}: {replies:?}");
        assert_eq!(shop.sessions().stage(CUTTER).await, Stage::AwaitingBatchNumber);
    }
    assert!(shop.gateway().list_batches().await.unwrap().is_empty());

    say(&shop, CUTTER, "back_x").await;
    press(&shop, CUTTER, "skip_design").await;
    say(&shop, CUTTER, "Red").await;
    say(&shop, CUTTER, "1").await;
    let replies = press(&shop, CUTTER, "party_back_x").await;
    assert!(all_text(&replies).contains("Red"), "{replies:?}");
    assert!(!last(&replies).starts_with("Batch not found"), "{replies:?}");
}

#[tokio::test]
async fn editing_is_limited_to_own_entries() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "collar").await;
    register_worker(&shop, MARIA, "Maria", "binder").await;
    record(&shop, IVAN, &line, "4").await;

    let replies = say(&shop, MARIA, "Edit entries").await;
    assert_eq!(last(&replies), "You have no recorded entries to edit.");

    say(&shop, MARIA, "Edit entries").await;
    // Forged payload for Ivan's slot while Maria is idle.
    let replies = press(&shop, MARIA, &format!("edit_count_{}_collar", line.id)).await;
    assert!(last(&replies).contains("expired"), "{replies:?}");

    say(&shop, IVAN, "Edit entries").await;
    let replies = press(&shop, IVAN, "party_100").await;
    assert_eq!(
        replies[0].payloads(),
        vec![format!("edit_count_{}_collar", line.id).as_str(), "cancel"]
    );
}

#[tokio::test]
async fn workers_are_denied_privileged_actions() {
    let shop = workshop().await;
    let (batch, line) = batch_100_red(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "splitter").await;

    for name in ["newbatch", "users", "managebatches", "stats"] {
        let replies = command(&shop, IVAN, name).await;
        assert_eq!(last(&replies), "Only the cutter can do that.", "/{name}");
        assert_eq!(shop.sessions().stage(IVAN).await, Stage::Idle, "/{name}");
    }
    for text in ["New record", "Manage batches", "Manage users", "Worker stats"] {
        let replies = say(&shop, IVAN, text).await;
        assert_eq!(last(&replies), "Only the cutter can do that.", "{text}");
    }
    let payloads = [
        format!("add_material_{}", batch.id),
        format!("manage_colors_{}", batch.id),
        format!("view_workers_{}", batch.id),
        format!("delete_material_{}", line.id),
        format!("edit_color_{}", line.id),
        "list_users".to_string(),
        "delete_user".to_string(),
        "delete_party_action".to_string(),
        "full_workers_stats".to_string(),
    ];
    for payload in payloads {
        let replies = press(&shop, IVAN, &payload).await;
        assert_eq!(last(&replies), "Only the cutter can do that.", "{payload}");
    }

    assert!(shop.gateway().get_batch("100").await.unwrap().is_some());
    assert!(shop.gateway().get_material(line.id).await.unwrap().is_some());
}

#[tokio::test]
async fn deleting_a_batch_cascades_to_its_colors() {
    let shop = workshop().await;
    let (batch, red) = batch_100_red(&shop).await;
    press(&shop, CUTTER, &format!("add_material_{}", batch.id)).await;
    say(&shop, CUTTER, "Blue").await;
    say(&shop, CUTTER, "2").await;

    say(&shop, CUTTER, "Manage batches").await;
    press(&shop, CUTTER, "delete_party_action").await;
    let replies = press(&shop, CUTTER, "delete_party_100").await;
    assert!(last(&replies).contains("Its 2 colors"), "{replies:?}");
    let replies = press(&shop, CUTTER, "confirm_party_delete").await;
    assert!(last(&replies).starts_with("Batch №100 deleted"), "{replies:?}");

    assert_eq!(shop.gateway().get_batch("100").await.unwrap(), None);
    assert_eq!(shop.gateway().get_material(red.id).await.unwrap(), None);
    assert!(shop.gateway().list_materials(batch.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn stale_batch_buttons_report_not_found() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "presser").await;

    say(&shop, IVAN, "Start work").await;
    press(&shop, IVAN, "party_100").await;
    shop.gateway().delete_batch("100").await.unwrap();

    let replies = press(&shop, IVAN, &format!("color_{}", line.id)).await;
    assert!(last(&replies).starts_with("Color not found"), "{replies:?}");
    assert_eq!(shop.sessions().stage(IVAN).await, Stage::Idle);
}

#[tokio::test]
async fn existing_batch_number_is_reused() {
    let shop = workshop().await;
    batch_100_red(&shop).await;

    command(&shop, CUTTER, "newbatch").await;
    say(&shop, CUTTER, "100").await;
    let replies = say(&shop, CUTTER, "Adidas").await;
    assert!(all_text(&replies).contains("already exists"), "{replies:?}");

    let batches = shop.gateway().list_batches().await.unwrap();
    assert_eq!(batches.len(), 1);
    assert_eq!(batches[0].design.as_deref(), Some("Adidas"));
}

#[tokio::test]
async fn material_delete_returns_to_color_management() {
    let shop = workshop().await;
    let (batch, line) = batch_100_red(&shop).await;

    press(&shop, CUTTER, &format!("delete_material_{}", line.id)).await;
    let replies = press(&shop, CUTTER, "confirm_material_delete").await;
    assert_eq!(replies[0].text, "Deleted Red.");
    assert_eq!(last(&replies), "Batch №100 has no colors yet.");
    assert_eq!(
        replies.last().unwrap().payloads(),
        vec![format!("party_back_{}", batch.id).as_str()]
    );
    assert_eq!(shop.gateway().count_materials(batch.id).await.unwrap(), 0);
}

#[tokio::test]
async fn renaming_a_color_keeps_its_progress() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    shop.gateway()
        .update_station_slot(
            line.id,
            Station::Binder,
            SlotEntry {
                worker: "Ivan".into(),
                worker_id: None,
                quantity: 5,
            },
        )
        .await
        .unwrap();

    press(&shop, CUTTER, &format!("edit_color_{}", line.id)).await;
    let replies = say(&shop, CUTTER, "Crimson").await;
    assert_eq!(replies[0].text, "Renamed Red to Crimson.");

    let stored = shop.gateway().get_material(line.id).await.unwrap().unwrap();
    assert_eq!(stored.color, "Crimson");
    assert_eq!(stored.slot(Station::Binder).quantity, Some(5));
}

#[tokio::test]
async fn cutter_removes_a_user() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "collar").await;
    let ivan = shop.gateway().get_user_by_chat(IVAN).await.unwrap().unwrap();

    say(&shop, CUTTER, "Manage users").await;
    let replies = press(&shop, CUTTER, "delete_user").await;
    assert_eq!(
        replies[0].payloads(),
        vec![format!("select_user_{}", ivan.id).as_str(), "cancel_delete"]
    );
    press(&shop, CUTTER, &format!("select_user_{}", ivan.id)).await;
    let replies = press(&shop, CUTTER, "confirm_delete").await;
    assert!(all_text(&replies).contains("User Ivan deleted."), "{replies:?}");
    assert_eq!(shop.gateway().get_user(ivan.id).await.unwrap(), None);
}

#[tokio::test]
async fn cancel_abandons_any_form() {
    let shop = workshop().await;
    register_cutter(&shop).await;
    command(&shop, CUTTER, "newbatch").await;
    say(&shop, CUTTER, "100").await;
    let replies = press(&shop, CUTTER, "cancel").await;
    assert_eq!(replies[0].text, "Cancelled.");
    assert_eq!(shop.sessions().stage(CUTTER).await, Stage::Idle);
    assert_eq!(shop.gateway().get_batch("100").await.unwrap(), None);
}

#[tokio::test]
async fn privileged_chat_is_upgraded_on_start() {
    let shop = workshop().await;
    shop.gateway()
        .create_user(NewUser {
            chat_id: CUTTER,
            name: "Olga".into(),
            role: "Упаковка".into(),
            equipment: None,
        })
        .await
        .unwrap();

    command(&shop, CUTTER, "start").await;
    let olga = shop.gateway().get_user_by_chat(CUTTER).await.unwrap().unwrap();
    assert_eq!(olga.role, "Cutter");
}

#[tokio::test]
async fn workers_cannot_pick_the_cutter_role() {
    let shop = workshop().await;
    command(&shop, IVAN, "start").await;
    say(&shop, IVAN, "Ivan").await;
    let replies = press(&shop, IVAN, "role_cutter").await;
    assert!(last(&replies).contains("cannot be chosen"), "{replies:?}");
    assert_eq!(shop.gateway().get_user_by_chat(IVAN).await.unwrap(), None);
}

#[tokio::test]
async fn unknown_roles_pass_through_without_a_station() {
    let shop = workshop().await;
    shop.gateway()
        .create_user(NewUser {
            chat_id: IVAN,
            name: "Ivan".into(),
            role: "Supervisor".into(),
            equipment: None,
        })
        .await
        .unwrap();

    let replies = say(&shop, IVAN, "Start work").await;
    assert!(last(&replies).contains("not linked to a station"), "{replies:?}");
    let replies = say(&shop, IVAN, "Manage users").await;
    assert_eq!(last(&replies), "Only the cutter can do that.");
}

#[tokio::test]
async fn my_data_sums_only_own_entries() {
    let shop = workshop().await;
    let (_, line) = batch_100_red(&shop).await;
    register_worker(&shop, IVAN, "Ivan", "topstitch").await;
    register_worker(&shop, MARIA, "Maria", "binder").await;
    record(&shop, IVAN, &line, "6").await;
    record(&shop, MARIA, &line, "9").await;

    let replies = say(&shop, IVAN, "My data").await;
    let text = last(&replies);
    assert!(text.contains("Your recorded total: 6"), "{text}");
    assert!(text.contains("Current batch: 100"), "{text}");
}
