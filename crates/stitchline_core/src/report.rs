//! Plain-text reports shown to workers and the cutter.

use chrono::{DateTime, Utc};
use std::collections::BTreeMap;
use std::fmt::Write;

use crate::model::{Batch, MaterialLine, User, saturating_sum};
use crate::station::Station;

const EMPTY_SLOT: &str = "—";

pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%d.%m.%Y %H:%M").to_string()
}

fn sorted_by_color(lines: &[MaterialLine]) -> Vec<&MaterialLine> {
    let mut sorted: Vec<_> = lines.iter().collect();
    sorted.sort_by(|a, b| a.color.cmp(&b.color).then(a.id.cmp(&b.id)));
    sorted
}

fn header(out: &mut String, batch: &Batch) {
    let _ = writeln!(out, "Batch №{}", batch.number);
    if let Some(design) = batch.design.as_deref().filter(|d| !d.is_empty()) {
        let _ = writeln!(out, "Design: {design}");
    }
}

/// Cutter view: every line with its per-station progress and totals.
pub fn detailed(batch: &Batch, lines: &[MaterialLine]) -> String {
    let mut out = String::new();
    header(&mut out, batch);
    if lines.is_empty() {
        out.push_str("No colors added yet.");
        return out;
    }

    for (index, line) in sorted_by_color(lines).into_iter().enumerate() {
        let _ = writeln!(out, "\n{}. {}", index + 1, line.color);
        let _ = writeln!(out, "   Lines: {} | Pieces: {}", line.unit_count, line.piece_count);
        for station in Station::ALL {
            let slot = line.slot(station);
            match (slot.worker.as_deref(), slot.quantity) {
                (Some(worker), Some(quantity)) if !worker.is_empty() => {
                    let _ = writeln!(out, "   {}({}): {}", station.label(), worker, quantity);
                }
                _ => {
                    let _ = writeln!(out, "   {}: {}", station.label(), EMPTY_SLOT);
                }
            }
        }
    }

    let total_lines = saturating_sum(lines.iter().map(|l| l.unit_count));
    let total_pieces = saturating_sum(lines.iter().map(|l| l.piece_count));
    let completed = saturating_sum(lines.iter().map(MaterialLine::completed_total));
    let _ = writeln!(out, "\nTotal lines: {total_lines}");
    let _ = writeln!(out, "Total pieces: {total_pieces}");
    let _ = write!(out, "Completed operations: {completed}");
    out
}

/// Operator view: which colors the batch contains.
pub fn simplified(batch: &Batch, lines: &[MaterialLine]) -> String {
    let mut out = String::new();
    header(&mut out, batch);
    if lines.is_empty() {
        out.push_str("No colors added yet.");
        return out;
    }

    let mut colors: BTreeMap<&str, usize> = BTreeMap::new();
    for line in lines {
        *colors.entry(line.color.as_str()).or_default() += 1;
    }
    out.push_str("Colors:");
    for (color, count) in colors {
        if count > 1 {
            let _ = write!(out, "\n• {color} (×{count})");
        } else {
            let _ = write!(out, "\n• {color}");
        }
    }
    out
}

#[derive(Debug, Default, PartialEq, Eq)]
pub struct StationTally {
    pub total: i64,
    pub by_color: BTreeMap<String, i64>,
}

/// Worker name → station → quantities.
#[derive(Debug, Default, PartialEq, Eq)]
pub struct WorkerTally {
    pub workers: BTreeMap<String, BTreeMap<Station, StationTally>>,
}

impl WorkerTally {
    /// Add every recorded slot of `line`. `label` names the line in the
    /// per-color breakdown.
    pub fn add_line(&mut self, label: &str, line: &MaterialLine) {
        for (station, slot) in &line.slots {
            let (Some(worker), Some(quantity)) = (slot.worker.as_deref(), slot.quantity) else {
                continue;
            };
            if worker.trim().is_empty() {
                continue;
            }
            let tally = self
                .workers
                .entry(worker.to_string())
                .or_default()
                .entry(*station)
                .or_default();
            tally.total = tally.total.saturating_add(quantity);
            let by_color = tally.by_color.entry(label.to_string()).or_default();
            *by_color = by_color.saturating_add(quantity);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.workers.is_empty()
    }

    fn render(&self, out: &mut String) {
        for (worker, stations) in &self.workers {
            let _ = write!(out, "\n\n{worker}");
            for (station, tally) in stations {
                let _ = write!(out, "\n  {}: {}", station.label(), tally.total);
                for (color, quantity) in &tally.by_color {
                    let _ = write!(out, "\n    {color}: {quantity}");
                }
            }
        }
    }
}

/// Per-batch breakdown of who recorded what.
pub fn who_did_what(batch: &Batch, lines: &[MaterialLine]) -> String {
    let mut tally = WorkerTally::default();
    for line in lines {
        tally.add_line(&line.color, line);
    }
    if tally.is_empty() {
        return format!("No work recorded for batch №{} yet.", batch.number);
    }
    let mut out = format!("Who did what: batch №{}", batch.number);
    tally.render(&mut out);
    out
}

/// The same breakdown across every batch.
pub fn who_did_what_all(batches: &[(Batch, Vec<MaterialLine>)]) -> String {
    let mut tally = WorkerTally::default();
    for (batch, lines) in batches {
        for line in lines {
            tally.add_line(&format!("№{} {}", batch.number, line.color), line);
        }
    }
    if tally.is_empty() {
        return "No work recorded yet.".to_string();
    }
    let mut out = String::from("Who did what: all batches");
    tally.render(&mut out);
    out
}

pub fn user_list(users: &[User]) -> String {
    if users.is_empty() {
        return "No registered users.".to_string();
    }
    let mut out = String::from("Registered users:");
    for user in users {
        let equipment = user.equipment.as_deref().unwrap_or(EMPTY_SLOT);
        let _ = write!(out, "\n{} - {} | {}", user.name, user.role_display(), equipment);
    }
    out
}

pub fn batch_list(batches: &[(Batch, usize)]) -> String {
    if batches.is_empty() {
        return "No batches yet.".to_string();
    }
    let mut out = String::from("All batches:");
    for (batch, line_count) in batches {
        let _ = write!(out, "\n\n№{}", batch.number);
        if let Some(design) = batch.design.as_deref().filter(|d| !d.is_empty()) {
            let _ = write!(out, " ({design})");
        }
        let _ = write!(
            out,
            "\nCreated: {}\nColors: {}",
            format_timestamp(&batch.created_at),
            line_count
        );
    }
    out
}

pub fn profile(user: &User) -> String {
    let mut out = format!("Name: {}\nRole: {}", user.name, user.role_display());
    if let Some(equipment) = &user.equipment {
        let _ = write!(out, "\nMachine: {equipment}");
    }
    let _ = write!(out, "\nRegistered: {}", format_timestamp(&user.registered_at));
    out
}

/// Sum of everything `user` recorded across `lines`.
pub fn own_total(user: &User, lines: &[MaterialLine]) -> i64 {
    saturating_sum(
        lines
            .iter()
            .flat_map(|line| line.slots.values())
            .filter(|slot| slot.belongs_to(user))
            .filter_map(|slot| slot.quantity),
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::{ChatId, Slot};
    use chrono::TimeZone;
    use pretty_assertions::assert_eq;

    fn batch() -> Batch {
        Batch {
            id: 1,
            number: "100".into(),
            design: Some("Nike".into()),
            created_at: Utc.with_ymd_and_hms(2026, 3, 4, 9, 30, 0).unwrap(),
        }
    }

    fn line(id: i64, color: &str, units: i64, slots: &[(Station, &str, i64)]) -> MaterialLine {
        MaterialLine {
            id,
            batch_id: 1,
            color: color.into(),
            unit_count: units,
            piece_count: units * 5,
            slots: slots
                .iter()
                .map(|(station, worker, quantity)| {
                    (
                        *station,
                        Slot {
                            worker: Some(worker.to_string()),
                            worker_id: None,
                            quantity: Some(*quantity),
                        },
                    )
                })
                .collect(),
            created_at: Utc::now(),
        }
    }

    #[test]
    fn detailed_lists_every_station_and_totals() {
        let lines = vec![
            line(2, "Red", 3, &[(Station::FourNeedle, "Ann", 10)]),
            line(1, "Blue", 1, &[(Station::Packer, "Bob", 5), (Station::Collar, "Cy", 4)]),
        ];
        let expected = "Batch №100
Design: Nike

1. Blue
   Lines: 1 | Pieces: 5
   Four-needle: —
   Splitting: —
   Binding: —
   Topstitch: —
   Collar(Cy): 4
   Pressing: —
   Quality control: —
   Packing(Bob): 5

2. Red
   Lines: 3 | Pieces: 15
   Four-needle(Ann): 10
   Splitting: —
   Binding: —
   Topstitch: —
   Collar: —
   Pressing: —
   Quality control: —
   Packing: —

Total lines: 4
Total pieces: 20
Completed operations: 19";
        assert_eq!(detailed(&batch(), &lines), expected);
    }

    #[test]
    fn empty_batch_reports() {
        assert_eq!(
            detailed(&batch(), &[]),
            "Batch №100\nDesign: Nike\nNo colors added yet."
        );
        assert_eq!(
            who_did_what(&batch(), &[]),
            "No work recorded for batch №100 yet."
        );
    }

    #[test]
    fn simplified_collapses_repeated_colors() {
        let lines = vec![
            line(1, "Red", 1, &[]),
            line(2, "Blue", 1, &[]),
            line(3, "Red", 2, &[]),
        ];
        assert_eq!(
            simplified(&batch(), &lines),
            "Batch №100\nDesign: Nike\nColors:\n• Blue\n• Red (×2)"
        );
    }

    #[test]
    fn who_did_what_groups_by_worker_then_station() {
        let lines = vec![
            line(1, "Red", 3, &[(Station::FourNeedle, "Ann", 10), (Station::Packer, "Bob", 2)]),
            line(2, "Blue", 3, &[(Station::FourNeedle, "Ann", 7)]),
        ];
        let expected = "Who did what: batch №100

Ann
  Four-needle: 17
    Blue: 7
    Red: 10

Bob
  Packing: 2
    Red: 2";
        assert_eq!(who_did_what(&batch(), &lines), expected);
    }

    #[test]
    fn who_did_what_across_batches_labels_colors_with_batch() {
        let mut other = batch();
        other.id = 2;
        other.number = "200".into();
        let data = vec![
            (batch(), vec![line(1, "Red", 1, &[(Station::Collar, "Ann", 3)])]),
            (other, vec![line(2, "Red", 1, &[(Station::Collar, "Ann", 4)])]),
        ];
        let expected = "Who did what: all batches

Ann
  Collar: 7
    №100 Red: 3
    №200 Red: 4";
        assert_eq!(who_did_what_all(&data), expected);
        assert_eq!(who_did_what_all(&[]), "No work recorded yet.");
    }

    #[test]
    fn lists_and_profile() {
        let user = User {
            id: 1,
            chat_id: ChatId(5),
            name: "Ann".into(),
            role: "fourx".into(),
            equipment: Some("Machine-3".into()),
            registered_at: Utc.with_ymd_and_hms(2026, 1, 2, 8, 0, 0).unwrap(),
        };
        assert_eq!(
            user_list(std::slice::from_ref(&user)),
            "Registered users:\nAnn - Four-needle operator | Machine-3"
        );
        assert_eq!(
            profile(&user),
            "Name: Ann\nRole: Four-needle operator\nMachine: Machine-3\nRegistered: 02.01.2026 08:00"
        );
        assert_eq!(
            batch_list(&[(batch(), 2)]),
            "All batches:\n\n№100 (Nike)\nCreated: 04.03.2026 09:30\nColors: 2"
        );
    }

    #[test]
    fn oversized_quantities_do_not_break_reports() {
        let lines = vec![line(
            1,
            "Red",
            1,
            &[(Station::Splitter, "Ann", i64::MAX), (Station::Binder, "Ann", i64::MAX)],
        )];
        assert!(detailed(&batch(), &lines).ends_with(&format!("Completed operations: {}", i64::MAX)));
        let mut tally = WorkerTally::default();
        tally.add_line("Red", &lines[0]);
        tally.add_line("Red", &lines[0]);
        let splitting = &tally.workers["Ann"][&Station::Splitter];
        assert_eq!(splitting.total, i64::MAX);
        assert_eq!(splitting.by_color["Red"], i64::MAX);
    }

    #[test]
    fn own_total_counts_only_own_slots() {
        let user = User {
            id: 1,
            chat_id: ChatId(5),
            name: "Ann".into(),
            role: "FourNeedle".into(),
            equipment: None,
            registered_at: Utc::now(),
        };
        let lines = vec![
            line(1, "Red", 1, &[(Station::FourNeedle, "ann", 10), (Station::Packer, "Bob", 4)]),
            line(2, "Blue", 1, &[(Station::Collar, "Ann", 2)]),
        ];
        assert_eq!(own_total(&user, &lines), 12);
    }
}
