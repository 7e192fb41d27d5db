//! Worker roles and role-string normalization.
//!
//! Roles are persisted as plain strings. Older deployments stored localized
//! labels and transliterated keys, so every read goes through
//! [`normalize_role`] before it is compared against anything.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::station::Station;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Role {
    Cutter,
    FourNeedle,
    Splitter,
    Binder,
    Topstitcher,
    Collar,
    Presser,
    QualityControl,
    Packer,
}

/// Known spellings for each role, compared after lowercasing.
const SYNONYMS: &[(Role, &[&str])] = &[
    (Role::Cutter, &["cutter", "cutting", "zakroi", "закрой", "закройщик"]),
    (
        Role::FourNeedle,
        &["fourneedle", "four_needle", "four-needle", "4x", "fourx", "4-х"],
    ),
    (Role::Splitter, &["splitter", "splitting", "raspash", "распаш"]),
    (Role::Binder, &["binder", "binding", "beika", "бейка"]),
    (
        Role::Topstitcher,
        &["topstitcher", "topstitch", "strochka", "строчка"],
    ),
    (Role::Collar, &["collar", "gorlo", "горло"]),
    (Role::Presser, &["presser", "pressing", "ytyg", "утюг"]),
    (
        Role::QualityControl,
        &["qualitycontrol", "quality_control", "qc", "otk", "отк"],
    ),
    (
        Role::Packer,
        &["packer", "packing", "upakovka", "ypakovka", "упаковка"],
    ),
];

impl Role {
    pub const ALL: [Role; 9] = [
        Role::Cutter,
        Role::FourNeedle,
        Role::Splitter,
        Role::Binder,
        Role::Topstitcher,
        Role::Collar,
        Role::Presser,
        Role::QualityControl,
        Role::Packer,
    ];

    /// Canonical label, the form written to storage.
    pub fn label(self) -> &'static str {
        match self {
            Role::Cutter => "Cutter",
            Role::FourNeedle => "FourNeedle",
            Role::Splitter => "Splitter",
            Role::Binder => "Binder",
            Role::Topstitcher => "Topstitcher",
            Role::Collar => "Collar",
            Role::Presser => "Presser",
            Role::QualityControl => "QualityControl",
            Role::Packer => "Packer",
        }
    }

    /// Human readable name for menus and lists.
    pub fn display_name(self) -> &'static str {
        match self {
            Role::Cutter => "Cutter",
            Role::FourNeedle => "Four-needle operator",
            Role::Splitter => "Splitter",
            Role::Binder => "Binder",
            Role::Topstitcher => "Topstitcher",
            Role::Collar => "Collar operator",
            Role::Presser => "Presser",
            Role::QualityControl => "Quality control",
            Role::Packer => "Packer",
        }
    }

    /// Key used in `role_<key>` selection payloads.
    pub fn key(self) -> &'static str {
        match self {
            Role::Cutter => "cutter",
            other => other.station().map(Station::key).unwrap_or("cutter"),
        }
    }

    pub fn from_key(key: &str) -> Option<Role> {
        Role::ALL.into_iter().find(|role| role.key() == key)
    }

    /// Resolve any known spelling, case-insensitively.
    pub fn parse(raw: &str) -> Option<Role> {
        let needle = raw.trim().to_lowercase();
        if needle.is_empty() {
            return None;
        }
        Role::ALL
            .into_iter()
            .find(|role| role.label().to_lowercase() == needle)
            .or_else(|| {
                SYNONYMS
                    .iter()
                    .find(|(_, spellings)| spellings.contains(&needle.as_str()))
                    .map(|(role, _)| *role)
            })
    }

    /// The station this role records into. The cutter has none.
    pub fn station(self) -> Option<Station> {
        match self {
            Role::Cutter => None,
            Role::FourNeedle => Some(Station::FourNeedle),
            Role::Splitter => Some(Station::Splitter),
            Role::Binder => Some(Station::Binder),
            Role::Topstitcher => Some(Station::Topstitch),
            Role::Collar => Some(Station::Collar),
            Role::Presser => Some(Station::Presser),
            Role::QualityControl => Some(Station::QualityControl),
            Role::Packer => Some(Station::Packer),
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Map a stored role string onto its canonical label.
///
/// Unknown strings are returned unchanged rather than rejected, so a
/// misspelled role survives as-is and simply matches no workflow.
pub fn normalize_role(raw: &str) -> String {
    match Role::parse(raw) {
        Some(role) => role.label().to_string(),
        None => raw.to_string(),
    }
}

/// Authorization check for every privileged action.
pub fn is_cutter(raw: &str) -> bool {
    normalize_role(raw) == Role::Cutter.label()
}
