//! The eight processing stations a color line passes through after cutting.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::role::Role;

/// A processing station. Each station owns one progress slot on every
/// material line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Station {
    FourNeedle,
    Splitter,
    Binder,
    Topstitch,
    Collar,
    Presser,
    QualityControl,
    Packer,
}

impl Station {
    /// Stations in production order.
    pub const ALL: [Station; 8] = [
        Station::FourNeedle,
        Station::Splitter,
        Station::Binder,
        Station::Topstitch,
        Station::Collar,
        Station::Presser,
        Station::QualityControl,
        Station::Packer,
    ];

    /// Stable key used in button payloads and as the slot name in storage.
    pub fn key(self) -> &'static str {
        match self {
            Station::FourNeedle => "four_needle",
            Station::Splitter => "splitter",
            Station::Binder => "binder",
            Station::Topstitch => "topstitch",
            Station::Collar => "collar",
            Station::Presser => "presser",
            Station::QualityControl => "quality_control",
            Station::Packer => "packer",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Station::FourNeedle => "Four-needle",
            Station::Splitter => "Splitting",
            Station::Binder => "Binding",
            Station::Topstitch => "Topstitch",
            Station::Collar => "Collar",
            Station::Presser => "Pressing",
            Station::QualityControl => "Quality control",
            Station::Packer => "Packing",
        }
    }

    pub fn from_key(key: &str) -> Option<Station> {
        Station::ALL.into_iter().find(|station| station.key() == key)
    }

    /// The role that records into this station's slot.
    pub fn role(self) -> Role {
        match self {
            Station::FourNeedle => Role::FourNeedle,
            Station::Splitter => Role::Splitter,
            Station::Binder => Role::Binder,
            Station::Topstitch => Role::Topstitcher,
            Station::Collar => Role::Collar,
            Station::Presser => Role::Presser,
            Station::QualityControl => Role::QualityControl,
            Station::Packer => Role::Packer,
        }
    }

    /// Whether workers at this station must have an equipment label on file
    /// before recording.
    pub fn requires_equipment(self) -> bool {
        matches!(self, Station::FourNeedle)
    }
}

impl fmt::Display for Station {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keys_round_trip_and_are_unique() {
        for station in Station::ALL {
            assert_eq!(Station::from_key(station.key()), Some(station));
        }
        let mut keys: Vec<_> = Station::ALL.iter().map(|s| s.key()).collect();
        keys.sort_unstable();
        keys.dedup();
        assert_eq!(keys.len(), 8);
    }

    #[test]
    fn every_station_maps_back_through_its_role() {
        for station in Station::ALL {
            assert_eq!(station.role().station(), Some(station));
        }
    }

    #[test]
    fn only_four_needle_requires_equipment() {
        let needing: Vec<_> = Station::ALL
            .into_iter()
            .filter(|s| s.requires_equipment())
            .collect();
        assert_eq!(needing, vec![Station::FourNeedle]);
    }
}
