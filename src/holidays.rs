use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use crate::calendar::BusinessCalendar;
use crate::period::DateRange;

/// A public holiday as supplied by an external holiday data source.
/// `subdivision` is `None` for national holidays.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayEntry {
    pub date: NaiveDate,
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub subdivision: Option<String>,
}

/// Pre-resolved holiday list. Nothing here is fetched; the table is read from
/// a file prepared by whoever owns the holiday data.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct HolidayTable {
    #[serde(default)]
    pub entries: Vec<HolidayEntry>,
}

impl HolidayTable {
    pub fn new(entries: Vec<HolidayEntry>) -> Self {
        Self { entries }
    }

    fn applies(entry: &HolidayEntry, jurisdiction: &Jurisdiction) -> bool {
        match (&entry.subdivision, jurisdiction) {
            (None, _) => true,
            (Some(_), Jurisdiction::National) => false,
            (Some(code), Jurisdiction::State(state)) => code.eq_ignore_ascii_case(state.code()),
        }
    }

    /// Holidays inside `range` for `jurisdiction`, sorted by date.
    pub fn holidays_in(&self, range: DateRange, jurisdiction: &Jurisdiction) -> Vec<&HolidayEntry> {
        let mut selected: Vec<&HolidayEntry> = self
            .entries
            .iter()
            .filter(|entry| range.contains(entry.date))
            .filter(|entry| Self::applies(entry, jurisdiction))
            .collect();
        selected.sort_by_key(|entry| entry.date);
        selected
    }

    pub fn excluded_dates(&self, range: DateRange, jurisdiction: &Jurisdiction) -> BTreeSet<NaiveDate> {
        self.holidays_in(range, jurisdiction)
            .into_iter()
            .map(|entry| entry.date)
            .collect()
    }

    /// A copy of `calendar` with this table's holidays inside `range` excluded.
    /// Dates outside the range keep whatever status `calendar` gives them.
    pub fn apply(
        &self,
        calendar: &BusinessCalendar,
        range: DateRange,
        jurisdiction: &Jurisdiction,
    ) -> BusinessCalendar {
        let mut calendar = calendar.clone();
        calendar.exclude_all(self.excluded_dates(range, jurisdiction));
        calendar
    }
}

/// Malaysian states and federal territories.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum MalaysianState {
    Johor,
    Kedah,
    Kelantan,
    Melaka,
    NegeriSembilan,
    Pahang,
    PulauPinang,
    Perak,
    Perlis,
    Sabah,
    #[default]
    Selangor,
    Sarawak,
    Terengganu,
    KualaLumpur,
    Labuan,
    Putrajaya,
}

impl MalaysianState {
    pub const ALL: [MalaysianState; 16] = [
        MalaysianState::Johor,
        MalaysianState::Kedah,
        MalaysianState::Kelantan,
        MalaysianState::Melaka,
        MalaysianState::NegeriSembilan,
        MalaysianState::Pahang,
        MalaysianState::PulauPinang,
        MalaysianState::Perak,
        MalaysianState::Perlis,
        MalaysianState::Sabah,
        MalaysianState::Selangor,
        MalaysianState::Sarawak,
        MalaysianState::Terengganu,
        MalaysianState::KualaLumpur,
        MalaysianState::Labuan,
        MalaysianState::Putrajaya,
    ];

    pub fn code(&self) -> &'static str {
        match self {
            MalaysianState::Johor => "JHR",
            MalaysianState::Kedah => "KDH",
            MalaysianState::Kelantan => "KTN",
            MalaysianState::Melaka => "MLK",
            MalaysianState::NegeriSembilan => "NSN",
            MalaysianState::Pahang => "PHG",
            MalaysianState::PulauPinang => "PNG",
            MalaysianState::Perak => "PRK",
            MalaysianState::Perlis => "PLS",
            MalaysianState::Sabah => "SBH",
            MalaysianState::Selangor => "SGR",
            MalaysianState::Sarawak => "SWK",
            MalaysianState::Terengganu => "TRG",
            MalaysianState::KualaLumpur => "KUL",
            MalaysianState::Labuan => "LBN",
            MalaysianState::Putrajaya => "PJY",
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MalaysianState::Johor => "Johor",
            MalaysianState::Kedah => "Kedah",
            MalaysianState::Kelantan => "Kelantan",
            MalaysianState::Melaka => "Melaka",
            MalaysianState::NegeriSembilan => "Negeri Sembilan",
            MalaysianState::Pahang => "Pahang",
            MalaysianState::PulauPinang => "Pulau Pinang",
            MalaysianState::Perak => "Perak",
            MalaysianState::Perlis => "Perlis",
            MalaysianState::Sabah => "Sabah",
            MalaysianState::Selangor => "Selangor",
            MalaysianState::Sarawak => "Sarawak",
            MalaysianState::Terengganu => "Terengganu",
            MalaysianState::KualaLumpur => "W.P. Kuala Lumpur",
            MalaysianState::Labuan => "W.P. Labuan",
            MalaysianState::Putrajaya => "W.P. Putrajaya",
        }
    }
}

/// Which holiday entries apply: federal only, or federal plus one state's.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Jurisdiction {
    National,
    State(MalaysianState),
}

impl Jurisdiction {
    pub fn code(&self) -> Option<&'static str> {
        match self {
            Jurisdiction::National => None,
            Jurisdiction::State(state) => Some(state.code()),
        }
    }
}

impl Default for Jurisdiction {
    fn default() -> Self {
        Jurisdiction::State(MalaysianState::default())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UnknownJurisdiction(pub String);

impl fmt::Display for UnknownJurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "unknown jurisdiction '{}'", self.0)
    }
}

impl std::error::Error for UnknownJurisdiction {}

impl FromStr for Jurisdiction {
    type Err = UnknownJurisdiction;

    /// Accepts `national`, a state code (`SGR`) or a state name (`Selangor`).
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if trimmed.eq_ignore_ascii_case("national") {
            return Ok(Jurisdiction::National);
        }
        MalaysianState::ALL
            .into_iter()
            .find(|state| {
                state.code().eq_ignore_ascii_case(trimmed) || state.name().eq_ignore_ascii_case(trimmed)
            })
            .map(Jurisdiction::State)
            .ok_or_else(|| UnknownJurisdiction(s.to_string()))
    }
}

impl fmt::Display for Jurisdiction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Jurisdiction::National => write!(f, "National (Federal Only)"),
            Jurisdiction::State(state) => write!(f, "{}", state.name()),
        }
    }
}

impl Serialize for Jurisdiction {
    fn serialize<S: serde::Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_str(self.code().unwrap_or("national"))
    }
}

impl<'de> Deserialize<'de> for Jurisdiction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let raw = String::deserialize(deserializer)?;
        raw.parse().map_err(serde::de::Error::custom)
    }
}
