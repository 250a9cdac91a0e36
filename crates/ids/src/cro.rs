use crate::{IdError, IdResult};
use chrono::{Local, NaiveDate};
use std::sync::Mutex;
use std::{fmt, str::FromStr};

const CRO_PREFIX: &str = "CRO-";

/// Visit reference number printed on the registration receipt.
///
/// Format: `CRO-YYYYMMDD-NNNN`, for example `CRO-20261016-0007`. The counter is at least four
/// digits wide and grows if a day ever exceeds 9999 registrations.
///
/// Ordering is by date, then counter, which matches issue order when numbers come from
/// [`CroNumber::generate`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CroNumber {
    date: NaiveDate,
    sequence: u32,
}

impl CroNumber {
    pub fn date(&self) -> NaiveDate {
        self.date
    }

    pub fn sequence(&self) -> u32 {
        self.sequence
    }

    /// Issues the number that follows `last` on `today`.
    ///
    /// The first registration of a day gets `0001`. If `last` is dated today or later (a clock
    /// that stepped backwards), its day is kept and the counter incremented, so issued numbers
    /// are strictly increasing.
    pub fn generate(last: Option<&CroNumber>, today: NaiveDate) -> Self {
        match last {
            Some(prev) if today <= prev.date => Self {
                date: prev.date,
                sequence: prev.sequence.saturating_add(1),
            },
            _ => Self {
                date: today,
                sequence: 1,
            },
        }
    }
}

impl fmt::Display for CroNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{CRO_PREFIX}{}-{:04}",
            self.date.format("%Y%m%d"),
            self.sequence
        )
    }
}

impl FromStr for CroNumber {
    type Err = IdError;

    fn from_str(s: &str) -> IdResult<Self> {
        let invalid = || IdError::InvalidInput(format!("invalid CRO number: '{s}'"));

        let rest = s.strip_prefix(CRO_PREFIX).ok_or_else(invalid)?;
        let (date_str, seq_str) = rest.split_once('-').ok_or_else(invalid)?;
        if date_str.len() != 8 || seq_str.len() < 4 || !seq_str.bytes().all(|b| b.is_ascii_digit())
        {
            return Err(invalid());
        }

        let date = NaiveDate::parse_from_str(date_str, "%Y%m%d").map_err(|_| invalid())?;
        let sequence: u32 = seq_str.parse().map_err(|_| invalid())?;
        if sequence == 0 {
            return Err(invalid());
        }

        Ok(Self { date, sequence })
    }
}

#[cfg(feature = "serde")]
impl serde::Serialize for CroNumber {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        serializer.collect_str(self)
    }
}

#[cfg(feature = "serde")]
impl<'de> serde::Deserialize<'de> for CroNumber {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        s.parse().map_err(serde::de::Error::custom)
    }
}

/// Process-wide issuer of CRO numbers.
///
/// Holds the last number handed out; seed it with the highest number already persisted so a
/// restart continues the day's count.
#[derive(Debug, Default)]
pub struct CroSequence {
    last: Mutex<Option<CroNumber>>,
}

impl CroSequence {
    pub fn new(last: Option<CroNumber>) -> Self {
        Self {
            last: Mutex::new(last),
        }
    }

    /// Issues the next number for the local calendar date.
    pub fn next(&self) -> CroNumber {
        self.next_on(Local::now().date_naive())
    }

    pub fn next_on(&self, today: NaiveDate) -> CroNumber {
        // A poisoned lock still holds a valid last number.
        let mut last = self
            .last
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let next = CroNumber::generate(last.as_ref(), today);
        *last = Some(next);
        next
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).expect("valid date")
    }

    #[test]
    fn test_first_number_of_day_is_one() {
        let cro = CroNumber::generate(None, day(2026, 10, 16));
        assert_eq!(cro.to_string(), "CRO-20261016-0001");
    }

    #[test]
    fn test_generate_increments_within_day() {
        let first = CroNumber::generate(None, day(2026, 10, 16));
        let second = CroNumber::generate(Some(&first), day(2026, 10, 16));
        assert_eq!(second.to_string(), "CRO-20261016-0002");
        assert!(second > first);
    }

    #[test]
    fn test_generate_restarts_on_new_day() {
        let prev: CroNumber = "CRO-20261015-0042".parse().expect("valid cro");
        let next = CroNumber::generate(Some(&prev), day(2026, 10, 16));
        assert_eq!(next.to_string(), "CRO-20261016-0001");
    }

    #[test]
    fn test_generate_stays_monotonic_when_clock_goes_back() {
        let prev: CroNumber = "CRO-20261016-0009".parse().expect("valid cro");
        let next = CroNumber::generate(Some(&prev), day(2026, 10, 15));
        assert_eq!(next.to_string(), "CRO-20261016-0010");
    }

    #[test]
    fn test_parse_rejects_malformed() {
        for input in [
            "",
            "CRO-20261016",
            "XRO-20261016-0001",
            "CRO-2026101-0001",
            "CRO-20261399-0001",
            "CRO-20261016-01",
            "CRO-20261016-0000",
            "CRO-20261016-00a1",
        ] {
            assert!(input.parse::<CroNumber>().is_err(), "accepted {input:?}");
        }
    }

    #[test]
    fn test_wide_sequence_round_trips() {
        let cro: CroNumber = "CRO-20261016-12345".parse().expect("five digit counter");
        assert_eq!(cro.sequence(), 12345);
        assert_eq!(cro.to_string(), "CRO-20261016-12345");
    }

    #[test]
    fn test_sequence_continues_from_seed() {
        let seed: CroNumber = "CRO-20261016-0003".parse().expect("valid cro");
        let seq = CroSequence::new(Some(seed));
        assert_eq!(seq.next_on(day(2026, 10, 16)).to_string(), "CRO-20261016-0004");
        assert_eq!(seq.next_on(day(2026, 10, 16)).to_string(), "CRO-20261016-0005");
        assert_eq!(seq.next_on(day(2026, 10, 17)).to_string(), "CRO-20261017-0001");
    }
}
