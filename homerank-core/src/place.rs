//! User-defined points of interest and their travel parameters.

use chrono::{DateTime, Datelike, Days, NaiveTime, Utc, Weekday};
use geo::Coord;

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

use crate::{PlaceId, UserId};

/// How the user travels to a point of interest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TravelMode {
    /// Car travel.
    #[default]
    Driving,
    /// Public transport; the only mode that reports fares.
    Transit,
    /// On foot.
    Walking,
    /// By bicycle.
    Bicycling,
}

impl TravelMode {
    /// Return the mode as the routing API expects it.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Driving => "driving",
            Self::Transit => "transit",
            Self::Walking => "walking",
            Self::Bicycling => "bicycling",
        }
    }
}

impl std::fmt::Display for TravelMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Whether the scheduled time is when the user leaves or arrives.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(
    feature = "serde",
    derive(Serialize, Deserialize),
    serde(rename_all = "snake_case")
)]
pub enum TimeKind {
    /// Leave at the scheduled time.
    #[default]
    Departure,
    /// Arrive by the scheduled time.
    Arrival,
}

/// Weekly schedule that parameterises routing queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct TravelSchedule {
    /// Day of the week.
    pub day: Weekday,
    /// Local time of day.
    pub time: NaiveTime,
    /// Departure or arrival semantics.
    #[cfg_attr(feature = "serde", serde(default))]
    pub kind: TimeKind,
}

impl Default for TravelSchedule {
    /// Saturday at noon, leaving at that time.
    fn default() -> Self {
        Self {
            day: Weekday::Sat,
            time: NaiveTime::from_hms_opt(12, 0, 0).unwrap_or(NaiveTime::MIN),
            kind: TimeKind::Departure,
        }
    }
}

impl TravelSchedule {
    /// Return the next occurrence of this weekday and time after `now`.
    ///
    /// A schedule for today's weekday resolves to the same day next week.
    ///
    /// # Examples
    /// ```
    /// use chrono::{NaiveTime, TimeZone, Utc, Weekday};
    /// use homerank_core::{TimeKind, TravelSchedule};
    ///
    /// let schedule = TravelSchedule {
    ///     day: Weekday::Fri,
    ///     time: NaiveTime::from_hms_opt(8, 30, 0).expect("valid time"),
    ///     kind: TimeKind::Arrival,
    /// };
    /// // 2024-01-03 is a Wednesday.
    /// let now = Utc.with_ymd_and_hms(2024, 1, 3, 12, 0, 0).unwrap();
    /// let next = schedule.next_occurrence(now);
    /// assert_eq!(next, Utc.with_ymd_and_hms(2024, 1, 5, 8, 30, 0).unwrap());
    /// ```
    #[must_use]
    pub fn next_occurrence(&self, now: DateTime<Utc>) -> DateTime<Utc> {
        let target = self.day.num_days_from_monday();
        let current = now.weekday().num_days_from_monday();
        let days_ahead = if target > current {
            target - current
        } else {
            target + 7 - current
        };
        let today = now.date_naive();
        let date = today
            .checked_add_days(Days::new(u64::from(days_ahead)))
            .unwrap_or(today);
        date.and_time(self.time).and_utc()
    }
}

/// A place the user cares about, such as work or the gym.
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PointOfInterest {
    /// Unique identifier.
    pub id: PlaceId,
    /// Owning user.
    pub owner: UserId,
    /// Display label, e.g. "Work".
    pub label: String,
    /// WGS84 position (`x = longitude`, `y = latitude`); `None` when
    /// geocoding failed or was skipped.
    #[cfg_attr(feature = "serde", serde(default))]
    pub location: Option<Coord<f64>>,
    /// Travel mode used for routing.
    #[cfg_attr(feature = "serde", serde(default))]
    pub travel_mode: TravelMode,
    /// When the trip happens.
    #[cfg_attr(feature = "serde", serde(default))]
    pub schedule: TravelSchedule,
}

impl PointOfInterest {
    /// Construct a geocoded place with default travel parameters.
    #[must_use]
    pub fn new(id: PlaceId, owner: UserId, label: impl Into<String>, location: Coord<f64>) -> Self {
        Self {
            id,
            owner,
            label: label.into(),
            location: Some(location),
            travel_mode: TravelMode::default(),
            schedule: TravelSchedule::default(),
        }
    }

    /// Set the travel mode while returning `self`.
    #[must_use]
    pub fn with_travel_mode(mut self, mode: TravelMode) -> Self {
        self.travel_mode = mode;
        self
    }

    /// Set the schedule while returning `self`.
    #[must_use]
    pub fn with_schedule(mut self, schedule: TravelSchedule) -> Self {
        self.schedule = schedule;
        self
    }

    /// Whether the place has usable coordinates.
    #[must_use]
    pub const fn is_geocoded(&self) -> bool {
        self.location.is_some()
    }

    /// Whether a change from `previous` requires distances to be recomputed.
    ///
    /// Moving the place or changing how or when the user travels there
    /// invalidates every cached pair for it.
    #[must_use]
    pub fn routing_changed(&self, previous: &Self) -> bool {
        self.location != previous.location
            || self.travel_mode != previous.travel_mode
            || self.schedule != previous.schedule
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;
    use rstest::rstest;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        // January 2024 starts on a Monday.
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0)
            .single()
            .expect("valid timestamp")
    }

    #[rstest]
    #[case(Weekday::Sat, at(1, 9), 6)]
    #[case(Weekday::Mon, at(1, 9), 8)]
    #[case(Weekday::Sun, at(7, 23), 14)]
    #[case(Weekday::Tue, at(3, 9), 9)]
    fn next_occurrence_is_strictly_in_a_later_day(
        #[case] day: Weekday,
        #[case] now: DateTime<Utc>,
        #[case] expected_day: u32,
    ) {
        let schedule = TravelSchedule {
            day,
            ..TravelSchedule::default()
        };
        assert_eq!(schedule.next_occurrence(now), at(expected_day, 12));
    }

    #[rstest]
    fn default_schedule_is_saturday_noon_departure() {
        let schedule = TravelSchedule::default();
        assert_eq!(schedule.day, Weekday::Sat);
        assert_eq!(schedule.time, NaiveTime::from_hms_opt(12, 0, 0).expect("noon"));
        assert_eq!(schedule.kind, TimeKind::Departure);
    }

    #[rstest]
    fn routing_changes_cover_mode_and_location() {
        let place = PointOfInterest::new(PlaceId(1), UserId(1), "Work", Coord { x: 0.0, y: 0.0 });
        let moved = PointOfInterest {
            location: Some(Coord { x: 1.0, y: 0.0 }),
            ..place.clone()
        };
        let transit = place.clone().with_travel_mode(TravelMode::Transit);
        let renamed = PointOfInterest {
            label: "Office".to_owned(),
            ..place.clone()
        };
        assert!(moved.routing_changed(&place));
        assert!(transit.routing_changed(&place));
        assert!(!renamed.routing_changed(&place));
    }
}
