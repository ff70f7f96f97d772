//! Weekly opening periods and "is it open at this time" checks.

use chrono::{Datelike, NaiveDateTime, NaiveTime, Timelike, Weekday};
use serde::{Deserialize, Serialize};

const MINUTES_PER_DAY: u32 = 24 * 60;
const MINUTES_PER_WEEK: u32 = 7 * MINUTES_PER_DAY;

/// A point in the week: day plus local wall-clock time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeekTime {
    pub day: Weekday,
    pub time: NaiveTime,
}

impl WeekTime {
    pub fn new(day: Weekday, time: NaiveTime) -> Self {
        Self { day, time }
    }

    /// Minutes since Sunday 00:00.
    fn minute_of_week(&self) -> u32 {
        self.day.num_days_from_sunday() * MINUTES_PER_DAY
            + self.time.hour() * 60
            + self.time.minute()
    }
}

/// One opening interval. A period without `close` never closes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningPeriod {
    pub open: WeekTime,
    pub close: Option<WeekTime>,
}

impl OpeningPeriod {
    fn contains(&self, minute: u32) -> bool {
        let Some(close) = self.close else {
            return true;
        };
        let open = self.open.minute_of_week();
        let close = close.minute_of_week();
        match open.cmp(&close) {
            std::cmp::Ordering::Less => (open..close).contains(&minute),
            // Wraps past Saturday night into the next week.
            std::cmp::Ordering::Greater => minute >= open || minute < close,
            // Open and close at the same instant: a full week.
            std::cmp::Ordering::Equal => true,
        }
    }
}

/// Weekly opening hours of a place.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct OpeningHours {
    pub periods: Vec<OpeningPeriod>,
}

impl OpeningHours {
    pub fn new(periods: Vec<OpeningPeriod>) -> Self {
        Self { periods }
    }

    /// Open around the clock.
    pub fn always_open() -> Self {
        Self::new(vec![OpeningPeriod {
            open: WeekTime::new(Weekday::Sun, NaiveTime::MIN),
            close: None,
        }])
    }

    /// The same `open..close` window every day. `close` before `open` means
    /// the window runs past midnight.
    pub fn daily(open: NaiveTime, close: NaiveTime) -> Self {
        let days = [
            Weekday::Sun,
            Weekday::Mon,
            Weekday::Tue,
            Weekday::Wed,
            Weekday::Thu,
            Weekday::Fri,
            Weekday::Sat,
        ];
        let periods = days
            .iter()
            .map(|&day| {
                let close_day = if close <= open { day.succ() } else { day };
                OpeningPeriod {
                    open: WeekTime::new(day, open),
                    close: Some(WeekTime::new(close_day, close)),
                }
            })
            .collect();
        Self::new(periods)
    }

    /// Whether the place is open at local time `at`. No periods means closed.
    pub fn is_open_at(&self, at: NaiveDateTime) -> bool {
        let minute = WeekTime::new(at.weekday(), at.time()).minute_of_week() % MINUTES_PER_WEEK;
        self.periods.iter().any(|p| p.contains(minute))
    }
}
