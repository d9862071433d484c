use crate::utils::jst;
use chrono::{DateTime, FixedOffset, TimeZone, Utc};

const MILLIS_PER_DAY: i64 = 24 * 60 * 60 * 1000;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EventDay {
    pub name: String,
    pub date: DateTime<FixedOffset>,
}

/// The program's milestone calendar.
///
/// The event list must be sorted by date ascending; `next_event` scans it in
/// order and returns the first hit.
#[derive(Clone, Debug)]
pub struct Schedule {
    events: Vec<EventDay>,
}

impl Schedule {
    pub fn new(events: Vec<EventDay>) -> Schedule {
        Schedule { events }
    }

    /// The first event strictly after `now`, or `None` once the program is
    /// over.
    pub fn next_event(&self, now: DateTime<Utc>) -> Option<&EventDay> {
        self.events.iter().find(|event| now < event.date)
    }

    /// A countdown toward the next event, counting partial days as whole
    /// ones. `None` once the program is over.
    pub fn countdown_message(&self, now: DateTime<Utc>) -> Option<String> {
        let event = self.next_event(now)?;
        let remaining_millis = event.date.signed_duration_since(now).num_milliseconds();
        // Ceil division toward +infinity, matching i64::div_ceil (unstable on
        // this toolchain). MILLIS_PER_DAY is a positive constant, so this is
        // exactly equivalent.
        let (days, rem) = (
            remaining_millis / MILLIS_PER_DAY,
            remaining_millis % MILLIS_PER_DAY,
        );
        let remaining_days = if rem > 0 { days + 1 } else { days };
        Some(format!("{}まであと{}日", event.name, remaining_days))
    }
}

/// The 2022 program calendar, all dates at midnight JST.
pub fn program_events() -> Schedule {
    let event = |name: &str, (y, m, d): (i32, u32, u32)| EventDay {
        name: name.to_string(),
        date: jst().with_ymd_and_hms(y, m, d, 0, 0, 0).unwrap(),
    };
    Schedule::new(vec![
        event("第1回イベント", (2022, 6, 11)),
        event("第2回イベント", (2022, 7, 9)),
        event("第3回イベント", (2022, 8, 24)),
        event("第4回イベント", (2022, 10, 1)),
        event("第5回イベント", (2022, 11, 11)),
        event("第6回イベント", (2023, 1, 27)),
        event("成果発表会", (2023, 3, 4)),
        event("2022年度終了", (2023, 4, 1)),
    ])
}
