//! Calendar v3 client for rehearsal and gig events.

use band_hub_types::{CalendarEvent, CalendarEventList, CalendarList, CalendarListEntry, EventTime};
use time::format_description::well_known::Rfc3339;
use time::macros::format_description;
use time::{Date, OffsetDateTime, UtcOffset};

use crate::config::GoogleEndpoints;
use crate::error::RemoteError;
use crate::http::{AccessToken, build_agent, check_response, read_json};

const MAX_RESULTS: u32 = 100;

pub struct CalendarClient {
    base_url: String,
    token: AccessToken,
    agent: ureq::Agent,
}

impl CalendarClient {
    pub fn new(token: AccessToken, endpoints: &GoogleEndpoints) -> Self {
        Self {
            base_url: endpoints.calendar.clone(),
            token,
            agent: build_agent(endpoints.timeout),
        }
    }

    /// Events overlapping `[start, end)`, recurring events expanded, ordered by start.
    pub fn list_events(
        &self,
        calendar_id: &str,
        start: OffsetDateTime,
        end: OffsetDateTime,
    ) -> Result<Vec<CalendarEvent>, RemoteError> {
        let url = events_url(&self.base_url, calendar_id, start, end)?;
        let resp = check_response(
            "list events",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        let list: CalendarEventList = read_json("list events", resp)?;
        tracing::info!(calendar_id, count = list.items.len(), "listed calendar events");
        Ok(list.items)
    }

    pub fn list_calendars(&self) -> Result<Vec<CalendarListEntry>, RemoteError> {
        let url = format!("{}/users/me/calendarList", self.base_url);
        let resp = check_response(
            "list calendars",
            self.agent
                .get(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        let list: CalendarList = read_json("list calendars", resp)?;
        Ok(list.items)
    }

    pub fn create_event(
        &self,
        calendar_id: &str,
        event: &CalendarEvent,
    ) -> Result<CalendarEvent, RemoteError> {
        let url = format!("{}/events", calendar_url(&self.base_url, calendar_id));
        let resp = check_response(
            "create event",
            self.agent
                .post(&url)
                .header("Authorization", &self.token.bearer())
                .send_json(event),
        )?;
        let created: CalendarEvent = read_json("create event", resp)?;
        tracing::info!(calendar_id, event_id = %created.id, "created calendar event");
        Ok(created)
    }

    /// Patch an event; unset fields in `changes` are left untouched.
    pub fn update_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        changes: &CalendarEvent,
    ) -> Result<CalendarEvent, RemoteError> {
        let url = event_url(&self.base_url, calendar_id, event_id);
        let resp = check_response(
            "update event",
            self.agent
                .patch(&url)
                .header("Authorization", &self.token.bearer())
                .send_json(changes),
        )?;
        read_json("update event", resp)
    }

    pub fn delete_event(&self, calendar_id: &str, event_id: &str) -> Result<(), RemoteError> {
        let url = event_url(&self.base_url, calendar_id, event_id);
        check_response(
            "delete event",
            self.agent
                .delete(&url)
                .header("Authorization", &self.token.bearer())
                .call(),
        )?;
        tracing::info!(calendar_id, event_id, "deleted calendar event");
        Ok(())
    }
}

/// When an event happens.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Schedule {
    /// Whole-day event; `end` is exclusive as Calendar reports it.
    AllDay { start: Date, end: Option<Date> },
    Timed {
        start: OffsetDateTime,
        end: Option<OffsetDateTime>,
    },
}

impl Schedule {
    pub fn start_date(&self) -> Date {
        match self {
            Schedule::AllDay { start, .. } => *start,
            Schedule::Timed { start, .. } => start.date(),
        }
    }
}

pub trait EventScheduleExt {
    /// Classify the event's start/end; `None` when the start cannot be parsed.
    fn schedule(&self) -> Option<Schedule>;

    fn kind(&self) -> EventKind;
}

impl EventScheduleExt for CalendarEvent {
    fn schedule(&self) -> Option<Schedule> {
        if let Some(start) = self.start.date_time.as_deref() {
            let start = OffsetDateTime::parse(start, &Rfc3339).ok()?;
            let end = self
                .end
                .date_time
                .as_deref()
                .and_then(|end| OffsetDateTime::parse(end, &Rfc3339).ok());
            return Some(Schedule::Timed { start, end });
        }
        let start = parse_date(self.start.date.as_deref()?)?;
        let end = self.end.date.as_deref().and_then(parse_date);
        Some(Schedule::AllDay { start, end })
    }

    fn kind(&self) -> EventKind {
        EventKind::from_title(self.summary.as_deref().unwrap_or_default())
    }
}

/// Rehearsal/gig classification by title keyword.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EventKind {
    Rehearsal,
    Gig,
    Other,
}

const REHEARSAL_WORDS: [&str; 3] = ["ensayo", "rehearsal", "practice"];
const GIG_WORDS: [&str; 4] = ["concierto", "gig", "show", "actuación"];

impl EventKind {
    /// Rehearsal keywords win over gig keywords.
    pub fn from_title(title: &str) -> Self {
        let title = title.to_lowercase();
        if REHEARSAL_WORDS.iter().any(|word| title.contains(word)) {
            EventKind::Rehearsal
        } else if GIG_WORDS.iter().any(|word| title.contains(word)) {
            EventKind::Gig
        } else {
            EventKind::Other
        }
    }
}

/// Timed event body for `create_event`.
pub fn timed_event(summary: &str, start: OffsetDateTime, end: OffsetDateTime) -> CalendarEvent {
    let at = |t: OffsetDateTime| EventTime {
        date_time: t.format(&Rfc3339).ok(),
        ..EventTime::default()
    };
    CalendarEvent {
        summary: Some(summary.to_string()),
        start: at(start),
        end: at(end),
        ..CalendarEvent::default()
    }
}

fn parse_date(raw: &str) -> Option<Date> {
    Date::parse(raw, format_description!("[year]-[month]-[day]")).ok()
}

fn calendar_url(base_url: &str, calendar_id: &str) -> String {
    format!("{}/calendars/{}", base_url, urlencoding::encode(calendar_id))
}

fn event_url(base_url: &str, calendar_id: &str, event_id: &str) -> String {
    format!(
        "{}/events/{}",
        calendar_url(base_url, calendar_id),
        urlencoding::encode(event_id)
    )
}

fn events_url(
    base_url: &str,
    calendar_id: &str,
    start: OffsetDateTime,
    end: OffsetDateTime,
) -> Result<String, RemoteError> {
    let bound = |at: OffsetDateTime| {
        at.to_offset(UtcOffset::UTC)
            .format(&Rfc3339)
            .map_err(|err| RemoteError::InvalidRequest {
                operation: "list events",
                message: err.to_string(),
            })
    };
    Ok(format!(
        "{}/events?timeMin={}&timeMax={}&singleEvents=true&orderBy=startTime&maxResults={MAX_RESULTS}",
        calendar_url(base_url, calendar_id),
        urlencoding::encode(&bound(start)?),
        urlencoding::encode(&bound(end)?)
    ))
}
