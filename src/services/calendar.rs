use std::sync::Arc;

use anyhow::Context;
use async_trait::async_trait;
use chrono::{DateTime, Duration, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{BookingResult, Intent, LeadData, TenantContext};
use crate::services::email::EmailNotifier;

const SLOT_MINUTES: i64 = 30;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct EventTime {
    #[serde(rename = "dateTime")]
    pub date_time: String,
    #[serde(rename = "timeZone")]
    pub time_zone: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attendee {
    pub email: String,
}

/// Event payload for create/patch calls. Cancel is a patch whose body only
/// carries `status: cancelled`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct EventBody {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub summary: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start: Option<EventTime>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub end: Option<EventTime>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attendees: Vec<Attendee>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    #[serde(default)]
    pub status: Option<String>,
}

#[async_trait]
pub trait CalendarApi: Send + Sync {
    async fn create_event(&self, calendar_id: &str, body: &EventBody)
        -> anyhow::Result<CalendarEvent>;
    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        body: &EventBody,
    ) -> anyhow::Result<CalendarEvent>;
}

/// Google Calendar REST client.
pub struct GoogleCalendarClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl GoogleCalendarClient {
    pub fn new(base_url: String, token: String) -> Self {
        Self {
            base_url,
            token,
            client: reqwest::Client::new(),
        }
    }
}

#[async_trait]
impl CalendarApi for GoogleCalendarClient {
    async fn create_event(
        &self,
        calendar_id: &str,
        body: &EventBody,
    ) -> anyhow::Result<CalendarEvent> {
        let url = format!("{}/calendars/{}/events", self.base_url, calendar_id);
        let resp = self
            .client
            .post(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .context("failed to call calendar API")?
            .error_for_status()
            .context("calendar API returned error")?;
        Ok(resp.json().await.context("failed to parse calendar event")?)
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        body: &EventBody,
    ) -> anyhow::Result<CalendarEvent> {
        let url = format!(
            "{}/calendars/{}/events/{}",
            self.base_url, calendar_id, event_id
        );
        let resp = self
            .client
            .patch(url)
            .bearer_auth(&self.token)
            .json(body)
            .send()
            .await
            .context("failed to call calendar API")?
            .error_for_status()
            .context("calendar API returned error")?;
        Ok(resp.json().await.context("failed to parse calendar event")?)
    }
}

/// Dev-mode calendar: fabricates event ids and logs the operation.
pub struct LogCalendar;

#[async_trait]
impl CalendarApi for LogCalendar {
    async fn create_event(
        &self,
        calendar_id: &str,
        body: &EventBody,
    ) -> anyhow::Result<CalendarEvent> {
        let id = format!("evt_{}", uuid::Uuid::new_v4());
        tracing::info!(calendar_id, event_id = %id, summary = ?body.summary, "calendar event (log only)");
        Ok(CalendarEvent {
            id,
            status: Some("confirmed".to_string()),
        })
    }

    async fn patch_event(
        &self,
        calendar_id: &str,
        event_id: &str,
        body: &EventBody,
    ) -> anyhow::Result<CalendarEvent> {
        tracing::info!(calendar_id, event_id, status = ?body.status, "calendar patch (log only)");
        Ok(CalendarEvent {
            id: event_id.to_string(),
            status: body.status.clone(),
        })
    }
}

/// Booking lifecycle: create, reschedule, cancel, plus the confirmation
/// email.
pub struct CalendarService {
    api: Arc<dyn CalendarApi>,
    mailer: Arc<dyn EmailNotifier>,
    timezone: String,
}

impl CalendarService {
    pub fn new(api: Arc<dyn CalendarApi>, mailer: Arc<dyn EmailNotifier>, timezone: String) -> Self {
        Self {
            api,
            mailer,
            timezone,
        }
    }

    pub async fn handle_booking(
        &self,
        context: &TenantContext,
        user_query: &str,
        lead_data: &LeadData,
        appointment_id: Option<&str>,
        intent: Intent,
    ) -> anyhow::Result<BookingResult> {
        let calendar_id = calendar_for(context);
        let (start, end) = resolve_window(Utc::now(), user_query);
        let event_body = EventBody {
            summary: Some(summary_for(lead_data)),
            description: Some(user_query.to_string()),
            start: Some(self.event_time(start)),
            end: Some(self.event_time(end)),
            attendees: attendees_for(lead_data, &calendar_id),
            status: None,
        };

        if intent == Intent::CancelBooking {
            let Some(event_id) = appointment_id else {
                return Ok(BookingResult {
                    appointment_id: None,
                    message: "I couldn't find an appointment to cancel.".to_string(),
                    audit_note: None,
                });
            };
            let cancelled = self
                .api
                .patch_event(
                    &calendar_id,
                    event_id,
                    &EventBody {
                        status: Some("cancelled".to_string()),
                        ..EventBody::default()
                    },
                )
                .await?;
            self.send_confirmation(lead_data, "Appointment cancelled", &event_body)
                .await?;
            return Ok(BookingResult {
                appointment_id: Some(cancelled.id.clone()),
                message: "Your appointment has been cancelled. Check your email for confirmation."
                    .to_string(),
                audit_note: Some(format!("calendar_event_cancelled:{}", cancelled.id)),
            });
        }

        if let Some(event_id) = appointment_id {
            let updated = self
                .api
                .patch_event(
                    &calendar_id,
                    event_id,
                    &EventBody {
                        status: Some("confirmed".to_string()),
                        ..event_body.clone()
                    },
                )
                .await?;
            self.send_confirmation(lead_data, "Appointment rescheduled", &event_body)
                .await?;
            return Ok(BookingResult {
                appointment_id: Some(updated.id.clone()),
                message:
                    "All set - your appointment has been rescheduled. Check your email for the details."
                        .to_string(),
                audit_note: Some(format!("calendar_event_rescheduled:{}", updated.id)),
            });
        }

        let created = self.api.create_event(&calendar_id, &event_body).await?;
        self.send_confirmation(lead_data, "Appointment booked", &event_body)
            .await?;
        Ok(BookingResult {
            appointment_id: Some(created.id.clone()),
            message: "Your consultation is booked! I sent a confirmation email with the calendar invite."
                .to_string(),
            audit_note: Some(format!("calendar_event_created:{}", created.id)),
        })
    }

    fn event_time(&self, at: DateTime<Utc>) -> EventTime {
        EventTime {
            date_time: at.to_rfc3339_opts(SecondsFormat::Secs, true),
            time_zone: self.timezone.clone(),
        }
    }

    async fn send_confirmation(
        &self,
        lead_data: &LeadData,
        subject: &str,
        event_body: &EventBody,
    ) -> anyhow::Result<()> {
        let Some(email) = lead_data.email.as_deref() else {
            return Ok(());
        };
        let name = lead_data.name.as_deref().unwrap_or("there");
        let summary = event_body.summary.as_deref().unwrap_or("Consultation");
        let when = event_body
            .start
            .as_ref()
            .map(|t| format!("{} ({})", t.date_time, t.time_zone))
            .unwrap_or_default();
        let body = format!(
            "Hi {name},\n\n{subject} for {summary} on {when}.\nReply to this email if you need any changes.\n"
        );
        self.mailer.send(email, subject, &body).await
    }
}

fn calendar_for(context: &TenantContext) -> String {
    if let Some(id) = context.calendar_id.as_deref() {
        if !id.trim().is_empty() {
            return id.to_string();
        }
    }
    format!("{}__{}@example.com", context.org_id, context.branch_id)
}

fn summary_for(lead_data: &LeadData) -> String {
    let items = if lead_data.product_interest.is_empty() {
        "Consultation".to_string()
    } else {
        lead_data.product_interest.join(", ")
    };
    match lead_data.name.as_deref() {
        Some(name) => format!("{items} with {name}"),
        None => items,
    }
}

fn attendees_for(lead_data: &LeadData, calendar_id: &str) -> Vec<Attendee> {
    // Service-account calendars usually cannot invite attendees.
    if calendar_id.ends_with("gserviceaccount.com") {
        return Vec::new();
    }
    lead_data
        .email
        .as_deref()
        .map(|email| {
            vec![Attendee {
                email: email.to_string(),
            }]
        })
        .unwrap_or_default()
}

/// Keyword time-window resolution: "tomorrow" and "next week" shift the day,
/// everything else defaults to the next day; slots start 15:00 UTC.
fn resolve_window(now: DateTime<Utc>, user_query: &str) -> (DateTime<Utc>, DateTime<Utc>) {
    let lower = user_query.to_lowercase();
    let base = if lower.contains("next week") {
        now + Duration::days(7)
    } else {
        now + Duration::days(1)
    };
    let start = base
        .date_naive()
        .and_hms_opt(15, 0, 0)
        .unwrap_or(base.naive_utc())
        .and_utc();
    (start, start + Duration::minutes(SLOT_MINUTES))
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use super::*;

    #[derive(Debug)]
    enum Op {
        Create(String, EventBody),
        Patch(String, String, EventBody),
    }

    #[derive(Default)]
    struct FakeCalendarApi {
        ops: Mutex<Vec<Op>>,
    }

    #[async_trait]
    impl CalendarApi for FakeCalendarApi {
        async fn create_event(
            &self,
            calendar_id: &str,
            body: &EventBody,
        ) -> anyhow::Result<CalendarEvent> {
            self.ops
                .lock()
                .unwrap()
                .push(Op::Create(calendar_id.to_string(), body.clone()));
            Ok(CalendarEvent {
                id: "appt-001".to_string(),
                status: Some("confirmed".to_string()),
            })
        }

        async fn patch_event(
            &self,
            calendar_id: &str,
            event_id: &str,
            body: &EventBody,
        ) -> anyhow::Result<CalendarEvent> {
            self.ops.lock().unwrap().push(Op::Patch(
                calendar_id.to_string(),
                event_id.to_string(),
                body.clone(),
            ));
            Ok(CalendarEvent {
                id: event_id.to_string(),
                status: body.status.clone(),
            })
        }
    }

    #[derive(Default)]
    struct MemoryMailer {
        sent: Mutex<Vec<(String, String)>>,
    }

    #[async_trait]
    impl EmailNotifier for MemoryMailer {
        async fn send(&self, recipient: &str, subject: &str, _body: &str) -> anyhow::Result<()> {
            self.sent
                .lock()
                .unwrap()
                .push((recipient.to_string(), subject.to_string()));
            Ok(())
        }
    }

    fn service() -> (CalendarService, Arc<FakeCalendarApi>, Arc<MemoryMailer>) {
        let api = Arc::new(FakeCalendarApi::default());
        let mailer = Arc::new(MemoryMailer::default());
        let service = CalendarService::new(api.clone(), mailer.clone(), "UTC".to_string());
        (service, api, mailer)
    }

    fn complete_lead() -> LeadData {
        LeadData {
            name: Some("Skyler".to_string()),
            email: Some("skyler@example.com".to_string()),
            product_interest: vec!["solar".to_string()],
            ..LeadData::default()
        }
    }

    #[tokio::test]
    async fn test_cancel_without_appointment_is_a_noop() {
        let (service, api, mailer) = service();
        let result = service
            .handle_booking(
                &TenantContext::new("org", "branch", "s1"),
                "cancel it",
                &complete_lead(),
                None,
                Intent::CancelBooking,
            )
            .await
            .unwrap();

        assert!(result.appointment_id.is_none());
        assert!(result.audit_note.is_none());
        assert!(result.message.contains("couldn't find an appointment"));
        assert!(api.ops.lock().unwrap().is_empty());
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_cancel_patches_status_and_notifies() {
        let (service, api, mailer) = service();
        let result = service
            .handle_booking(
                &TenantContext::new("org", "branch", "s1"),
                "please cancel",
                &complete_lead(),
                Some("appt-9"),
                Intent::CancelBooking,
            )
            .await
            .unwrap();

        assert_eq!(result.appointment_id.as_deref(), Some("appt-9"));
        assert_eq!(
            result.audit_note.as_deref(),
            Some("calendar_event_cancelled:appt-9")
        );
        let ops = api.ops.lock().unwrap();
        match &ops[0] {
            Op::Patch(_, event_id, body) => {
                assert_eq!(event_id, "appt-9");
                assert_eq!(body.status.as_deref(), Some("cancelled"));
                assert!(body.summary.is_none());
            }
            other => panic!("expected patch, got {other:?}"),
        }
        assert_eq!(mailer.sent.lock().unwrap()[0].1, "Appointment cancelled");
    }

    #[tokio::test]
    async fn test_fresh_booking_creates_event() {
        let (service, api, mailer) = service();
        let result = service
            .handle_booking(
                &TenantContext::new("org", "branch", "s1"),
                "book me tomorrow afternoon",
                &complete_lead(),
                None,
                Intent::Booking,
            )
            .await
            .unwrap();

        assert_eq!(result.appointment_id.as_deref(), Some("appt-001"));
        assert_eq!(
            result.audit_note.as_deref(),
            Some("calendar_event_created:appt-001")
        );
        assert!(result.message.contains("booked"));

        let ops = api.ops.lock().unwrap();
        match &ops[0] {
            Op::Create(calendar_id, body) => {
                assert_eq!(calendar_id, "org__branch@example.com");
                assert_eq!(body.summary.as_deref(), Some("solar with Skyler"));
                assert_eq!(body.attendees[0].email, "skyler@example.com");
            }
            other => panic!("expected create, got {other:?}"),
        }
        assert_eq!(mailer.sent.lock().unwrap()[0].1, "Appointment booked");
    }

    #[tokio::test]
    async fn test_existing_appointment_is_rescheduled() {
        let (service, api, _) = service();
        let result = service
            .handle_booking(
                &TenantContext::new("org", "branch", "s1"),
                "move it to next week",
                &complete_lead(),
                Some("appt-5"),
                Intent::Booking,
            )
            .await
            .unwrap();

        assert_eq!(
            result.audit_note.as_deref(),
            Some("calendar_event_rescheduled:appt-5")
        );
        let ops = api.ops.lock().unwrap();
        match &ops[0] {
            Op::Patch(_, event_id, body) => {
                assert_eq!(event_id, "appt-5");
                assert_eq!(body.status.as_deref(), Some("confirmed"));
                assert!(body.summary.is_some());
            }
            other => panic!("expected patch, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_no_email_means_no_confirmation() {
        let (service, _, mailer) = service();
        let lead = LeadData {
            name: Some("Skyler".to_string()),
            product_interest: vec!["solar".to_string()],
            ..LeadData::default()
        };
        service
            .handle_booking(
                &TenantContext::new("org", "branch", "s1"),
                "book me",
                &lead,
                None,
                Intent::Booking,
            )
            .await
            .unwrap();
        assert!(mailer.sent.lock().unwrap().is_empty());
    }

    #[test]
    fn test_explicit_calendar_id_wins() {
        let mut context = TenantContext::new("org", "branch", "s1");
        context.calendar_id = Some("team@company.com".to_string());
        assert_eq!(calendar_for(&context), "team@company.com");
    }

    #[test]
    fn test_service_account_calendar_gets_no_attendees() {
        let lead = complete_lead();
        assert!(attendees_for(&lead, "robot@project.iam.gserviceaccount.com").is_empty());
        assert_eq!(attendees_for(&lead, "org__branch@example.com").len(), 1);
    }

    #[test]
    fn test_resolve_window_keywords() {
        let now = DateTime::parse_from_rfc3339("2026-03-02T09:30:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let (start, end) = resolve_window(now, "book me tomorrow");
        assert_eq!(start.to_rfc3339_opts(SecondsFormat::Secs, true), "2026-03-03T15:00:00Z");
        assert_eq!(end - start, Duration::minutes(30));

        let (start, _) = resolve_window(now, "sometime next week please");
        assert_eq!(start.to_rfc3339_opts(SecondsFormat::Secs, true), "2026-03-09T15:00:00Z");

        // No keyword defaults to the next day.
        let (start, _) = resolve_window(now, "set something up");
        assert_eq!(start.to_rfc3339_opts(SecondsFormat::Secs, true), "2026-03-03T15:00:00Z");
    }
}
