//! Shared data models.

use chrono::{DateTime, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::fmt;
use std::str::FromStr;
use validator::Validate;

use crate::Error;

/// Lifecycle state of an appointment. Only `Scheduled` is ever assigned today.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AppointmentStatus {
    #[default]
    Scheduled,
    InProgress,
    Completed,
    Cancelled,
}

impl AppointmentStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            AppointmentStatus::Scheduled => "scheduled",
            AppointmentStatus::InProgress => "in_progress",
            AppointmentStatus::Completed => "completed",
            AppointmentStatus::Cancelled => "cancelled",
        }
    }
}

impl fmt::Display for AppointmentStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for AppointmentStatus {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "scheduled" => Ok(AppointmentStatus::Scheduled),
            "in_progress" => Ok(AppointmentStatus::InProgress),
            "completed" => Ok(AppointmentStatus::Completed),
            "cancelled" => Ok(AppointmentStatus::Cancelled),
            other => Err(Error::Storage(format!("Unknown appointment status: {}", other))),
        }
    }
}

/// A persisted appointment together with the attendees it owns.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub title: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub organizer: String,
    pub attendees: Vec<Attendee>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A participant owned by exactly one appointment.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Attendee {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub has_confirmed: bool,
}

/// Appointment record before the store has assigned ids.
#[derive(Debug, Clone, PartialEq)]
pub struct NewAppointment {
    pub title: String,
    pub description: String,
    pub start_date_time: DateTime<Utc>,
    pub end_date_time: DateTime<Utc>,
    pub organizer: String,
    pub attendees: Vec<NewAttendee>,
    pub status: AppointmentStatus,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct NewAttendee {
    pub name: String,
    pub email: String,
    pub has_confirmed: bool,
}

impl NewAppointment {
    /// Build a scheduled appointment from a creation request, stamped with `now`.
    pub fn from_request(request: CreateAppointmentRequest, now: DateTime<Utc>) -> Self {
        Self {
            title: request.title,
            description: request.description,
            start_date_time: request.start_date_time,
            end_date_time: request.end_date_time,
            organizer: request.organizer,
            attendees: request
                .attendees
                .into_iter()
                .map(|a| NewAttendee {
                    name: a.name,
                    email: a.email,
                    has_confirmed: false,
                })
                .collect(),
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    /// Names of required fields that are empty. Stores use this to refuse
    /// records that bypassed request validation.
    pub fn missing_required_fields(&self) -> Vec<String> {
        let mut missing = Vec::new();
        if self.title.is_empty() {
            missing.push("title".to_string());
        }
        if self.organizer.is_empty() {
            missing.push("organizer".to_string());
        }
        for (i, attendee) in self.attendees.iter().enumerate() {
            if attendee.name.is_empty() {
                missing.push(format!("attendees[{}].name", i));
            }
            if attendee.email.is_empty() {
                missing.push(format!("attendees[{}].email", i));
            }
        }
        missing
    }
}

/// Create appointment request payload.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    #[validate(length(min = 1, message = "Title is required"))]
    pub title: String,
    #[serde(default, deserialize_with = "null_as_empty")]
    pub description: String,
    #[serde(deserialize_with = "lenient_utc")]
    pub start_date_time: DateTime<Utc>,
    #[serde(deserialize_with = "lenient_utc")]
    pub end_date_time: DateTime<Utc>,
    #[validate(length(min = 1, message = "Organizer is required"))]
    pub organizer: String,
    #[serde(default)]
    #[validate(nested)]
    pub attendees: Vec<AttendeeRequest>,
}

/// Naive timestamp layouts accepted after RFC 3339, read as UTC.
const NAIVE_UTC_FORMATS: [&str; 3] = ["%Y-%m-%dT%H:%MZ", "%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M"];

/// Parse a request timestamp. Offset-less values are taken as UTC.
pub fn parse_utc_timestamp(value: &str) -> Option<DateTime<Utc>> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(value) {
        return Some(dt.with_timezone(&Utc));
    }
    NAIVE_UTC_FORMATS
        .iter()
        .find_map(|format| NaiveDateTime::parse_from_str(value, format).ok())
        .map(|naive| naive.and_utc())
}

fn lenient_utc<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = String::deserialize(deserializer)?;
    parse_utc_timestamp(&value)
        .ok_or_else(|| serde::de::Error::custom(format!("invalid timestamp: {}", value)))
}

fn null_as_empty<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(Option::<String>::deserialize(deserializer)?.unwrap_or_default())
}

/// Attendee entry inside a create request.
#[derive(Debug, Clone, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct AttendeeRequest {
    #[validate(length(min = 1, message = "Attendee name is required"))]
    pub name: String,
    #[validate(email(message = "Attendee email must be a valid email address"))]
    pub email: String,
}

/// Create appointment response payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentResponse {
    pub id: i64,
    pub title: String,
    pub created_at: DateTime<Utc>,
}

impl From<&Appointment> for CreateAppointmentResponse {
    fn from(appointment: &Appointment) -> Self {
        Self {
            id: appointment.id,
            title: appointment.title.clone(),
            created_at: appointment.created_at,
        }
    }
}

/// Emitted when an appointment is created. Not published yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCreatedEvent {
    pub appointment_id: i64,
    pub title: String,
    pub start_date_time: DateTime<Utc>,
    pub attendees: Vec<Attendee>,
    pub created_at: DateTime<Utc>,
}

impl From<&Appointment> for AppointmentCreatedEvent {
    fn from(appointment: &Appointment) -> Self {
        Self {
            appointment_id: appointment.id,
            title: appointment.title.clone(),
            start_date_time: appointment.start_date_time,
            attendees: appointment.attendees.clone(),
            created_at: appointment.created_at,
        }
    }
}

/// Emitted when an appointment is cancelled. Not published yet.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AppointmentCancelledEvent {
    pub appointment_id: i64,
    pub reason: String,
    pub cancelled_at: DateTime<Utc>,
}
