//! PostgreSQL appointment store.
//!
//! Tables are created by the migrations under `shared/migrations`. Required
//! fields are enforced by CHECK constraints; attendees cascade on delete of
//! their appointment and keep request order through `position`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{PgPool, Postgres, Transaction};
use tracing::debug;

use super::{AppointmentStore, AppointmentUnitOfWork};
use crate::models::{Appointment, Attendee, NewAppointment};
use crate::Result;

#[derive(Debug, sqlx::FromRow)]
struct AppointmentRow {
    id: i64,
    title: String,
    description: String,
    start_date_time: DateTime<Utc>,
    end_date_time: DateTime<Utc>,
    organizer: String,
    status: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, sqlx::FromRow)]
struct AttendeeRow {
    id: i64,
    name: String,
    email: String,
    has_confirmed: bool,
}

impl From<AttendeeRow> for Attendee {
    fn from(row: AttendeeRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            email: row.email,
            has_confirmed: row.has_confirmed,
        }
    }
}

/// Store backed by a PostgreSQL connection pool.
#[derive(Debug, Clone)]
pub struct PgAppointmentStore {
    pool: PgPool,
}

impl PgAppointmentStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// Fetch a committed appointment with its attendees in insertion order.
    pub async fn get(&self, id: i64) -> Result<Option<Appointment>> {
        let row: Option<AppointmentRow> = sqlx::query_as(
            r#"
            SELECT id, title, description, start_date_time, end_date_time,
                   organizer, status, created_at, updated_at
            FROM appointments
            WHERE id = $1
            "#,
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        let Some(row) = row else {
            return Ok(None);
        };

        let attendees: Vec<AttendeeRow> = sqlx::query_as(
            r#"
            SELECT id, name, email, has_confirmed
            FROM attendees
            WHERE appointment_id = $1
            ORDER BY position ASC
            "#,
        )
        .bind(id)
        .fetch_all(&self.pool)
        .await?;

        Ok(Some(Appointment {
            id: row.id,
            title: row.title,
            description: row.description,
            start_date_time: row.start_date_time,
            end_date_time: row.end_date_time,
            organizer: row.organizer,
            attendees: attendees.into_iter().map(Attendee::from).collect(),
            status: row.status.parse()?,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }))
    }
}

#[async_trait]
impl AppointmentStore for PgAppointmentStore {
    async fn begin(&self) -> Result<Box<dyn AppointmentUnitOfWork>> {
        let tx = self.pool.begin().await?;
        Ok(Box::new(PgUnitOfWork { tx }))
    }
}

struct PgUnitOfWork {
    tx: Transaction<'static, Postgres>,
}

#[async_trait]
impl AppointmentUnitOfWork for PgUnitOfWork {
    async fn insert_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment> {
        let id: i64 = sqlx::query_scalar(
            r#"
            INSERT INTO appointments (
                title, description, start_date_time, end_date_time,
                organizer, status, created_at, updated_at
            ) VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING id
            "#,
        )
        .bind(&appointment.title)
        .bind(&appointment.description)
        .bind(appointment.start_date_time)
        .bind(appointment.end_date_time)
        .bind(&appointment.organizer)
        .bind(appointment.status.as_str())
        .bind(appointment.created_at)
        .bind(appointment.updated_at)
        .fetch_one(&mut *self.tx)
        .await?;

        let mut attendees = Vec::with_capacity(appointment.attendees.len());
        for (position, attendee) in appointment.attendees.into_iter().enumerate() {
            let attendee_id: i64 = sqlx::query_scalar(
                r#"
                INSERT INTO attendees (appointment_id, position, name, email, has_confirmed)
                VALUES ($1, $2, $3, $4, $5)
                RETURNING id
                "#,
            )
            .bind(id)
            .bind(position as i32)
            .bind(&attendee.name)
            .bind(&attendee.email)
            .bind(attendee.has_confirmed)
            .fetch_one(&mut *self.tx)
            .await?;

            attendees.push(Attendee {
                id: attendee_id,
                name: attendee.name,
                email: attendee.email,
                has_confirmed: attendee.has_confirmed,
            });
        }

        debug!("Staged appointment {} with {} attendees", id, attendees.len());

        Ok(Appointment {
            id,
            title: appointment.title,
            description: appointment.description,
            start_date_time: appointment.start_date_time,
            end_date_time: appointment.end_date_time,
            organizer: appointment.organizer,
            attendees,
            status: appointment.status,
            created_at: appointment.created_at,
            updated_at: appointment.updated_at,
        })
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        self.tx.commit().await?;
        Ok(())
    }
}
