//! In-memory appointment store.
//!
//! Ids come from auto-incrementing counters. Ids handed out to a unit of work
//! that is later dropped are not reused.

use async_trait::async_trait;
use std::collections::BTreeMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use tracing::debug;

use super::{AppointmentStore, AppointmentUnitOfWork};
use crate::models::{Appointment, Attendee, NewAppointment};
use crate::{Error, Result};

#[derive(Debug, Default)]
struct Tables {
    last_appointment_id: i64,
    last_attendee_id: i64,
    appointments: BTreeMap<i64, Appointment>,
}

/// Store backed by process memory, shared by cloning.
#[derive(Debug, Clone, Default)]
pub struct InMemoryAppointmentStore {
    tables: Arc<RwLock<Tables>>,
}

impl InMemoryAppointmentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fetch a committed appointment.
    pub async fn get(&self, id: i64) -> Option<Appointment> {
        self.tables.read().await.appointments.get(&id).cloned()
    }

    /// Number of committed appointments.
    pub async fn len(&self) -> usize {
        self.tables.read().await.appointments.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.len().await == 0
    }
}

#[async_trait]
impl AppointmentStore for InMemoryAppointmentStore {
    async fn begin(&self) -> Result<Box<dyn AppointmentUnitOfWork>> {
        Ok(Box::new(InMemoryUnitOfWork {
            tables: Arc::clone(&self.tables),
            staged: Vec::new(),
        }))
    }
}

struct InMemoryUnitOfWork {
    tables: Arc<RwLock<Tables>>,
    staged: Vec<Appointment>,
}

#[async_trait]
impl AppointmentUnitOfWork for InMemoryUnitOfWork {
    async fn insert_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment> {
        let missing = appointment.missing_required_fields();
        if !missing.is_empty() {
            return Err(Error::Storage(format!(
                "Required fields are empty: {}",
                missing.join(", ")
            )));
        }

        let mut tables = self.tables.write().await;
        tables.last_appointment_id += 1;
        let id = tables.last_appointment_id;

        let attendees = appointment
            .attendees
            .into_iter()
            .map(|a| {
                tables.last_attendee_id += 1;
                Attendee {
                    id: tables.last_attendee_id,
                    name: a.name,
                    email: a.email,
                    has_confirmed: a.has_confirmed,
                }
            })
            .collect();

        let stored = Appointment {
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
        };

        self.staged.push(stored.clone());
        Ok(stored)
    }

    async fn commit(self: Box<Self>) -> Result<()> {
        let mut tables = self.tables.write().await;
        for appointment in self.staged {
            debug!("Committing appointment {}", appointment.id);
            tables.appointments.insert(appointment.id, appointment);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, NewAttendee};
    use chrono::Utc;

    fn new_appointment(title: &str) -> NewAppointment {
        let now = Utc::now();
        NewAppointment {
            title: title.to_string(),
            description: String::new(),
            start_date_time: now,
            end_date_time: now,
            organizer: "alice@example.com".to_string(),
            attendees: vec![
                NewAttendee {
                    name: "Bob".to_string(),
                    email: "bob@example.com".to_string(),
                    has_confirmed: false,
                },
                NewAttendee {
                    name: "Carol".to_string(),
                    email: "carol@example.com".to_string(),
                    has_confirmed: false,
                },
            ],
            status: AppointmentStatus::Scheduled,
            created_at: now,
            updated_at: now,
        }
    }

    #[tokio::test]
    async fn test_insert_and_commit() {
        let store = InMemoryAppointmentStore::new();
        let mut uow = store.begin().await.unwrap();
        let stored = uow.insert_appointment(new_appointment("Standup")).await.unwrap();
        assert_eq!(stored.id, 1);
        assert_eq!(stored.attendees[0].id, 1);
        assert_eq!(stored.attendees[1].id, 2);

        // Not visible before commit.
        assert!(store.get(stored.id).await.is_none());

        uow.commit().await.unwrap();
        let fetched = store.get(stored.id).await.unwrap();
        assert_eq!(fetched, stored);
        assert_eq!(fetched.attendees[1].name, "Carol");
    }

    #[tokio::test]
    async fn test_dropped_unit_of_work_is_discarded() {
        let store = InMemoryAppointmentStore::new();
        {
            let mut uow = store.begin().await.unwrap();
            uow.insert_appointment(new_appointment("Abandoned")).await.unwrap();
        }
        assert!(store.is_empty().await);

        let mut uow = store.begin().await.unwrap();
        let stored = uow.insert_appointment(new_appointment("Kept")).await.unwrap();
        uow.commit().await.unwrap();
        assert_eq!(stored.id, 2);
        assert_eq!(store.len().await, 1);
    }

    #[tokio::test]
    async fn test_rejects_empty_required_fields() {
        let store = InMemoryAppointmentStore::new();
        let mut uow = store.begin().await.unwrap();

        let mut record = new_appointment("");
        record.attendees[1].email.clear();

        let err = uow.insert_appointment(record).await.unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("title"));
        assert!(err.to_string().contains("attendees[1].email"));
    }

    #[tokio::test]
    async fn test_concurrent_inserts_get_distinct_ids() {
        let store = InMemoryAppointmentStore::new();
        let mut handles = Vec::new();
        for i in 0..32 {
            let store = store.clone();
            handles.push(tokio::spawn(async move {
                let mut uow = store.begin().await.unwrap();
                let stored = uow
                    .insert_appointment(new_appointment(&format!("Meeting {}", i)))
                    .await
                    .unwrap();
                uow.commit().await.unwrap();
                stored.id
            }));
        }

        let mut ids = Vec::new();
        for handle in handles {
            ids.push(handle.await.unwrap());
        }
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 32);
        assert_eq!(store.len().await, 32);
    }
}
