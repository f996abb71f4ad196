//! Appointment creation.

use chrono::Utc;
use std::sync::Arc;
use tracing::{info, warn};
use validator::Validate;

use crate::models::{CreateAppointmentRequest, CreateAppointmentResponse, NewAppointment};
use crate::store::AppointmentStore;
use crate::Result;

/// Turns a creation request into a persisted appointment.
#[derive(Clone)]
pub struct CreateAppointmentHandler {
    store: Arc<dyn AppointmentStore>,
}

impl CreateAppointmentHandler {
    pub fn new(store: Arc<dyn AppointmentStore>) -> Self {
        Self { store }
    }

    /// Validate the request, then insert the appointment and its attendees
    /// in a single unit of work.
    ///
    /// Validation failures are returned before the store is touched. Storage
    /// failures propagate unchanged; nothing is committed in that case.
    pub async fn handle(&self, request: CreateAppointmentRequest) -> Result<CreateAppointmentResponse> {
        request.validate()?;

        // Not rejected: end-before-start has no agreed semantics yet.
        if request.end_date_time < request.start_date_time {
            warn!(
                "Appointment '{}' ends before it starts ({} < {})",
                request.title, request.end_date_time, request.start_date_time
            );
        }

        let record = NewAppointment::from_request(request, Utc::now());

        let mut uow = self.store.begin().await?;
        let appointment = uow.insert_appointment(record).await?;
        uow.commit().await?;

        info!(
            "Created appointment {} with {} attendees",
            appointment.id,
            appointment.attendees.len()
        );

        Ok(CreateAppointmentResponse::from(&appointment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{AppointmentStatus, AttendeeRequest};
    use crate::store::{AppointmentUnitOfWork, InMemoryAppointmentStore};
    use crate::Error;
    use async_trait::async_trait;
    use chrono::{TimeZone, Utc};

    fn standup() -> CreateAppointmentRequest {
        CreateAppointmentRequest {
            title: "Standup".to_string(),
            description: String::new(),
            start_date_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 0, 0).unwrap(),
            end_date_time: Utc.with_ymd_and_hms(2024, 1, 1, 9, 15, 0).unwrap(),
            organizer: "alice@example.com".to_string(),
            attendees: vec![AttendeeRequest {
                name: "Bob".to_string(),
                email: "bob@example.com".to_string(),
            }],
        }
    }

    fn handler() -> (CreateAppointmentHandler, InMemoryAppointmentStore) {
        let store = InMemoryAppointmentStore::new();
        (CreateAppointmentHandler::new(Arc::new(store.clone())), store)
    }

    #[tokio::test]
    async fn test_creates_scheduled_appointment() {
        let (handler, store) = handler();
        let request = standup();

        let before = Utc::now();
        let response = handler.handle(request.clone()).await.unwrap();
        let after = Utc::now();

        assert!(response.id > 0);
        assert_eq!(response.title, "Standup");
        assert!(response.created_at >= before && response.created_at <= after);

        let stored = store.get(response.id).await.unwrap();
        assert_eq!(stored.title, request.title);
        assert_eq!(stored.description, request.description);
        assert_eq!(stored.start_date_time, request.start_date_time);
        assert_eq!(stored.end_date_time, request.end_date_time);
        assert_eq!(stored.organizer, request.organizer);
        assert_eq!(stored.status, AppointmentStatus::Scheduled);
        assert_eq!(stored.created_at, response.created_at);
        assert_eq!(stored.updated_at, stored.created_at);

        assert_eq!(stored.attendees.len(), 1);
        assert_eq!(stored.attendees[0].name, "Bob");
        assert_eq!(stored.attendees[0].email, "bob@example.com");
        assert!(!stored.attendees[0].has_confirmed);
    }

    #[tokio::test]
    async fn test_preserves_attendee_order() {
        let (handler, store) = handler();
        let mut request = standup();
        request.attendees = ["Zoe", "Adam", "Mia", "Bob"]
            .iter()
            .map(|name| AttendeeRequest {
                name: name.to_string(),
                email: format!("{}@example.com", name.to_lowercase()),
            })
            .collect();

        let response = handler.handle(request).await.unwrap();
        let stored = store.get(response.id).await.unwrap();
        let names: Vec<&str> = stored.attendees.iter().map(|a| a.name.as_str()).collect();
        assert_eq!(names, vec!["Zoe", "Adam", "Mia", "Bob"]);
    }

    #[tokio::test]
    async fn test_issues_fresh_ids() {
        let (handler, _store) = handler();
        let first = handler.handle(standup()).await.unwrap();
        let second = handler.handle(standup()).await.unwrap();
        assert_ne!(first.id, second.id);
    }

    #[tokio::test]
    async fn test_rejects_empty_required_fields() {
        let (handler, store) = handler();

        let mut empty_title = standup();
        empty_title.title.clear();
        let mut empty_organizer = standup();
        empty_organizer.organizer.clear();
        let mut empty_name = standup();
        empty_name.attendees[0].name.clear();
        let mut empty_email = standup();
        empty_email.attendees[0].email.clear();
        let mut bad_email = standup();
        bad_email.attendees[0].email = "bob-at-example".to_string();

        for request in [empty_title, empty_organizer, empty_name, empty_email, bad_email] {
            let err = handler.handle(request).await.unwrap_err();
            assert!(matches!(err, Error::Validation(_)), "unexpected error: {}", err);
            assert_eq!(err.status_code(), 400);
        }
        assert!(store.is_empty().await);
    }

    #[tokio::test]
    async fn test_accepts_end_before_start() {
        let (handler, store) = handler();
        let mut request = standup();
        std::mem::swap(&mut request.start_date_time, &mut request.end_date_time);

        let response = handler.handle(request).await.unwrap();
        assert!(store.get(response.id).await.is_some());
    }

    /// Store whose unit of work fails either on insert or on commit.
    struct FailingStore {
        fail_on_commit: bool,
    }

    struct FailingUnitOfWork {
        fail_on_commit: bool,
    }

    #[async_trait]
    impl AppointmentStore for FailingStore {
        async fn begin(&self) -> Result<Box<dyn AppointmentUnitOfWork>> {
            Ok(Box::new(FailingUnitOfWork {
                fail_on_commit: self.fail_on_commit,
            }))
        }
    }

    #[async_trait]
    impl AppointmentUnitOfWork for FailingUnitOfWork {
        async fn insert_appointment(
            &mut self,
            appointment: NewAppointment,
        ) -> Result<crate::models::Appointment> {
            if !self.fail_on_commit {
                return Err(Error::Storage("connection reset".to_string()));
            }
            Ok(crate::models::Appointment {
                id: 1,
                title: appointment.title,
                description: appointment.description,
                start_date_time: appointment.start_date_time,
                end_date_time: appointment.end_date_time,
                organizer: appointment.organizer,
                attendees: Vec::new(),
                status: appointment.status,
                created_at: appointment.created_at,
                updated_at: appointment.updated_at,
            })
        }

        async fn commit(self: Box<Self>) -> Result<()> {
            if self.fail_on_commit {
                return Err(Error::Storage("serialization failure on commit".to_string()));
            }
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_propagates_storage_errors() {
        let handler = CreateAppointmentHandler::new(Arc::new(FailingStore {
            fail_on_commit: false,
        }));
        let err = handler.handle(standup()).await.unwrap_err();
        assert!(err.is_storage());
        assert_eq!(err.status_code(), 500);
    }

    #[tokio::test]
    async fn test_commit_failure_is_not_reported_as_created() {
        let handler = CreateAppointmentHandler::new(Arc::new(FailingStore {
            fail_on_commit: true,
        }));
        let err = handler.handle(standup()).await.unwrap_err();
        assert!(err.is_storage());
        assert!(err.to_string().contains("on commit"));
    }
}
