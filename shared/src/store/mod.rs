//! Storage port for appointments.
//!
//! The handler depends only on these traits. A unit of work groups the
//! inserts for one appointment and its attendees; nothing is visible to
//! other callers until [`AppointmentUnitOfWork::commit`] succeeds, and a unit
//! of work dropped without committing is discarded.

use async_trait::async_trait;

use crate::models::{Appointment, NewAppointment};
use crate::Result;

pub mod memory;
pub mod postgres;

pub use memory::InMemoryAppointmentStore;
pub use postgres::PgAppointmentStore;

/// Entry point to the backing store, shared across requests.
#[async_trait]
pub trait AppointmentStore: Send + Sync {
    /// Open a new unit of work.
    async fn begin(&self) -> Result<Box<dyn AppointmentUnitOfWork>>;
}

/// A single transactional scope on the store.
#[async_trait]
pub trait AppointmentUnitOfWork: Send {
    /// Stage an appointment and its attendees, returning the record with
    /// store-assigned ids.
    async fn insert_appointment(&mut self, appointment: NewAppointment) -> Result<Appointment>;

    /// Make every staged record durable and visible.
    async fn commit(self: Box<Self>) -> Result<()>;
}
