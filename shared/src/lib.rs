//! Shared library for the appointment service.
//!
//! This crate provides the appointment model, the storage port and its
//! adapters, the creation handler, and HTTP helpers used by the Lambda.

pub mod appointments;
pub mod config;
pub mod db;
pub mod error;
pub mod http;
pub mod models;
pub mod secrets;
pub mod store;

pub use appointments::CreateAppointmentHandler;
pub use config::{Config, StoreBackend};
pub use error::{Error, Result};
pub use models::{
    Appointment, AppointmentCancelledEvent, AppointmentCreatedEvent, AppointmentStatus, Attendee,
    AttendeeRequest, CreateAppointmentRequest, CreateAppointmentResponse, NewAppointment,
    NewAttendee,
};
pub use store::{AppointmentStore, AppointmentUnitOfWork, InMemoryAppointmentStore, PgAppointmentStore};
