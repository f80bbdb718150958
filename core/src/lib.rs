//! Client core for the school/class roster service.
//!
//! # Overview
//! Keeps a local copy of schools and classes consistent with a REST backend.
//! Schools list the ids of their classes and classes point back at their
//! school; [`RosterStore`] keeps both directions in agreement across every
//! add, update and delete.
//!
//! # Design
//! - Requests are built and responses parsed as plain data (host-does-IO);
//!   execution goes through a [`Transport`]. `UreqTransport` is the blocking
//!   default, a native host can supply its own through the C ABI crate.
//! - [`RosterStore`] is pure state with no I/O; [`RosterSync`] couples it to
//!   the API for the fetch and create round trips.
//! - DTOs are defined independently from the mock-server crate; integration
//!   tests catch schema drift.

pub mod client;
pub mod config;
pub mod error;
pub mod http;
pub mod repository;
pub mod store;
pub mod sync;
pub mod transport;
pub mod types;
pub mod usecase;

pub use client::ApiClient;
pub use config::ClientConfig;
pub use error::{InvalidAcademicYear, Result, RosterError};
pub use http::{HttpMethod, HttpRequest, HttpResponse};
pub use repository::{ClassRepository, RosterApi, SchoolRepository};
pub use store::{IntegrityViolation, RosterStore};
pub use sync::RosterSync;
#[cfg(feature = "ureq")]
pub use transport::UreqTransport;
pub use transport::Transport;
pub use types::{
    AnoLetivo, ClassEntity, ClassUpdate, CreateClass, CreateSchool, EntityId, School, SchoolUpdate,
    Turno,
};
