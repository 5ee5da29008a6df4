//! Agent adapters.
//!
//! [`PersonaAgent`] turns a configured persona prompt plus a text backend
//! into an [`Agent`](conclave_application::Agent).

mod persona;

pub use persona::{PersonaAgent, build_roster, default_roster};
