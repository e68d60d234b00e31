//! Reference implementations of the external-capability ports.
//!
//! Only the in-memory backends live here; real deployments bind the ports to
//! their broker, scheduler and database of choice.

pub mod memory;
