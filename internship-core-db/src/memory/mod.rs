//! In-process [`Store`](crate::repository::Store) used by tests and local runs.
//!
//! A unit of work takes the store-wide lock, works on a private copy of the
//! state and swaps it in on commit. Units are therefore fully serialised,
//! which is the strongest isolation a relational store would offer.

mod repositories;
mod store;

pub use store::{MemoryState, MemoryStore, MemoryUnitOfWork};
