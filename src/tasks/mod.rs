//! Background Tasks Module
//!
//! Contains background tasks a host application may run alongside its caches.
//!
//! # Tasks
//! - Durable Purge: Removes expired durable cache records at configured intervals

mod purge;

pub use purge::spawn_purge_task;
