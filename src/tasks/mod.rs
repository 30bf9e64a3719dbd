//! Background Tasks Module
//!
//! Contains work that outlives the request that started it.
//!
//! # Tasks
//! - Revalidation: stale-while-revalidate refreshes writing into the runtime generation

mod revalidate;

pub use revalidate::RevalidationQueue;
