//! # IO Module
//!
//! Translation between the `shared` wire/persisted types and the domain
//! models. Nothing here holds business rules; dates, hours and timestamps are
//! parsed on the way in and formatted on the way out.

pub mod mappers;
