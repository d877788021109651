//! Database entities for the finance service.

pub mod entities;
