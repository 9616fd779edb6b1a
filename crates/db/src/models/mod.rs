//! Domain model structs and DTOs.
//!
//! Each submodule contains:
//! - A `FromRow` + `Serialize` entity struct matching the database row
//! - A `Deserialize` create DTO for inserts, where the row is not created
//!   from a core type directly

pub mod alert;
pub mod catalog;
pub mod reading;
