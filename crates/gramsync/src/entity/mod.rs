//! SeaORM entity definitions for the gramsync database schema.

pub mod comment;
pub mod post;
pub mod prelude;
