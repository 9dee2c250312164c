//! Domain models backed by database rows.

pub mod cart;
pub mod order;
pub mod product;
pub mod user;
