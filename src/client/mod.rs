//! Client connection layer

pub mod raw_connection;

pub use raw_connection::{ConnectionFactory, RawConnection};
