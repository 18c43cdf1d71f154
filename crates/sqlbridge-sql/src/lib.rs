pub mod bridge;
pub mod connection;
pub mod dispatch;
pub mod extract;

pub use bridge::{run_exec, run_query};
pub use connection::DatabaseOptions;
pub use dispatch::{dispatch, Event};
pub use extract::{extract, SqlRequest};

#[cfg(test)]
mod tests;
