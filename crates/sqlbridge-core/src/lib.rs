pub mod error;
pub mod value;

pub use error::{BridgeError, Cause, ErrorKind, Operation};
pub use value::{DynamicValue, Number, ResultMap};
