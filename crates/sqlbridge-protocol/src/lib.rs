pub mod backend;
pub mod frontend;
pub mod messages;
pub mod session;

pub use messages::{BackendMessage, ConnInfo, FrontendMessage};
pub use session::{LoopStats, Session};
