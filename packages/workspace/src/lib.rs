//! Session layer between editor views and a document.
//!
//! A session owns one document and any number of attached views. Views talk
//! to the session with labeled requests; every successful mutation is
//! answered on the requesting channel and followed by a full-state update
//! broadcast to all attached views. Requests are handled one at a time on the
//! session's task, so views never observe a half-applied edit.

pub mod broadcaster;
pub mod messages;
pub mod session;

pub use broadcaster::{Broadcaster, ViewId};
pub use messages::{Request, Response, ViewMessage};
pub use session::DocumentSession;
