//! Session lifecycle: record keeping, event bridging, and the controller

mod bridge;
mod controller;
mod record;

pub use bridge::EventBridge;
pub use controller::SessionController;
pub use record::{Liveness, SessionRecord, SessionStore};
