//! Authoritative server-side session management

pub mod registry;

pub use registry::{SessionEvent, SessionHandle, SessionRegistry, SessionStats};
