//! Client-side synchronization core (headless; rendering lives elsewhere)

pub mod session;

pub use session::{ClientError, ClientSession};
