//! Clock and ordering primitives shared by client and server

pub mod event_queue;
pub mod ping;

pub use event_queue::TimedEventQueue;
pub use ping::PingEstimator;
