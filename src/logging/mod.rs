//! Logging infrastructure: structured console output through [`tracing`].

mod subscriber;

pub use subscriber::init_subscriber;
