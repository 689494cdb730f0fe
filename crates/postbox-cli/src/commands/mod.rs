pub mod common;
pub mod completions;
pub mod inbox;
pub mod outbox;
pub mod send;
pub mod sync;
pub mod watch;
