//! Live progress channels for interactive sync runs.

mod channel;

pub use channel::{channel_name, ChannelBroadcaster, NoopBroadcaster};
