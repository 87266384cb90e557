//! Real-time job log streaming

pub mod channel;
pub mod controller;
pub mod wire;

pub use channel::{ChannelOpener, LogChannel, WsChannelOpener, WsLogChannel};
pub use controller::{LogStreamer, Options, PollFailurePolicy, ShutdownSignal};
pub use wire::{LogMessage, SubscribeParams};
