//! Command/notification bus
//!
//! Front-ends talk to the engine with `Command`s and learn about state
//! changes through `Notification`s broadcast by a `Publisher`.

pub mod codec;
pub mod command;
pub mod notification;
pub mod publisher;

pub use codec::WireFormat;
pub use command::Command;
pub use notification::{Change, LayoutState, ModeState, Notification};
pub use publisher::{Publisher, Subscriber, Subscription};
