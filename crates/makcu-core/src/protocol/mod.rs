//! Protocol module containing the backend command grammar and reply parsing.

pub mod command;
pub mod reply;

pub use command::{CommandError, DeviceCommand, MouseButton};
pub use reply::{parse_status_reply, AcceptedBy, ConnectReply};
