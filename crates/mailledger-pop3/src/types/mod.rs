//! Core POP3 types.

mod mailbox;
mod reply;

pub use mailbox::{MailboxStat, MessageId};
pub use reply::{Reply, Status};
