//! Mail summary extraction.
//!
//! Turns a retrieved [`mailledger_mime::Message`] into a [`MailInfo`]. Where
//! the sender and the receipt time come from depends on the provider, so
//! that part is a [`DecodingProfile`]:
//!
//! - [`NeteaseProfile`]: the first `Received` header (163/126 mailboxes)
//! - [`StandardProfile`]: the `From` and `Date` headers

mod decoder;
mod profile;

pub use decoder::{MailDecoder, MailInfo};
pub use profile::{DecodingProfile, NeteaseProfile, StandardProfile};
