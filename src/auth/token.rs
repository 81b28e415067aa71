//! Token records, their wire form, and the redacting secret wrapper.

pub mod record;
pub mod response;
pub mod secret;
