//! Provider-facing configuration.
//!
//! `descriptor` exposes validated metadata (`ProviderDescriptor`) covering HTTPS-only token,
//! revocation and API endpoints plus the mandatory User-Agent every outbound call carries.

pub mod descriptor;

pub use descriptor::*;
