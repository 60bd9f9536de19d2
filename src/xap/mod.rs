//! XAP protocol subsystem.
//!
//! Hierarchical command router for fixed-size HID reports.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────┐
//! │                      XAP Stack                             │
//! │                                                            │
//! │  ┌──────────┐   ┌──────────┐   ┌───────────────────────┐ │
//! │  │ Transport │──▶│  Codec   │──▶│  Dispatch (tree walk) │ │
//! │  │ (trait)   │   │ (report) │   │  → leaf handler       │ │
//! │  └──────────┘   └──────────┘   └───────────────────────┘ │
//! │       ▲                                    │              │
//! │       │              ┌─────────────────────┘              │
//! │       │              ▼                                    │
//! │  ┌──────────┐   ┌──────────┐                             │
//! │  │ Transport │◀──│  Codec   │   (token, flags, payload)  │
//! │  │ (send)    │   │ (encode) │                            │
//! │  └──────────┘   └──────────┘                             │
//! └────────────────────────────────────────────────────────────┘
//! ```
//!
//! Request report: `[token lo][token hi][id₀][id₁]…[payload…]`.
//! Response report: `[token lo][token hi][flags][payload…][zero padding]`.

pub mod blob;
pub mod channels;
pub mod codec;
pub mod dispatch;
pub mod engine;
pub mod handlers;
pub mod route;
pub mod routes;
pub mod secure;
pub mod transport;

pub use codec::{Report, ResponseFlags, XAP_EPSIZE};
pub use dispatch::XapContext;
pub use engine::XapEngine;
pub use route::{Handler, Identifier, Route, RouteKind, Token};
pub use routes::ROOT_ROUTES;
