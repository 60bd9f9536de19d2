//! XAP hierarchical command router.
//!
//! Routes fixed-size HID reports through a static tree of subsystem
//! tables to leaf handlers and encodes at most one reply per request.
//! Everything device-specific sits behind [`ports::DevicePort`], so the
//! whole router runs and is tested on the host.

#![deny(unused_must_use)]

pub mod config;
pub mod error;
pub mod ports;
pub mod xap;
