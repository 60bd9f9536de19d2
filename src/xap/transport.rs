//! Transport abstraction: anything that moves whole reports.
//!
//! Concrete implementations:
//! - USB HID raw endpoint (firmware side, via [`super::channels`])
//! - stdin/stdout hex lines (host simulator)
//!
//! The engine is generic over `Transport`, so a new transport needs no
//! changes to routing or handlers.

use super::codec::Report;

/// Report-oriented transport channel.
pub trait Transport {
    /// Error type for this transport.
    type Error: core::fmt::Debug;

    /// Fill `report` with the next inbound report.
    /// Returns `false` if nothing is pending (non-blocking).
    fn receive(&mut self, report: &mut Report) -> Result<bool, Self::Error>;

    /// Queue one outbound report.
    fn send(&mut self, report: &Report) -> Result<(), Self::Error>;
}

/// A null transport that discards all reports and never receives.
/// Useful as a default when no host is attached.
pub struct NullTransport;

impl Transport for NullTransport {
    type Error = ();

    fn receive(&mut self, _report: &mut Report) -> Result<bool, ()> {
        Ok(false)
    }

    fn send(&mut self, _report: &Report) -> Result<(), ()> {
        Ok(())
    }
}
