//! Report queues between the USB task and the control loop.
//!
//! Uses `embassy-sync` bounded MPMC channels so an interrupt-driven USB
//! endpoint and the synchronous router share reports without heap
//! allocation.
//!
//! ```text
//! ┌──────────────┐  INBOUND_REPORTS   ┌──────────────┐
//! │   USB task   │──────────────────▶│  XapEngine    │
//! │  (HID EP)    │◀──────────────────│  (sync loop)  │
//! └──────────────┘  OUTBOUND_REPORTS  └──────────────┘
//! ```

use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Channel;
use log::warn;

use crate::error::TransportError;

use super::codec::Report;
use super::transport::Transport;

/// Queue depth in each direction.
pub const REPORT_QUEUE_DEPTH: usize = 4;

pub type ReportChannel = Channel<CriticalSectionRawMutex, Report, REPORT_QUEUE_DEPTH>;

/// Inbound reports: USB task → engine.
pub static INBOUND_REPORTS: ReportChannel = Channel::new();

/// Outbound reports: engine → USB task.
pub static OUTBOUND_REPORTS: ReportChannel = Channel::new();

/// Engine-side view of a pair of report channels.
pub struct ChannelTransport<'a> {
    inbound: &'a ReportChannel,
    outbound: &'a ReportChannel,
}

impl<'a> ChannelTransport<'a> {
    pub fn new(inbound: &'a ReportChannel, outbound: &'a ReportChannel) -> Self {
        Self { inbound, outbound }
    }
}

impl ChannelTransport<'static> {
    /// Transport over the global report queues.
    pub fn global() -> Self {
        Self::new(&INBOUND_REPORTS, &OUTBOUND_REPORTS)
    }
}

impl Transport for ChannelTransport<'_> {
    type Error = TransportError;

    fn receive(&mut self, report: &mut Report) -> Result<bool, TransportError> {
        match self.inbound.try_receive() {
            Ok(r) => {
                *report = r;
                Ok(true)
            }
            Err(_) => Ok(false),
        }
    }

    fn send(&mut self, report: &Report) -> Result<(), TransportError> {
        self.outbound.try_send(*report).map_err(|_| {
            warn!("XAP: outbound queue full, dropping response");
            TransportError::QueueFull
        })
    }
}

/// USB task side: queue a report received from the host.
pub fn push_inbound(report: Report) -> Result<(), TransportError> {
    INBOUND_REPORTS
        .try_send(report)
        .map_err(|_| TransportError::QueueFull)
}

/// USB task side: take the next response to write to the host.
pub fn pop_outbound() -> Option<Report> {
    OUTBOUND_REPORTS.try_receive().ok()
}

// ── Tests ────────────────────────────────────────────────────
