//! XAP engine: turns inbound reports into at most one outbound report.
//!
//! Every report passes through the same pipeline:
//!
//! 1. **Rate limiting** (opt-in, `routing.rate_limit`): token bucket (via
//!    `burster`) refilled from the device clock; excess reports are
//!    dropped without a reply.
//! 2. **Decode**: reports that cannot hold a token are dropped.
//! 3. **Secure timers**: unlock window and idle timeout are expired.
//! 4. **Dispatch**: the identifier path is walked from the root table.
//! 5. **Encode**: the single reply, if any, goes into a fresh report.
//!
//! The engine does not own a transport. Callers either feed reports via
//! [`XapEngine::handle_report`] or let [`XapEngine::poll`] drive any
//! [`Transport`].

use core::time::Duration;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use burster::Limiter;
use log::{debug, info, warn};

use crate::config::{KeyPosition, XapConfig};
use crate::error::{Result, TransportError};
use crate::ports::DevicePort;

use super::blob::ConfigBlob;
use super::codec::{Report, decode_request};
use super::dispatch::{XapContext, execute_route};
use super::route::Route;
use super::routes::ROOT_ROUTES;
use super::secure::SecureGate;
use super::transport::Transport;

/// Report counters since construction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EngineStats {
    /// Reports handed to the engine.
    pub received: u32,
    /// Reports that produced a response.
    pub answered: u32,
    /// Well-formed reports dropped without a response.
    pub silent: u32,
    /// Reports refused by the rate limiter or the decoder.
    pub rejected: u32,
}

/// Report-level XAP router.
pub struct XapEngine {
    config: XapConfig,
    root: &'static [Route],
    secure: SecureGate,
    blob: ConfigBlob,
    limiter: Option<RateLimiter>,
    stats: EngineStats,
}

impl XapEngine {
    /// Validate `config`, compress the board description and arm the
    /// secure gate.
    pub fn new(config: XapConfig, root: &'static [Route]) -> Result<Self> {
        config.validate()?;
        let blob = ConfigBlob::from_board(&config.board)?;
        let secure = SecureGate::new(&config.secure);
        let limiter = config.routing.rate_limit.then(RateLimiter::new);
        info!(
            "XAP: engine ready ({} subsystems, blob {} bytes, secure {})",
            root.iter().filter(|r| r.is_present()).count(),
            blob.len(),
            if secure.is_enabled() { "armed" } else { "disabled" }
        );
        Ok(Self {
            config,
            root,
            secure,
            blob,
            limiter,
            stats: EngineStats::default(),
        })
    }

    /// Engine over the built-in XAP and QMK subsystems only.
    pub fn with_default_routes(config: XapConfig) -> Result<Self> {
        Self::new(config, &ROOT_ROUTES)
    }

    /// Process one inbound report. Returns the encoded response, or `None`
    /// when the request is dropped silently.
    pub fn handle_report(&mut self, report: &[u8], device: &mut dyn DevicePort) -> Option<Report> {
        self.stats.received = self.stats.received.wrapping_add(1);
        let now = device.now_ms();

        if let Some(limiter) = &mut self.limiter {
            if !limiter.admit(now) {
                debug!("XAP: rate limit exceeded, dropping report");
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                return None;
            }
        }

        let request = match decode_request(report) {
            Ok(r) => r,
            Err(e) => {
                warn!("XAP: dropping malformed report: {}", e);
                self.stats.rejected = self.stats.rejected.wrapping_add(1);
                return None;
            }
        };

        self.secure.tick(now);

        let mut ctx = XapContext::new(
            device,
            &mut self.secure,
            &self.config,
            &self.blob,
            self.root,
        );
        execute_route(&mut ctx, request.token, self.root, request.path);

        match ctx.into_reply() {
            Some(response) => {
                debug!(
                    "XAP[{:04X}]: reply flags={:#04x} len={}",
                    response.token,
                    response.flags.bits(),
                    response.payload.len()
                );
                self.stats.answered = self.stats.answered.wrapping_add(1);
                Some(response.encode())
            }
            None => {
                self.stats.silent = self.stats.silent.wrapping_add(1);
                None
            }
        }
    }

    /// One receive → handle → send cycle. Returns `Ok(true)` when a report
    /// was consumed.
    pub fn poll<T: Transport>(
        &mut self,
        transport: &mut T,
        device: &mut dyn DevicePort,
    ) -> Result<bool> {
        let mut inbound = [0u8; super::codec::XAP_EPSIZE];
        let pending = transport.receive(&mut inbound).map_err(|e| {
            warn!("XAP: receive failed: {:?}", e);
            TransportError::ReceiveFailed
        })?;
        if !pending {
            return Ok(false);
        }

        if let Some(outbound) = self.handle_report(&inbound, device) {
            transport.send(&outbound).map_err(|e| {
                warn!("XAP: send failed: {:?}", e);
                TransportError::SendFailed
            })?;
        }
        Ok(true)
    }

    /// Advance the secure gate timers without a report.
    pub fn tick(&mut self, now_ms: u32) {
        self.secure.tick(now_ms);
    }

    /// Forward a matrix key event to the secure gate. Returns `true` when
    /// it completed the unlock sequence.
    pub fn on_key(&mut self, pos: KeyPosition, pressed: bool, now_ms: u32) -> bool {
        self.secure.on_key(pos, pressed, now_ms)
    }

    pub fn secure(&self) -> &SecureGate {
        &self.secure
    }

    pub fn secure_mut(&mut self) -> &mut SecureGate {
        &mut self.secure
    }

    pub fn stats(&self) -> EngineStats {
        self.stats
    }

    pub fn config(&self) -> &XapConfig {
        &self.config
    }

    pub fn root(&self) -> &'static [Route] {
        self.root
    }

    pub fn blob(&self) -> &ConfigBlob {
        &self.blob
    }
}

/// 100 reports per second, 100 burst capacity.
const RATE_PER_SEC: u64 = 100;
const RATE_BURST: u64 = 100;

/// Token bucket whose time source is the device millisecond clock.
///
/// The bucket reads a shared counter that [`RateLimiter::admit`] advances
/// by the wrapping delta of `now_ms`, so the 32-bit clock rolling over
/// never stalls the refill.
struct RateLimiter {
    bucket: burster::TokenBucket<Box<dyn Fn() -> Duration + Send>>,
    elapsed_ms: Arc<AtomicU64>,
    last_ms: Option<u32>,
}

impl RateLimiter {
    fn new() -> Self {
        let elapsed_ms = Arc::new(AtomicU64::new(0));
        let clock = Arc::clone(&elapsed_ms);
        let provider: Box<dyn Fn() -> Duration + Send> =
            Box::new(move || Duration::from_millis(clock.load(Ordering::Relaxed)));
        Self {
            bucket: burster::TokenBucket::new_with_time_provider(RATE_PER_SEC, RATE_BURST, provider),
            elapsed_ms,
            last_ms: None,
        }
    }

    fn admit(&mut self, now_ms: u32) -> bool {
        let step = self.last_ms.map_or(0, |last| now_ms.wrapping_sub(last));
        self.last_ms = Some(now_ms);
        self.elapsed_ms.fetch_add(u64::from(step), Ordering::Relaxed);
        self.bucket.try_consume(1).is_ok()
    }
}

// ── Tests ────────────────────────────────────────────────────
