//! Route-tree dispatch.
//!
//! [`execute_route`] consumes one identifier per tree level and descends
//! until it reaches a leaf or addressing fails:
//!
//! ```text
//!   data = [id₀][id₁][payload…]
//!            │    │
//!   root ────┘    │
//!   [id₀] Router ─┘──▶ child table
//!                 [id₁] Execute ──▶ handler(token, payload…)
//! ```
//!
//! Failure policy:
//!
//! | Condition                              | Reply                          |
//! |----------------------------------------|--------------------------------|
//! | empty path, id out of range, dead end  | none (or failure if configured)|
//! | `Unknown` tag                          | failure                        |
//! | secure node while gate locked          | failure + `SECURE_FAILURE`     |
//! | leaf reached                           | whatever the handler sends     |

use log::{debug, warn};

use crate::config::XapConfig;
use crate::error::CodecError;
use crate::ports::DevicePort;

use super::blob::ConfigBlob;
use super::codec::{Response, ResponseFlags};
use super::route::{Route, RouteKind, Token};
use super::secure::SecureGate;

/// Everything a handler can reach while serving one request.
///
/// Holds the single reply slot: a dispatch produces zero or one response.
pub struct XapContext<'a> {
    device: &'a mut dyn DevicePort,
    secure: &'a mut SecureGate,
    config: &'a XapConfig,
    blob: &'a ConfigBlob,
    root: &'static [Route],
    table: &'static [Route],
    reply: Option<Response>,
}

impl<'a> XapContext<'a> {
    pub fn new(
        device: &'a mut dyn DevicePort,
        secure: &'a mut SecureGate,
        config: &'a XapConfig,
        blob: &'a ConfigBlob,
        root: &'static [Route],
    ) -> Self {
        Self {
            device,
            secure,
            config,
            blob,
            root,
            table: root,
            reply: None,
        }
    }

    // ── Accessors ─────────────────────────────────────────────

    pub fn device(&mut self) -> &mut dyn DevicePort {
        &mut *self.device
    }

    pub fn secure(&self) -> &SecureGate {
        &*self.secure
    }

    pub fn secure_mut(&mut self) -> &mut SecureGate {
        &mut *self.secure
    }

    pub fn config(&self) -> &XapConfig {
        self.config
    }

    pub fn blob(&self) -> &ConfigBlob {
        self.blob
    }

    /// Root table of the tree being walked.
    pub fn root(&self) -> &'static [Route] {
        self.root
    }

    /// Table that contains the node currently being executed.
    pub fn table(&self) -> &'static [Route] {
        self.table
    }

    // ── Replies ───────────────────────────────────────────────

    /// Queue the reply for this request. Lock-state flags are added here.
    ///
    /// Only the first reply is kept.
    pub fn respond(
        &mut self,
        token: Token,
        flags: ResponseFlags,
        payload: &[u8],
    ) -> Result<(), CodecError> {
        let response = Response::new(token, flags, payload)?;
        self.store(response);
        Ok(())
    }

    /// Reply with `SUCCESS`. A payload that does not fit becomes a failure.
    pub fn respond_success(&mut self, token: Token, payload: &[u8]) {
        if let Err(e) = self.respond(token, ResponseFlags::SUCCESS, payload) {
            warn!("XAP[{:04X}]: {}", token, e);
            self.respond_failure(token);
        }
    }

    pub fn respond_failure(&mut self, token: Token) {
        self.store(Response::failure(token));
    }

    pub fn into_reply(self) -> Option<Response> {
        self.reply
    }

    // ── Internal ──────────────────────────────────────────────

    #[cfg(test)]
    pub(crate) fn table_for_test(&mut self, table: &'static [Route]) {
        self.table = table;
    }

    fn store(&mut self, mut response: Response) {
        if self.reply.is_some() {
            warn!(
                "XAP[{:04X}]: handler replied twice, dropping second reply",
                response.token
            );
            return;
        }
        response.flags = response.flags | self.secure.response_flags();
        self.reply = Some(response);
    }

    fn unroutable(&mut self, token: Token) {
        if self.config.routing.answer_unroutable {
            self.respond_failure(token);
        }
    }
}

/// Walk `routes` with the identifier stream `data`.
///
/// Every step is bounded by `split_first`, so at most `data.len()` levels
/// are visited and no byte is read past the end.
pub fn execute_route(ctx: &mut XapContext<'_>, token: Token, routes: &'static [Route], data: &[u8]) {
    let Some((&id, rest)) = data.split_first() else {
        debug!("XAP[{:04X}]: identifier path exhausted", token);
        ctx.unroutable(token);
        return;
    };
    let Some(route) = routes.get(usize::from(id)) else {
        debug!(
            "XAP[{:04X}]: id {:#04x} out of range (table has {})",
            token,
            id,
            routes.len()
        );
        ctx.unroutable(token);
        return;
    };

    debug!(
        "XAP[{:04X}]: id {:#04x} descriptor {:#04x}",
        token,
        id,
        route.flags()
    );

    if let RouteKind::Unknown(tag) = route.kind {
        warn!("XAP[{:04X}]: id {:#04x} has unknown route tag {}", token, id, tag);
        ctx.respond_failure(token);
        return;
    }

    if route.secure {
        let now = ctx.device.now_ms();
        if !ctx.secure.permits(now) {
            warn!("XAP[{:04X}]: secure route {:#04x} refused, gate locked", token, id);
            let _ = ctx.respond(token, ResponseFlags::SECURE_FAILURE, &[]);
            return;
        }
    }

    match route.kind {
        RouteKind::Router(children) => {
            if children.is_empty() {
                debug!("XAP[{:04X}]: id {:#04x} is a dead end", token, id);
                ctx.unroutable(token);
                return;
            }
            execute_route(ctx, token, children, rest);
        }
        RouteKind::Execute(handler) => {
            ctx.table = routes;
            handler(ctx, token, rest);
        }
        RouteKind::Unknown(_) => ctx.respond_failure(token),
    }
}

// ── Tests ────────────────────────────────────────────────────
