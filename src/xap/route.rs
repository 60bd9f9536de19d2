//! Route nodes: the static routing tree.
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────┐
//! │  Route table (&'static [Route], index = wire identifier) │
//! │  ┌────┬──────────────────────────┬────────┐              │
//! │  │ id │ kind                     │ secure │              │
//! │  ├────┼──────────────────────────┼────────┤              │
//! │  │ 0  │ Router(&'static [Route]) │ no     │──▶ subtable  │
//! │  │ 1  │ Execute(fn handler)      │ no     │              │
//! │  │ 2  │ Router(&[])   (gap)      │ no     │              │
//! │  │ 3  │ Execute(fn handler)      │ yes    │              │
//! │  └────┴──────────────────────────┴────────┘              │
//! └──────────────────────────────────────────────────────────┘
//! ```
//!
//! Tables are plain `const` arrays. No heap, no `dyn`, no registration at
//! run time: adding an operation means adding an entry at build time.

use core::fmt;

use super::dispatch::XapContext;

/// Client-chosen correlation value, echoed in the response.
pub type Token = u16;

/// One byte of the identifier path.
pub type Identifier = u8;

/// Leaf operation. Receives the bytes left after the identifier path.
///
/// The handler replies (or not) through the context; the dispatcher
/// observes no return value.
pub type Handler = fn(&mut XapContext<'_>, Token, &[u8]);

/// Raw tag values of the one-byte route descriptor.
pub const ROUTE_TAG_UNKNOWN: u8 = 0;
pub const ROUTE_TAG_ROUTER: u8 = 1;
pub const ROUTE_TAG_EXECUTE: u8 = 2;

/// Bit set in [`Route::flags`] for secure nodes.
pub const ROUTE_FLAG_SECURE: u8 = 1 << 2;

/// What a route node does when it is addressed.
#[derive(Clone, Copy)]
pub enum RouteKind {
    /// Interior node: descend into the child table with the next identifier.
    Router(&'static [Route]),
    /// Leaf node: run the handler with the remaining payload.
    Execute(Handler),
    /// Unrecognised tag. Always answered with a failure response. The tag
    /// never collides with the router or execute tags.
    Unknown(u8),
}

impl RouteKind {
    /// Wire tag of this kind.
    pub const fn tag(&self) -> u8 {
        match self {
            Self::Router(_) => ROUTE_TAG_ROUTER,
            Self::Execute(_) => ROUTE_TAG_EXECUTE,
            Self::Unknown(tag) => unknown_tag(*tag),
        }
    }
}

/// Fold an arbitrary tag into the two-bit field without aliasing a known
/// kind: 1 and 2 become [`ROUTE_TAG_UNKNOWN`].
const fn unknown_tag(tag: u8) -> u8 {
    match tag & 0b11 {
        ROUTE_TAG_ROUTER | ROUTE_TAG_EXECUTE => ROUTE_TAG_UNKNOWN,
        other => other,
    }
}

impl fmt::Debug for RouteKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Router(children) => write!(f, "Router({} children)", children.len()),
            Self::Execute(_) => write!(f, "Execute"),
            Self::Unknown(tag) => write!(f, "Unknown({tag:#04x})"),
        }
    }
}

/// One entry in a route table.
#[derive(Debug, Clone, Copy)]
pub struct Route {
    pub kind: RouteKind,
    /// Node (and, for routers, everything beneath it) requires an
    /// unlocked secure gate.
    pub secure: bool,
}

impl Route {
    /// Placeholder for an unused identifier. Addressing it is a dead end.
    pub const EMPTY: Route = Route::router(&[]);

    pub const fn router(children: &'static [Route]) -> Self {
        Self {
            kind: RouteKind::Router(children),
            secure: false,
        }
    }

    pub const fn execute(handler: Handler) -> Self {
        Self {
            kind: RouteKind::Execute(handler),
            secure: false,
        }
    }

    pub const fn unknown(tag: u8) -> Self {
        Self {
            kind: RouteKind::Unknown(unknown_tag(tag)),
            secure: false,
        }
    }

    /// Mark this node as secure.
    pub const fn secure(self) -> Self {
        Self {
            kind: self.kind,
            secure: true,
        }
    }

    /// Whether addressing this node can reach a handler.
    pub const fn is_present(&self) -> bool {
        match self.kind {
            RouteKind::Router(children) => !children.is_empty(),
            RouteKind::Execute(_) => true,
            RouteKind::Unknown(_) => false,
        }
    }

    /// Pack the node into the one-byte descriptor: tag in bits 0-1,
    /// secure in bit 2.
    pub const fn flags(&self) -> u8 {
        let tag = self.kind.tag() & 0b11;
        if self.secure {
            tag | ROUTE_FLAG_SECURE
        } else {
            tag
        }
    }
}

/// Bitmask of the present entries of `routes`: bit *k* set when entry *k*
/// can reach a handler. Entries past bit 31 are not representable and
/// are ignored.
pub const fn presence_mask(routes: &[Route]) -> u32 {
    let mut mask = 0u32;
    let mut i = 0;
    while i < routes.len() && i < 32 {
        if routes[i].is_present() {
            mask |= 1 << i;
        }
        i += 1;
    }
    mask
}
