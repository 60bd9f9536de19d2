//! Built-in leaf handlers: protocol introspection, secure gate control and
//! QMK board identity.
//!
//! All multi-byte values are little-endian. Handlers that cannot serve a
//! request reply with a plain failure; none of them stay silent.

use log::{info, warn};

use super::blob::CONFIG_BLOB_CHUNK_SIZE;
use super::codec::MAX_RESPONSE_PAYLOAD;
use super::dispatch::XapContext;
use super::route::{Token, presence_mask};
use super::routes::XAP_BCD_VERSION;

// ── XAP subsystem ────────────────────────────────────────────

pub fn xap_version_query(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    ctx.respond_success(token, &XAP_BCD_VERSION.to_le_bytes());
}

/// Bitmask of the operations present in the table this handler was
/// dispatched from. Shared by every subsystem's capabilities route.
pub fn capabilities_query(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let mask = presence_mask(ctx.table());
    ctx.respond_success(token, &mask.to_le_bytes());
}

/// Bitmask of the subsystems present in the root table.
pub fn subsystem_query(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let mask = presence_mask(ctx.root());
    ctx.respond_success(token, &mask.to_le_bytes());
}

pub fn secure_status(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let status = ctx.secure().status() as u8;
    ctx.respond_success(token, &[status]);
}

pub fn secure_unlock(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let now = ctx.device().now_ms();
    ctx.secure_mut().begin_unlock(now);
    ctx.respond_success(token, &[]);
}

pub fn secure_lock(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    ctx.secure_mut().lock();
    ctx.respond_success(token, &[]);
}

// ── QMK subsystem ────────────────────────────────────────────

pub fn qmk_version_query(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let version = ctx.device().qmk_version();
    ctx.respond_success(token, &version.to_le_bytes());
}

/// `[vid u16][pid u16][device version u16][unique id u32]`
pub fn qmk_board_identifiers(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let board = &ctx.config().board;
    let mut out = [0u8; 10];
    out[0..2].copy_from_slice(&board.vendor_id.to_le_bytes());
    out[2..4].copy_from_slice(&board.product_id.to_le_bytes());
    out[4..6].copy_from_slice(&board.device_version.to_le_bytes());
    out[6..10].copy_from_slice(&board.unique_id.to_le_bytes());
    ctx.respond_success(token, &out);
}

pub fn qmk_board_manufacturer(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let name = ctx.config().board.manufacturer.clone();
    respond_str(ctx, token, &name);
}

pub fn qmk_product_name(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let name = ctx.config().board.product.clone();
    respond_str(ctx, token, &name);
}

pub fn qmk_config_blob_length(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let len = ctx.blob().len();
    ctx.respond_success(token, &len.to_le_bytes());
}

/// Request: `[offset u16]`. Response: up to 32 blob bytes from `offset`.
pub fn qmk_config_blob_chunk(ctx: &mut XapContext<'_>, token: Token, data: &[u8]) {
    let Some(offset) = data.first_chunk::<2>().map(|b| u16::from_le_bytes(*b)) else {
        warn!("XAP[{:04X}]: blob chunk request without offset", token);
        ctx.respond_failure(token);
        return;
    };
    let chunk = ctx
        .blob()
        .chunk(offset)
        .and_then(|b| heapless::Vec::<u8, CONFIG_BLOB_CHUNK_SIZE>::from_slice(b).ok());
    match chunk {
        Some(bytes) => ctx.respond_success(token, &bytes),
        None => {
            warn!(
                "XAP[{:04X}]: blob offset {} past end ({})",
                token,
                offset,
                ctx.blob().len()
            );
            ctx.respond_failure(token);
        }
    }
}

/// Secure. The reply is queued before the device is asked to jump.
pub fn qmk_bootloader_jump(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    info!("XAP[{:04X}]: bootloader jump requested", token);
    ctx.respond_success(token, &[1]);
    ctx.device().request_bootloader_jump();
}

/// `[u32; 4]` hardware id.
pub fn qmk_hardware_id(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    let id = ctx.device().hardware_id();
    let mut out = [0u8; 16];
    for (dst, word) in out.chunks_exact_mut(4).zip(id) {
        dst.copy_from_slice(&word.to_le_bytes());
    }
    ctx.respond_success(token, &out);
}

/// Secure.
pub fn qmk_reinit_eeprom(ctx: &mut XapContext<'_>, token: Token, _data: &[u8]) {
    info!("XAP[{:04X}]: EEPROM reinit requested", token);
    ctx.device().reinit_eeprom();
    ctx.respond_success(token, &[]);
}

// ── Helpers ──────────────────────────────────────────────────

/// Reply with a string, truncated to one report.
fn respond_str(ctx: &mut XapContext<'_>, token: Token, s: &str) {
    let bytes = s.as_bytes();
    ctx.respond_success(token, &bytes[..bytes.len().min(MAX_RESPONSE_PAYLOAD)]);
}

// ── Tests ────────────────────────────────────────────────────
