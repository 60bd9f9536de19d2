//! Static route tables and the wire identifier space.
//!
//! ```text
//!  root
//!  ├─ 0x00 XAP        version · capabilities · subsystems · secure status/unlock/lock
//!  ├─ 0x01 QMK        capabilities · version · board ids · manufacturer · product
//!  │                  blob length · blob chunk · bootloader* · hardware id · eeprom*
//!  ├─ 0x02 Keyboard   (host supplied)
//!  └─ 0x03 User       (host supplied)
//!                                                   * secure
//! ```
//!
//! Identifiers are part of the wire protocol: moving an entry is a
//! breaking change. Build features swap an entry for [`Route::EMPTY`]
//! instead of removing it, so the remaining identifiers never shift.

use super::handlers;
use super::route::{Identifier, Route};

/// Protocol version, BCD `0xMMmmpppp` (0.2.0).
pub const XAP_BCD_VERSION: u32 = 0x0002_0000;

// ── Root ─────────────────────────────────────────────────────

pub const SUBSYSTEM_XAP: Identifier = 0x00;
pub const SUBSYSTEM_QMK: Identifier = 0x01;
pub const SUBSYSTEM_KEYBOARD: Identifier = 0x02;
pub const SUBSYSTEM_USER: Identifier = 0x03;

// ── XAP subsystem ────────────────────────────────────────────

pub const XAP_VERSION_QUERY: Identifier = 0x00;
pub const XAP_CAPABILITIES_QUERY: Identifier = 0x01;
pub const XAP_SUBSYSTEM_QUERY: Identifier = 0x02;
pub const XAP_SECURE_STATUS: Identifier = 0x03;
pub const XAP_SECURE_UNLOCK: Identifier = 0x04;
pub const XAP_SECURE_LOCK: Identifier = 0x05;

pub const XAP_ROUTES: [Route; 6] = [
    Route::execute(handlers::xap_version_query),
    Route::execute(handlers::capabilities_query),
    Route::execute(handlers::subsystem_query),
    Route::execute(handlers::secure_status),
    Route::execute(handlers::secure_unlock),
    Route::execute(handlers::secure_lock),
];

// ── QMK subsystem ────────────────────────────────────────────

pub const QMK_CAPABILITIES_QUERY: Identifier = 0x00;
pub const QMK_VERSION_QUERY: Identifier = 0x01;
pub const QMK_BOARD_IDENTIFIERS: Identifier = 0x02;
pub const QMK_BOARD_MANUFACTURER: Identifier = 0x03;
pub const QMK_PRODUCT_NAME: Identifier = 0x04;
pub const QMK_CONFIG_BLOB_LENGTH: Identifier = 0x05;
pub const QMK_CONFIG_BLOB_CHUNK: Identifier = 0x06;
pub const QMK_BOOTLOADER_JUMP: Identifier = 0x07;
pub const QMK_HARDWARE_ID: Identifier = 0x08;
pub const QMK_REINIT_EEPROM: Identifier = 0x09;

pub const QMK_ROUTES: [Route; 10] = [
    Route::execute(handlers::capabilities_query),
    Route::execute(handlers::qmk_version_query),
    Route::execute(handlers::qmk_board_identifiers),
    Route::execute(handlers::qmk_board_manufacturer),
    Route::execute(handlers::qmk_product_name),
    Route::execute(handlers::qmk_config_blob_length),
    Route::execute(handlers::qmk_config_blob_chunk),
    if cfg!(feature = "bootloader-jump") {
        Route::execute(handlers::qmk_bootloader_jump).secure()
    } else {
        Route::EMPTY
    },
    Route::execute(handlers::qmk_hardware_id),
    if cfg!(feature = "eeprom") {
        Route::execute(handlers::qmk_reinit_eeprom).secure()
    } else {
        Route::EMPTY
    },
];

/// Assemble a root table from the built-in subsystems and the host's
/// keyboard and user tables. An empty table leaves that subsystem absent.
///
/// ```ignore
/// static ROOT: [Route; 4] = root_routes(&KEYBOARD_ROUTES, &[]);
/// ```
pub const fn root_routes(keyboard: &'static [Route], user: &'static [Route]) -> [Route; 4] {
    [
        Route::router(&XAP_ROUTES),
        Route::router(&QMK_ROUTES),
        Route::router(keyboard),
        Route::router(user),
    ]
}

/// Root table with only the built-in subsystems.
pub static ROOT_ROUTES: [Route; 4] = root_routes(&[], &[]);
