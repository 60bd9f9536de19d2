//! Port traits: the boundary between the router and the host firmware.
//!
//! ```text
//!   XapEngine ──▶ DevicePort ──▶ host firmware (clock, bootloader, EEPROM)
//! ```
//!
//! Handlers never touch hardware directly. Everything device-specific that
//! an introspection or QMK handler needs is reached through [`DevicePort`],
//! so the whole router runs on the host with a mock device.

/// Hooks into the surrounding firmware.
pub trait DevicePort {
    /// Monotonic milliseconds since boot. Wrapping is expected.
    fn now_ms(&self) -> u32;

    /// Firmware version reported by the QMK version query.
    fn qmk_version(&self) -> u32;

    /// MCU-unique hardware identifier.
    fn hardware_id(&self) -> [u32; 4];

    /// Ask the firmware to enter the bootloader.
    ///
    /// Called from inside a handler, before the reply has been sent.
    /// Implementations MUST defer the jump until the current report has
    /// been flushed.
    fn request_bootloader_jump(&mut self);

    /// Reset persistent configuration to defaults.
    fn reinit_eeprom(&mut self);
}
