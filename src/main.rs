//! xap-sim: host-side XAP router simulator.
//!
//! Reads one command per line from stdin and writes each response report
//! as a hex line to stdout.
//!
//! ```text
//!   0100 0000          request: token 0x0001, XAP version query
//!   key 0 0            press matrix key (row 0, col 0)
//!   tick               expire secure timers
//! ```
//!
//! Reports travel through the same report queues a firmware USB task
//! would use, so the simulator exercises the full engine pipeline.
#![deny(unused_must_use)]

use std::io::{self, BufRead, Write};
use std::time::Instant;

use anyhow::{Context, Result, anyhow, bail};
use log::{info, warn};

use xap_router::config::{KeyPosition, XapConfig};
use xap_router::ports::DevicePort;
use xap_router::xap::channels::{ChannelTransport, pop_outbound, push_inbound};
use xap_router::xap::{Report, XAP_EPSIZE, XapEngine};

// ── Simulated device ──────────────────────────────────────────

struct SimDevice {
    boot: Instant,
    jump_requested: bool,
}

impl SimDevice {
    fn new() -> Self {
        Self {
            boot: Instant::now(),
            jump_requested: false,
        }
    }
}

impl DevicePort for SimDevice {
    fn now_ms(&self) -> u32 {
        self.boot.elapsed().as_millis() as u32
    }

    fn qmk_version(&self) -> u32 {
        // 0.26.0
        0x0026_0000
    }

    fn hardware_id(&self) -> [u32; 4] {
        [0x5841_5053, 0x494D_0000, 0, u32::from(std::process::id() as u16)]
    }

    fn request_bootloader_jump(&mut self) {
        info!("sim: bootloader jump scheduled");
        self.jump_requested = true;
    }

    fn reinit_eeprom(&mut self) {
        info!("sim: EEPROM reset to defaults");
    }
}

// ── Input parsing ─────────────────────────────────────────────

enum Command {
    Report(Report),
    Key(KeyPosition),
    Tick,
}

fn parse_line(line: &str) -> Result<Option<Command>> {
    let line = line.trim();
    if line.is_empty() || line.starts_with('#') {
        return Ok(None);
    }
    let mut words = line.split_whitespace();
    match words.next() {
        Some("tick") => Ok(Some(Command::Tick)),
        Some("key") => {
            let row = words.next().context("key: missing row")?.parse()?;
            let col = words.next().context("key: missing col")?.parse()?;
            Ok(Some(Command::Key(KeyPosition::new(row, col))))
        }
        _ => {
            let digits: String = line.split_whitespace().collect();
            let bytes = hex::decode(&digits).context("invalid hex report")?;
            if bytes.len() > XAP_EPSIZE {
                bail!("report is {} bytes, endpoint holds {}", bytes.len(), XAP_EPSIZE);
            }
            let mut report = [0u8; XAP_EPSIZE];
            report[..bytes.len()].copy_from_slice(&bytes);
            Ok(Some(Command::Report(report)))
        }
    }
}

fn load_config() -> Result<XapConfig> {
    let Some(path) = std::env::args().nth(1) else {
        info!("sim: no config file given, using defaults");
        return Ok(XapConfig::default());
    };
    let text = std::fs::read_to_string(&path).with_context(|| format!("reading {path}"))?;
    let config = serde_json::from_str(&text).map_err(|e| anyhow!("parsing {path}: {e}"))?;
    info!("sim: config loaded from {}", path);
    Ok(config)
}

// ── Main ──────────────────────────────────────────────────────

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"))
        .target(env_logger::Target::Stderr)
        .init();

    info!("xap-sim v{}", env!("CARGO_PKG_VERSION"));

    let config = load_config()?;
    let mut engine = XapEngine::with_default_routes(config)?;
    let mut device = SimDevice::new();
    let mut transport = ChannelTransport::global();

    let stdin = io::stdin();
    let mut stdout = io::stdout().lock();

    for line in stdin.lock().lines() {
        let line = line.context("reading stdin")?;
        let command = match parse_line(&line) {
            Ok(Some(c)) => c,
            Ok(None) => continue,
            Err(e) => {
                warn!("sim: {:#}", e);
                continue;
            }
        };

        match command {
            Command::Tick => engine.tick(device.now_ms()),
            Command::Key(pos) => {
                if engine.on_key(pos, true, device.now_ms()) {
                    info!("sim: secure gate unlocked");
                }
                engine.on_key(pos, false, device.now_ms());
            }
            Command::Report(report) => {
                push_inbound(report)?;
                while engine.poll(&mut transport, &mut device)? {}
                while let Some(out) = pop_outbound() {
                    writeln!(stdout, "{}", hex::encode(out))?;
                }
                stdout.flush()?;
            }
        }

        if device.jump_requested {
            info!("sim: jumping to bootloader, exiting");
            break;
        }
    }

    let stats = engine.stats();
    info!(
        "sim: {} received, {} answered, {} silent, {} rejected",
        stats.received, stats.answered, stats.silent, stats.rejected
    );
    Ok(())
}
