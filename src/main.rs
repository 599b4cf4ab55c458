//! Mesh node firmware: main entry point.
//!
//! ```text
//! ┌────────────────────────────────────────────────────────────────┐
//! │                      Adapters (outer ring)                     │
//! │                                                                │
//! │  FlashStore        LogFile        SystemReboot   SystemClock   │
//! │  (Settings+Config) (LogPort)      (RebootPort)   (TimePort)    │
//! │  StdioTransport    SerialLogger   radio_sink                   │
//! │  (serial link)     (Debug Msg)    (frame drain)                │
//! │                                                                │
//! │  ──────────────── Port Trait Boundary ───────────────────      │
//! │                                                                │
//! │  ┌────────────────────────────────────────────────────────┐    │
//! │  │  Dispatcher (serial-rx)      BootSequence (main)       │    │
//! │  │        └──── DeviceState (mode + hold latch) ────┘     │    │
//! │  └────────────────────────────────────────────────────────┘    │
//! └────────────────────────────────────────────────────────────────┘
//! ```

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use log::{error, info};

use meshnode::adapters::flash::{self, FlashStore};
use meshnode::adapters::log_file::LogFile;
use meshnode::adapters::reboot::SystemReboot;
use meshnode::adapters::time::SystemClock;
use meshnode::adapters::{radio_sink, serial_log};
use meshnode::config::NodeConfig;
use meshnode::fsm::DeviceState;
use meshnode::fsm::boot::{self, BootSequence, BootTiming};
use meshnode::rpc::channels::{FrameMailbox, SerialMailbox};
use meshnode::rpc::engine::Dispatcher;
use meshnode::rpc::io_task::{self, RxExit};
use meshnode::rpc::transport::StdioTransport;

/// How long to wait for queued output once the host closes the link.
const SHUTDOWN_DRAIN: Duration = Duration::from_secs(2);

fn main() -> Result<()> {
    // ── 1. Platform bootstrap ─────────────────────────────────
    #[cfg(target_os = "espidf")]
    esp_idf_svc::sys::link_patches();

    let device = Arc::new(DeviceState::new());
    let serial = Arc::new(SerialMailbox::new());
    let frames = Arc::new(FrameMailbox::new());

    // ── 2. Serial output + logging ────────────────────────────
    io_task::spawn_tx(Arc::clone(&serial), StdioTransport::new())
        .context("spawning serial-tx")?;
    serial_log::init(
        Arc::clone(&serial),
        SystemClock::new(),
        NodeConfig::default().level_filter(),
    )
    .context("installing logger")?;

    info!("Mesh node v{} booting", env!("CARGO_PKG_VERSION"));

    // ── 3. Storage, config, settings (mode: BOOTING) ──────────
    let root = flash::default_root();
    let mut store =
        FlashStore::mount(&root).with_context(|| format!("mounting {}", root.display()))?;

    let config = boot::restore_config(&store);
    log::set_max_level(config.level_filter());
    let settings = boot::restore_settings(&mut store);
    info!(
        "Settings: {} Hz, SF{}, BW {}, CR {}, mode {}",
        settings.frequency,
        settings.spreading_factor,
        settings.bandwidth,
        settings.coding_rate,
        settings.mode
    );

    let log = LogFile::new(root.join(config.log_file.as_str()));

    // ── 4. Worker threads ─────────────────────────────────────
    radio_sink::spawn(Arc::clone(&frames)).context("spawning radio-sink")?;

    let grace = Duration::from_millis(u64::from(config.reboot_grace_ms));
    let mut dispatcher = Dispatcher::new(
        settings,
        store,
        log,
        Arc::clone(&device),
        Arc::clone(&serial),
        frames,
    );
    let rx_serial = Arc::clone(&serial);
    let rx = thread::Builder::new()
        .name("serial-rx".into())
        .stack_size(io_task::RX_STACK_SIZE)
        .spawn(move || {
            io_task::run_rx(
                StdioTransport::new(),
                &mut dispatcher,
                &SystemReboot,
                &rx_serial,
                grace,
            )
        })
        .context("spawning serial-rx")?;

    // ── 5. Mode sequence ──────────────────────────────────────
    let boot = BootSequence::new(device, BootTiming::from(&config));
    boot.enter_management()?;
    boot.run_management_window()?;

    // ── 6. Run until the link closes ──────────────────────────
    match rx.join() {
        Ok(Ok(RxExit::InputClosed)) => info!("Serial link closed, shutting down"),
        Ok(Ok(RxExit::Rebooted)) => {}
        Ok(Err(e)) => error!("Serial receive failed: {}", e),
        Err(_) => error!("serial-rx panicked"),
    }
    io_task::wait_drained(&serial, SHUTDOWN_DRAIN);
    thread::sleep(grace);
    Ok(())
}
