//! Mock port adapters for integration tests.
//!
//! Every mock shares its state through an `Arc`, so a test can hand one
//! clone to the dispatcher (often on another thread) and inspect the other.

use std::collections::VecDeque;
use std::io;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use meshnode::app::ports::{
    LogError, LogLines, LogPort, RebootPort, SettingsError, SettingsPort, StorageError,
};
use meshnode::fsm::{DeviceMode, DeviceState};
use meshnode::rpc::channels::{FrameMailbox, SerialMailbox};
use meshnode::rpc::engine::Dispatcher;
use meshnode::rpc::transport::Transport;
use meshnode::settings::SettingsBlock;
use serde_json::Value;

// ── Settings store ────────────────────────────────────────────

/// Records every block handed to `save_settings`.
#[derive(Clone, Default)]
pub struct MockSettings {
    pub saved: Arc<Mutex<Vec<SettingsBlock>>>,
    pub fail_saves: bool,
}

#[allow(dead_code)]
impl MockSettings {
    pub fn failing() -> Self {
        Self {
            fail_saves: true,
            ..Self::default()
        }
    }

    pub fn save_count(&self) -> usize {
        self.saved.lock().unwrap().len()
    }

    pub fn last_saved(&self) -> Option<SettingsBlock> {
        self.saved.lock().unwrap().last().cloned()
    }
}

impl SettingsPort for MockSettings {
    fn load_settings(&self) -> Result<SettingsBlock, SettingsError> {
        Ok(self.last_saved().unwrap_or_default())
    }

    fn save_settings(&mut self, settings: &SettingsBlock) -> Result<(), SettingsError> {
        settings.validate()?;
        if self.fail_saves {
            return Err(SettingsError::Storage(StorageError::Full));
        }
        self.saved.lock().unwrap().push(settings.clone());
        Ok(())
    }
}

// ── Log store ─────────────────────────────────────────────────

/// In-memory log file.  Raw lines, so tests can plant corrupt ones.
#[derive(Clone, Default)]
pub struct MemLog {
    pub lines: Arc<Mutex<Vec<String>>>,
}

#[allow(dead_code)]
impl MemLog {
    pub fn with_lines(lines: &[&str]) -> Self {
        let log = Self::default();
        log.lines
            .lock()
            .unwrap()
            .extend(lines.iter().map(|l| (*l).to_string()));
        log
    }

    pub fn len(&self) -> usize {
        self.lines.lock().unwrap().len()
    }
}

impl LogPort for MemLog {
    fn read_lines(&self) -> Result<LogLines, LogError> {
        let snapshot = self.lines.lock().unwrap().clone();
        Ok(Box::new(
            snapshot
                .into_iter()
                .map(|line| Ok::<_, io::Error>(line.into_bytes())),
        ))
    }

    fn erase(&mut self) -> Result<(), LogError> {
        self.lines.lock().unwrap().clear();
        Ok(())
    }

    fn append(&mut self, entry: &Value) -> Result<(), LogError> {
        let line = serde_json::to_string(entry)?;
        self.lines.lock().unwrap().push(line);
        Ok(())
    }
}

// ── Reboot ────────────────────────────────────────────────────

#[derive(Clone, Default)]
pub struct RecordingReboot {
    pub count: Arc<AtomicUsize>,
}

#[allow(dead_code)]
impl RecordingReboot {
    pub fn reboots(&self) -> usize {
        self.count.load(Ordering::SeqCst)
    }
}

impl RebootPort for RecordingReboot {
    fn reboot(&self) {
        self.count.fetch_add(1, Ordering::SeqCst);
    }
}

// ── Transport ─────────────────────────────────────────────────

/// Replays scripted reads, then reports end of input.  Writes are
/// collected in a shared buffer.
#[derive(Clone, Default)]
pub struct ScriptedTransport {
    pub reads: Arc<Mutex<VecDeque<Vec<u8>>>>,
    pub written: Arc<Mutex<Vec<u8>>>,
}

#[allow(dead_code)]
impl ScriptedTransport {
    /// One read per line, each terminated with `\r\n`.
    pub fn with_lines(lines: &[&str]) -> Self {
        let t = Self::default();
        t.reads
            .lock()
            .unwrap()
            .extend(lines.iter().map(|l| format!("{}\r\n", l).into_bytes()));
        t
    }

    pub fn push_read(&self, bytes: Vec<u8>) {
        self.reads.lock().unwrap().push_back(bytes);
    }

    /// Written output as JSON objects, one per `\r\n`-terminated line.
    pub fn written_json(&self) -> Vec<Value> {
        let text = String::from_utf8(self.written.lock().unwrap().clone()).unwrap();
        text.split_terminator("\r\n")
            .map(|l| serde_json::from_str(l).unwrap())
            .collect()
    }
}

impl Transport for ScriptedTransport {
    fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
        let mut reads = self.reads.lock().unwrap();
        let Some(mut chunk) = reads.pop_front() else {
            return Ok(0);
        };
        let n = chunk.len().min(buf.len());
        buf[..n].copy_from_slice(&chunk[..n]);
        if n < chunk.len() {
            reads.push_front(chunk.split_off(n));
        }
        Ok(n)
    }

    fn write(&mut self, data: &[u8]) -> io::Result<usize> {
        self.written.lock().unwrap().extend_from_slice(data);
        Ok(data.len())
    }

    fn flush(&mut self) -> io::Result<()> {
        Ok(())
    }
}

// ── Harness ───────────────────────────────────────────────────

pub type TestDispatcher = Dispatcher<MockSettings, MemLog>;

/// A dispatcher plus handles on everything it touches.
pub struct Harness {
    pub dispatcher: TestDispatcher,
    pub store: MockSettings,
    pub log: MemLog,
    pub device: Arc<DeviceState>,
    pub serial: Arc<SerialMailbox>,
    pub frames: Arc<FrameMailbox>,
}

#[allow(dead_code)]
impl Harness {
    pub fn new() -> Self {
        Self::with_parts(MockSettings::default(), MemLog::default())
    }

    pub fn with_parts(store: MockSettings, log: MemLog) -> Self {
        let device = Arc::new(DeviceState::new());
        let serial = Arc::new(SerialMailbox::new());
        let frames = Arc::new(FrameMailbox::new());
        let dispatcher = Dispatcher::new(
            SettingsBlock::default(),
            store.clone(),
            log.clone(),
            Arc::clone(&device),
            Arc::clone(&serial),
            Arc::clone(&frames),
        );
        Self {
            dispatcher,
            store,
            log,
            device,
            serial,
            frames,
        }
    }

    /// Move the node to `mode` through the legal transitions.
    pub fn boot_to(&self, mode: DeviceMode) {
        let mut current = self.device.mode();
        while current < mode {
            let next = current.next().unwrap();
            self.device.advance(next).unwrap();
            current = next;
        }
    }

    /// Everything queued for the serial link so far.
    pub fn drain(&self) -> Vec<Value> {
        drain(&self.serial)
    }
}

pub fn drain(serial: &SerialMailbox) -> Vec<Value> {
    std::iter::from_fn(|| serial.try_dequeue())
        .map(|line| serde_json::from_str(&line).unwrap())
        .collect()
}
