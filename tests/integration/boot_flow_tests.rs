//! End-to-end tests: bytes in → receive loop → dispatcher → transmit
//! thread → bytes out, with the boot sequence driving the device mode.

use std::sync::Arc;
use std::thread;
use std::time::Duration;

use meshnode::adapters::flash::FlashStore;
use meshnode::adapters::log_file::LogFile;
use meshnode::app::ports::{LogPort, SettingsPort};
use meshnode::fsm::boot::{BootSequence, BootTiming, restore_settings};
use meshnode::fsm::{DeviceMode, DeviceState};
use meshnode::rpc::channels::{FrameMailbox, SerialMailbox};
use meshnode::rpc::engine::{Dispatcher, Flow};
use meshnode::rpc::io_task::{self, RxExit};
use meshnode::settings::SettingsBlock;

use super::mock_ports::{Harness, MockSettings, RecordingReboot, ScriptedTransport};

const GRACE: Duration = Duration::from_millis(10);

fn fast_timing() -> BootTiming {
    BootTiming {
        management_dwell: Duration::from_millis(20),
        hold_poll_interval: Duration::from_millis(10),
    }
}

/// Run `input` through a full receive/transmit pair and return what was
/// written to the link.
fn run_link(h: &mut Harness, input: ScriptedTransport, reboot: &RecordingReboot) -> (RxExit, ScriptedTransport) {
    let output = ScriptedTransport::default();
    io_task::spawn_tx(Arc::clone(&h.serial), output.clone()).unwrap();
    let exit = io_task::run_rx(input, &mut h.dispatcher, reboot, &h.serial, GRACE).unwrap();
    assert!(io_task::wait_drained(&h.serial, Duration::from_secs(2)));
    thread::sleep(Duration::from_millis(50));
    (exit, output)
}

#[test]
fn commands_flow_through_the_link_until_input_closes() {
    let mut h = Harness::new();
    h.boot_to(DeviceMode::Running);
    let reboot = RecordingReboot::default();
    let input = ScriptedTransport::with_lines(&[
        r#"{"Type":"Put Setting","Setting":"Mode","Mode":"RELAY"}"#,
        "garbage",
        r#"{"Type":"Get Status"}"#,
    ]);

    let (exit, output) = run_link(&mut h, input, &reboot);

    assert_eq!(exit, RxExit::InputClosed);
    assert_eq!(reboot.reboots(), 0);
    let out = output.written_json();
    assert_eq!(out.len(), 3);
    assert_eq!(out[0]["Mode"], "RELAY");
    assert_eq!(out[1]["Error"], "MalformedInput");
    assert_eq!(out[2]["Status"], "RUNNING");
}

#[test]
fn reboot_flushes_status_then_restarts() {
    let mut h = Harness::new();
    h.boot_to(DeviceMode::Running);
    let reboot = RecordingReboot::default();
    let input = ScriptedTransport::with_lines(&[
        r#"{"Type":"Reboot"}"#,
        r#"{"Type":"Get Status"}"#,
    ]);

    let (exit, output) = run_link(&mut h, input, &reboot);

    assert_eq!(exit, RxExit::Rebooted);
    assert_eq!(reboot.reboots(), 1);
    let out = output.written_json();
    assert_eq!(out.len(), 1, "nothing after Reboot is executed");
    assert_eq!(out[0]["Type"], "Status");
}

#[test]
fn line_split_across_reads_is_reassembled() {
    let mut h = Harness::new();
    let reboot = RecordingReboot::default();
    let input = ScriptedTransport::default();
    input.push_read(br#"{"Type":"Get "#.to_vec());
    input.push_read(b"Settings\"}\r".to_vec());
    input.push_read(b"\n".to_vec());

    let (_, output) = run_link(&mut h, input, &reboot);
    let out = output.written_json();
    assert_eq!(out.len(), 1);
    assert_eq!(out[0]["Type"], "Settings");
}

#[test]
fn overlong_line_is_malformed_and_link_recovers() {
    let mut h = Harness::new();
    let reboot = RecordingReboot::default();
    let input = ScriptedTransport::default();
    let mut long = vec![b'a'; 3000];
    long.extend_from_slice(b"\r\n");
    input.push_read(long);
    input.push_read(b"{\"Type\":\"Get Status\"}\r\n".to_vec());

    let (_, output) = run_link(&mut h, input, &reboot);
    let out = output.written_json();
    assert_eq!(out.len(), 2);
    assert_eq!(out[0]["Error"], "MalformedInput");
    assert_eq!(out[1]["Type"], "Status");
}

#[test]
fn read_log_during_boot_holds_node_in_management() {
    let dir = tempfile::tempdir().unwrap();
    let mut log = LogFile::new(dir.path().join("logfile.json"));
    log.append(&serde_json::json!({"Seq": 1})).unwrap();
    log.append(&serde_json::json!({"Seq": 2})).unwrap();

    let mut store = FlashStore::mount(dir.path()).unwrap();
    let settings = restore_settings(&mut store);

    let device = Arc::new(DeviceState::new());
    let serial = Arc::new(SerialMailbox::new());
    let frames = Arc::new(FrameMailbox::new());
    let mut dispatcher = Dispatcher::new(
        settings,
        store,
        log,
        Arc::clone(&device),
        Arc::clone(&serial),
        frames,
    );

    let output = ScriptedTransport::default();
    io_task::spawn_tx(Arc::clone(&serial), output.clone()).unwrap();

    // Command arrives while still BOOTING.
    let reboot = RecordingReboot::default();
    let rx = {
        let serial = Arc::clone(&serial);
        let reboot = reboot.clone();
        thread::spawn(move || {
            let input = ScriptedTransport::with_lines(&[r#"{"Type":"Read Log"}"#]);
            io_task::run_rx(input, &mut dispatcher, &reboot, &serial, GRACE).unwrap()
        })
    };
    thread::sleep(Duration::from_millis(30));
    assert!(!rx.is_finished());

    let boot = BootSequence::new(Arc::clone(&device), fast_timing());
    boot.enter_management().unwrap();
    let window = thread::spawn(move || boot.run_management_window());

    assert_eq!(rx.join().unwrap(), RxExit::Rebooted);
    assert_eq!(reboot.reboots(), 1);

    // Well past the dwell, the latch keeps the node in MANAGEMENT.
    thread::sleep(Duration::from_millis(100));
    assert_eq!(device.mode(), DeviceMode::Management);
    assert!(!window.is_finished());

    let out = output.written_json();
    assert_eq!(out.len(), 3);
    assert_eq!(out[0]["Type"], "Log Entry");
    assert_eq!(out[0]["Seq"], 1);
    assert_eq!(out[1]["Seq"], 2);
    assert_eq!(out[2]["Status"], "MANAGEMENT");

    device.release_hold();
    window.join().unwrap().unwrap();
    assert_eq!(device.mode(), DeviceMode::Running);
}

#[test]
fn settings_written_over_the_link_survive_a_remount() {
    let dir = tempfile::tempdir().unwrap();
    let mut store = FlashStore::mount(dir.path()).unwrap();
    let settings = restore_settings(&mut store);

    let device = Arc::new(DeviceState::new());
    let serial = Arc::new(SerialMailbox::new());
    let mut dispatcher = Dispatcher::new(
        settings,
        store,
        LogFile::new(dir.path().join("logfile.json")),
        device,
        Arc::clone(&serial),
        Arc::new(FrameMailbox::new()),
    );
    dispatcher.handle_line(r#"{"Type":"Put Setting","Setting":"BW","BW":250}"#);
    assert_eq!(serial.try_dequeue().map(|l| l.contains("\"BW\":250")), Some(true));

    let remounted = FlashStore::mount(dir.path()).unwrap();
    assert_eq!(remounted.load_settings().unwrap().bandwidth, 250);
}

#[test]
fn read_log_skips_damaged_bytes_on_flash() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("logfile.json");
    let mut raw = b"{\"Seq\":1}\n{\"Seq\":\xff}\n".to_vec();
    raw.extend(std::iter::repeat_n(b'z', 10_000));
    raw.extend_from_slice(b"\n{\"Seq\":3}\r\n");
    std::fs::write(&path, raw).unwrap();

    let device = Arc::new(DeviceState::new());
    device.advance(DeviceMode::Management).unwrap();
    let serial = Arc::new(SerialMailbox::new());
    let mut dispatcher = Dispatcher::new(
        SettingsBlock::default(),
        MockSettings::default(),
        LogFile::new(&path),
        device,
        Arc::clone(&serial),
        Arc::new(FrameMailbox::new()),
    );

    assert_eq!(dispatcher.handle_line(r#"{"Type":"Read Log"}"#), Flow::Reboot);

    let out = super::mock_ports::drain(&serial);
    assert_eq!(out.len(), 3);
    assert_eq!(out[0], serde_json::json!({"Type": "Log Entry", "Seq": 1}));
    assert_eq!(out[1], serde_json::json!({"Type": "Log Entry", "Seq": 3}));
    assert_eq!(out[2]["Status"], "MANAGEMENT");
}
