use core::fmt::Write;

use embassy_executor::task;
use embassy_sync::blocking_mutex::raw::CriticalSectionRawMutex;
use embassy_sync::channel::Receiver;

use hall_velocity_regulator::regulator::diagnostic_line;

use crate::state::Telemetry;
use crate::usb::UsbSerial;
use crate::TELEMETRY_DEPTH;

const USB_DEBUG_ENABLED: bool = true;

/// Telemetry task: one USB line per message from the control and range tasks.
/// Lines are dropped while no host has the port open.
#[task]
pub async fn telemetry_task(
    mut usb_serial: UsbSerial,
    telemetry_rx: Receiver<'static, CriticalSectionRawMutex, Telemetry, TELEMETRY_DEPTH>,
) {
    loop {
        let msg = telemetry_rx.receive().await;

        let mut m = heapless::String::<64>::new();
        match msg {
            Telemetry::Cycle(obs) => {
                let _ = m.push_str(&diagnostic_line(&obs));
            }
            Telemetry::Skipped(e) => {
                let _ = write!(m, "[SKIP] {}", e);
            }
            Telemetry::Range(Some(cm)) => {
                let _ = write!(m, "Distance: {:.1} cm", cm);
            }
            Telemetry::Range(None) => {
                let _ = m.push_str("Distance: no echo");
            }
        }
        let _ = m.push_str("\r\n");

        if USB_DEBUG_ENABLED && usb_serial.dtr() {
            let _ = usb_serial.write_packet(m.as_bytes()).await;
        }
    }
}
