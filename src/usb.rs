use embassy_stm32::peripherals::{PA11, PA12, USB_OTG_FS};
use embassy_stm32::usb_otg::{self, Driver};
use embassy_stm32::{bind_interrupts, peripherals};
use embassy_usb::class::cdc_acm::{CdcAcmClass, State};
use embassy_usb::{Builder, Config, UsbDevice};
use static_cell::StaticCell;

bind_interrupts!(pub struct Irqs {
    OTG_FS => usb_otg::InterruptHandler<peripherals::USB_OTG_FS>;
});

pub type UsbDriver = Driver<'static, USB_OTG_FS>;
pub type UsbSerial = CdcAcmClass<'static, UsbDriver>;

const MAX_PACKET: u16 = 64;

static EP_OUT_BUF: StaticCell<[u8; 256]> = StaticCell::new();
static CONFIG_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static BOS_DESC: StaticCell<[u8; 256]> = StaticCell::new();
static CONTROL_BUF: StaticCell<[u8; 64]> = StaticCell::new();
static CDC_STATE: StaticCell<State<'static>> = StaticCell::new();

#[embassy_executor::task]
pub async fn usb_task(mut device: UsbDevice<'static, UsbDriver>) -> ! {
    device.run().await
}

/// CDC-ACM serial used for the per-cycle diagnostic lines. Call once.
pub fn init(
    otg: USB_OTG_FS,
    dp: PA12,
    dm: PA11,
) -> (UsbDevice<'static, UsbDriver>, UsbSerial) {
    let mut otg_config = usb_otg::Config::default();
    otg_config.vbus_detection = false;
    let driver = Driver::new_fs(otg, Irqs, dp, dm, EP_OUT_BUF.init([0; 256]), otg_config);

    let mut config = Config::new(0xc0de, 0xcafe);
    config.manufacturer = Some("hall-velocity-regulator");
    config.product = Some("Motor velocity regulator");
    config.serial_number = Some("00000001");
    config.max_packet_size_0 = MAX_PACKET as u8;

    let mut builder = Builder::new(
        driver,
        config,
        CONFIG_DESC.init([0; 256]),
        BOS_DESC.init([0; 256]),
        &mut [], // msos_descs
        CONTROL_BUF.init([0; 64]),
    );

    let class = CdcAcmClass::new(&mut builder, CDC_STATE.init(State::new()), MAX_PACKET);
    (builder.build(), class)
}
