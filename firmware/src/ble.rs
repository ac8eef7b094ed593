use defmt::{info, unwrap, warn};
use embassy_executor::Spawner;
use healthful_ui::settings::{parse_flag, DateStyle, TimeStyle};
use heapless::Vec;
use static_cell::StaticCell;
use trouble_host::attribute::Characteristic;
use trouble_host::gatt::GattEvent;
use trouble_host::prelude::*;

/// Size of L2CAP packets (ATT MTU is this - 4)
pub const L2CAP_MTU: usize = 27;
pub const L2CAP_TXQ: u8 = 3;
pub const L2CAP_RXQ: u8 = 3;
const CONNECTIONS_MAX: usize = 1;
const L2CAP_CHANNELS_MAX: usize = 2; // Signal + att

// Longest accepted write is the literal "false".
const SETTING_LEN: usize = 8;

type NrfController = nrf_sdc::SoftdeviceController<'static>;

/// Connection and configuration changes fed to the main loop.
#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum Event {
    Connected,
    Disconnected,
    Setting(SettingChange),
}

#[derive(Debug, Clone, Copy, defmt::Format)]
pub enum SettingChange {
    TimeStyle(TimeStyle),
    DateStyle(DateStyle),
    Heart(bool),
}

#[gatt_service(uuid = "be5e0001-6d0a-4e50-9a4e-c713c2d9f9d6")]
pub struct SettingsService {
    /// "true" selects 12-hour time, "false" 24-hour.
    #[characteristic(uuid = "be5e0002-6d0a-4e50-9a4e-c713c2d9f9d6", write)]
    hour_format: Vec<u8, SETTING_LEN>,

    /// "true" selects month-day ordering, "false" day-month.
    #[characteristic(uuid = "be5e0003-6d0a-4e50-9a4e-c713c2d9f9d6", write)]
    date_order: Vec<u8, SETTING_LEN>,

    /// Persisted but not consumed by the face yet.
    #[characteristic(uuid = "be5e0004-6d0a-4e50-9a4e-c713c2d9f9d6", write)]
    heart: Vec<u8, SETTING_LEN>,
}

#[gatt_server]
pub struct WatchServer {
    settings: SettingsService,
}

impl WatchServer<'_, '_, NrfController> {
    /// Map a characteristic write to a setting change. Writes that are not
    /// one of the recognized literals are dropped.
    fn setting_written(&self, handle: u16) -> Option<SettingChange> {
        if handle == self.settings.hour_format.handle {
            let raw = unwrap!(self.get(&self.settings.hour_format));
            parse_flag(&raw).map(|twelve_hour| {
                SettingChange::TimeStyle(if twelve_hour { TimeStyle::H12 } else { TimeStyle::H24 })
            })
        } else if handle == self.settings.date_order.handle {
            let raw = unwrap!(self.get(&self.settings.date_order));
            parse_flag(&raw).map(|month_first| {
                SettingChange::DateStyle(if month_first {
                    DateStyle::MonthDay
                } else {
                    DateStyle::DayMonth
                })
            })
        } else if handle == self.settings.heart.handle {
            let raw = unwrap!(self.get(&self.settings.heart));
            parse_flag(&raw).map(SettingChange::Heart)
        } else {
            None
        }
    }
}

type BleResources = HostResources<NrfController, CONNECTIONS_MAX, L2CAP_CHANNELS_MAX, L2CAP_MTU>;
static RESOURCES: StaticCell<BleResources> = StaticCell::new();

fn ble_addr() -> Address {
    let ficr = embassy_nrf::pac::FICR;
    let high = u64::from((ficr.deviceaddr(1).read() & 0x0000ffff) | 0x0000c000);
    let addr = high << 32 | u64::from(ficr.deviceaddr(0).read());
    Address::random(unwrap!(addr.to_le_bytes()[..6].try_into()))
}

pub fn start(spawner: Spawner, controller: NrfController) {
    let resources = RESOURCES.init(BleResources::new(PacketQos::None));
    let (stack, peripheral, _, runner) = trouble_host::new(controller, resources)
        .set_random_address(ble_addr())
        .build();

    let gatt = unwrap!(WatchServer::new_with_config(
        stack,
        GapConfig::Peripheral(PeripheralConfig {
            name: "Healthful",
            appearance: &appearance::power_device::GENERIC_POWER_DEVICE,
        }),
    ));
    static SERVER: StaticCell<WatchServer<'static, 'static, NrfController>> = StaticCell::new();
    let server = SERVER.init(gatt);

    spawner.must_spawn(ble_task(runner));
    spawner.must_spawn(gatt_task(server));
    spawner.must_spawn(advertise_task(stack, peripheral, server));
}

#[embassy_executor::task]
async fn ble_task(mut runner: Runner<'static, NrfController>) {
    unwrap!(runner.run().await);
}

#[embassy_executor::task]
async fn gatt_task(server: &'static WatchServer<'_, '_, NrfController>) {
    unwrap!(server.run().await);
}

#[embassy_executor::task]
async fn advertise_task(
    stack: Stack<'static, NrfController>,
    mut peripheral: Peripheral<'static, NrfController>,
    server: &'static WatchServer<'_, '_, NrfController>,
) {
    let mut advertiser_data = [0; 31];
    unwrap!(AdStructure::encode_slice(
        &[
            AdStructure::Flags(LE_GENERAL_DISCOVERABLE | BR_EDR_NOT_SUPPORTED),
            AdStructure::ServiceUuids16(&[Uuid::Uuid16([0x0f, 0x18])]),
            AdStructure::CompleteLocalName(b"Healthful"),
        ],
        &mut advertiser_data[..],
    ));
    let mut advertiser = unwrap!(
        peripheral
            .advertise(
                &Default::default(),
                Advertisement::ConnectableScannableUndirected {
                    adv_data: &advertiser_data[..],
                    scan_data: &[],
                },
            )
            .await
    );
    loop {
        match advertiser.accept().await {
            Ok(conn) => process(stack, conn, server).await,
            Err(e) => {
                warn!("Error advertising: {:?}", e);
            }
        }
    }
}

async fn process(
    stack: Stack<'static, NrfController>,
    connection: Connection<'static>,
    server: &'static WatchServer<'_, '_, NrfController>,
) {
    info!("Phone connected");
    crate::EVENTS.send(Event::Connected).await;

    // Pick up wall clock time from the peer.
    let s = Spawner::for_current_executor().await;
    s.must_spawn(sync_time(stack, connection.clone()));

    loop {
        match connection.next().await {
            ConnectionEvent::Disconnected { reason: _ } => {
                break;
            }
            ConnectionEvent::Gatt { event, .. } => {
                if let GattEvent::Write { value_handle } = event {
                    if let Some(change) = server.setting_written(value_handle) {
                        info!("Setting changed: {:?}", change);
                        crate::EVENTS.send(Event::Setting(change)).await;
                    }
                }
            }
        }
    }

    info!("Phone disconnected");
    crate::EVENTS.send(Event::Disconnected).await;
}

#[embassy_executor::task]
async fn sync_time(stack: Stack<'static, NrfController>, conn: Connection<'static>) {
    info!("Synchronizing time, creating gatt client");
    let client = unwrap!(GattClient::<_, 10, 24>::new(stack, &conn).await);

    info!("Discovering time service");
    let services = unwrap!(client.services_by_uuid(&Uuid::new_short(0x1805)).await);
    let Some(service) = services.first().cloned() else {
        info!("Peer has no time service");
        return;
    };

    info!("Looking for value handle");
    let c: Characteristic<u8> = unwrap!(client.characteristic_by_uuid(&service, &Uuid::new_short(0x2a2b)).await);

    info!("Reading characteristic");
    let mut data = [0; 10];
    unwrap!(client.read_characteristic(&c, &mut data[..]).await);

    if let Some(time) = parse_time(data) {
        crate::CLOCK.set(time);
    }
}

fn parse_time(data: [u8; 10]) -> Option<time::PrimitiveDateTime> {
    let year = u16::from_le_bytes([data[0], data[1]]);
    let month = data[2];
    let day = data[3];
    let hour = data[4];
    let minute = data[5];
    let second = data[6];
    let _weekday = data[7];
    let secs_frac = data[8];

    if let Ok(month) = month.try_into() {
        let date = time::Date::from_calendar_date(year as i32, month, day);
        let micros = secs_frac as u32 * 1000000 / 256;
        let time = time::Time::from_hms_micro(hour, minute, second, micros);
        if let (Ok(time), Ok(date)) = (time, date) {
            let dt = time::PrimitiveDateTime::new(date, time);
            return Some(dt);
        }
    }
    None
}
