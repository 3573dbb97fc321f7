//! Hardware assembly: build every configured device into a `Fleet`.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use crossbeam_channel::Sender;
use eyre::WrapErr;
use reckon_config::Config;
use reckon_core::hw_error::map_hw_error;
use reckon_core::{
    DeviceId, DynDrive, DynValve, Fleet, SlotCfg, TimingCfg, TravelCfg, Valve, ValveCfg,
    build_actuator,
};
use reckon_hardware::{SimulatedDrive, SimulatedSwitch, WearLevelStore};
use reckon_traits::{Clock, SwitchOutput};

use crate::events::{ChannelSink, StatusEvent};

pub type SharedStore = Arc<Mutex<WearLevelStore>>;

/// Which outputs the devices drive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Backend {
    Simulated,
    #[cfg(feature = "hardware")]
    Gpio,
}

impl Backend {
    /// GPIO when built with `hardware`, otherwise simulated outputs.
    pub fn live() -> Self {
        #[cfg(feature = "hardware")]
        {
            Backend::Gpio
        }
        #[cfg(not(feature = "hardware"))]
        {
            Backend::Simulated
        }
    }
}

pub struct Assembly {
    pub fleet: Fleet,
    pub names: HashMap<String, DeviceId>,
}

impl Assembly {
    pub fn id(&self, name: &str) -> eyre::Result<DeviceId> {
        lookup(&self.names, name)
    }
}

pub fn lookup(names: &HashMap<String, DeviceId>, name: &str) -> eyre::Result<DeviceId> {
    names.get(name).copied().ok_or_else(|| {
        eyre::Report::new(reckon_core::ReckonError::State(format!(
            "unknown device {name:?}"
        )))
    })
}

/// File-backed store when `persistent` and a path is configured, else an
/// erased in-memory image.
pub fn open_store(cfg: &reckon_config::StorageCfg, persistent: bool) -> eyre::Result<SharedStore> {
    let store = match cfg.path.as_deref() {
        Some(path) if persistent => {
            WearLevelStore::open(std::path::Path::new(path), cfg.size_bytes, cfg.slots_per_key)
                .map_err(|e| eyre::Report::new(map_hw_error(&e)))
                .wrap_err_with(|| format!("open position store {path}"))?
        }
        _ => WearLevelStore::new(cfg.size_bytes, cfg.slots_per_key)
            .map_err(|e| eyre::Report::new(map_hw_error(&e)))?,
    };
    Ok(Arc::new(Mutex::new(store)))
}

pub fn assemble<C>(
    cfg: &Config,
    backend: Backend,
    store: &SharedStore,
    events: &Sender<StatusEvent>,
    clock: &C,
) -> eyre::Result<Assembly>
where
    C: Clock + Clone + Send + 'static,
{
    let mut fleet = Fleet::new();
    let mut names = HashMap::new();

    for cover in &cfg.covers {
        let drive = drive_for(cover, backend)?;
        let sink = ChannelSink::new(&cover.name, clock.clone(), events.clone());
        let actuator = build_actuator(
            drive,
            TravelCfg::from(cover),
            TimingCfg::for_cover(&cfg.timing, cover),
            SlotCfg::from(cover),
            Some(Box::new(Arc::clone(store))),
            Some(Box::new(sink)),
        )
        .wrap_err_with(|| format!("build cover {:?}", cover.name))?;
        tracing::info!(
            device = %cover.name,
            position_pct = actuator.current_percent(),
            tilt_pct = ?actuator.current_tilt_percent(),
            "cover ready"
        );
        names.insert(cover.name.clone(), fleet.add_actuator(actuator));
    }

    for valve in &cfg.valves {
        let output = switch_for(valve, backend)?;
        let sink = ChannelSink::new(&valve.name, clock.clone(), events.clone());
        let built: DynValve = Valve::new(output, ValveCfg::from(valve))
            .wrap_err_with(|| format!("build valve {:?}", valve.name))?
            .with_sink(Box::new(sink));
        tracing::info!(device = %valve.name, state = ?built.state(), "valve ready");
        names.insert(valve.name.clone(), fleet.add_valve(built));
    }

    Ok(Assembly { fleet, names })
}

fn drive_for(cover: &reckon_config::CoverCfg, backend: Backend) -> eyre::Result<DynDrive> {
    match backend {
        Backend::Simulated => Ok(Box::new(SimulatedDrive::new(&cover.name))),
        #[cfg(feature = "hardware")]
        Backend::Gpio => {
            let drive = reckon_hardware::GpioDrive::new(cover.forward_pin, cover.reverse_pin)
                .map_err(|e| eyre::Report::new(map_hw_error(&e)))
                .wrap_err_with(|| format!("open drive pins for {:?}", cover.name))?;
            Ok(Box::new(drive))
        }
    }
}

fn switch_for(
    valve: &reckon_config::ValveCfg,
    backend: Backend,
) -> eyre::Result<Box<dyn SwitchOutput + Send>> {
    match backend {
        Backend::Simulated => Ok(Box::new(SimulatedSwitch::new(&valve.name))),
        #[cfg(feature = "hardware")]
        Backend::Gpio => {
            let switch = reckon_hardware::GpioSwitch::new(valve.pin)
                .map_err(|e| eyre::Report::new(map_hw_error(&e)))
                .wrap_err_with(|| format!("open valve pin for {:?}", valve.name))?;
            Ok(Box::new(switch))
        }
    }
}
