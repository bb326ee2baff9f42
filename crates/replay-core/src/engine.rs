//! Bus transaction sequencing over the two-phase clock.
//!
//! The engine owns the packed input word and the clock driver. Register
//! accesses assert chip-select across a full phase pair and therefore
//! consume one bus cycle as a side effect; the replay driver accounts for
//! that cycle through the skip-cycle flag. Port and pin accesses only
//! mutate or sample bus state and take effect on the next stepped cycle.

use crate::bus::BusIn;
use crate::clock::ClockDriver;
use crate::device::{CiaCore, CiaModel};
use crate::signal::{InputPin, OutputPin, Port};

/// Immutable replay configuration fixed at power-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct ReplayConfig {
    /// Chip variant to select on the device model.
    pub model: CiaModel,
    /// Generated time-of-day signal frequency in Hz; 0 disables it.
    pub tod_frequency_hz: u64,
}

/// Drives bus transactions against a device model.
#[derive(Debug)]
pub struct BusEngine {
    bus: BusIn,
    clock: ClockDriver,
}

impl BusEngine {
    /// Powers the device up: selects the chip variant, releases the
    /// active-low control lines, then holds reset across one full bus cycle
    /// before releasing it.
    pub fn power_on<D: CiaCore>(device: &mut D, config: &ReplayConfig) -> Self {
        let mut engine = Self {
            bus: BusIn::released(),
            clock: ClockDriver::new(config.tod_frequency_hz),
        };

        device.set_model(config.model);
        device.set_clk(false);
        device.set_reset(false);
        device.drive(engine.bus);

        device.set_reset(true);
        engine.step_cycle(device);
        device.set_reset(false);

        engine
    }

    /// Advances the device by one full bus cycle.
    pub fn step_cycle<D: CiaCore>(&mut self, device: &mut D) {
        self.clock.step_cycle(&mut self.bus, device);
    }

    /// Reads a register across one bus cycle and returns the data byte
    /// sampled during the high phase.
    pub fn read_register<D: CiaCore>(&mut self, device: &mut D, addr: u8) -> u8 {
        self.bus.set_address(addr);
        self.bus.set_chip_select(true);
        self.bus.set_write_enable(false);

        self.clock.phase_high(&mut self.bus, device);
        let value = device.bus_out().data();
        self.clock.phase_low(&mut self.bus, device);

        self.bus.set_chip_select(false);
        value
    }

    /// Writes a register across one bus cycle.
    pub fn write_register<D: CiaCore>(&mut self, device: &mut D, addr: u8, value: u8) {
        self.bus.set_address(addr);
        self.bus.set_data(value);
        self.bus.set_chip_select(true);
        self.bus.set_write_enable(true);

        self.step_cycle(device);

        self.bus.set_chip_select(false);
        self.bus.set_write_enable(false);
    }

    /// Samples a port at pin level: driven bits read back the device's
    /// driver byte, released bits read high.
    #[must_use]
    pub fn read_port<D: CiaCore>(&self, device: &D, port: Port) -> u8 {
        let out = device.bus_out();
        out.port(port) | !out.ddr(port)
    }

    /// Applies an external byte to a port. Bits the device drives as
    /// outputs keep the device's level; the latched byte is returned.
    pub fn write_port<D: CiaCore>(&mut self, device: &mut D, port: Port, value: u8) -> u8 {
        let out = device.bus_out();
        let ddr = out.ddr(port);
        let latched = (out.port(port) & ddr) | (value & !ddr);
        self.bus.set_port(port, latched);
        latched
    }

    /// Samples an output pin.
    #[must_use]
    pub fn read_pin<D: CiaCore>(&self, device: &D, pin: OutputPin) -> bool {
        device.bus_out().pin(pin)
    }

    /// Applies a level to an input pin. The shared serial and counter lines
    /// are pulled down by whichever side drives low, so the applied level
    /// is the AND of the external level and the device's own driver bit.
    pub fn write_pin<D: CiaCore>(&mut self, device: &mut D, pin: InputPin, level: bool) {
        let applied = match pin {
            InputPin::Sp => level && device.bus_out().pin(OutputPin::Sp),
            InputPin::Cnt => level && device.bus_out().pin(OutputPin::Cnt),
            InputPin::Tod | InputPin::Flag | InputPin::Res => level,
        };
        self.bus.set_pin(pin, applied);
    }
}
