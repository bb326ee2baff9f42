//! Packed bus-state words exchanged with the simulated device.
//!
//! The external bus is modeled as two packed 64-bit words: one the engine
//! drives into the device, one the device produces. All field access goes
//! through named accessors; no caller manipulates raw shifts.
//!
//! `BusIn` layout (engine → device):
//!
//! | Bits  | Field                         |
//! |-------|-------------------------------|
//! | 0     | SP input pin                  |
//! | 1     | CNT input pin                 |
//! | 2     | TOD input pin                 |
//! | 3     | FLAG input pin                |
//! | 4-11  | Port B drive byte             |
//! | 12-19 | Port A drive byte             |
//! | 20-27 | Write data                    |
//! | 28-31 | Register address              |
//! | 32    | /W (low = write)              |
//! | 33    | /CS (low = selected)          |
//! | 34    | /RES (low = reset)            |
//! | 35    | PHI2 clock phase              |
//!
//! `BusOut` layout (device → engine):
//!
//! | Bits  | Field                         |
//! |-------|-------------------------------|
//! | 0     | /IRQ (low = asserted)         |
//! | 1     | SP output pin                 |
//! | 2     | CNT output pin                |
//! | 3     | PC output pin                 |
//! | 4-11  | DDRB                          |
//! | 12-19 | Port B driver byte            |
//! | 20-27 | DDRA                          |
//! | 28-35 | Port A driver byte            |
//! | 36-43 | Read data                     |

#![allow(clippy::cast_lossless, clippy::cast_possible_truncation)]

use crate::signal::{InputPin, OutputPin, Port};

const IN_PB_SHIFT: u32 = 4;
const IN_PA_SHIFT: u32 = 12;
const IN_DATA_SHIFT: u32 = 20;
const IN_ADDR_SHIFT: u32 = 28;
const IN_RW_N: u64 = 1 << 32;
const IN_CS_N: u64 = 1 << 33;
const IN_RES_N: u64 = 1 << 34;
const IN_PHI2: u64 = 1 << 35;

const OUT_IRQ_N: u64 = 1;
const OUT_DDRB_SHIFT: u32 = 4;
const OUT_PB_SHIFT: u32 = 12;
const OUT_DDRA_SHIFT: u32 = 20;
const OUT_PA_SHIFT: u32 = 28;
const OUT_DATA_SHIFT: u32 = 36;

const BYTE: u64 = 0xFF;
const NIBBLE: u64 = 0x0F;

/// Packed input bus word driven into the device.
///
/// Owned exclusively by the transaction engine; every mutation happens
/// through a named setter so the direction-sensitive invariants stay in one
/// place.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusIn(u64);

impl Default for BusIn {
    fn default() -> Self {
        Self::released()
    }
}

impl BusIn {
    /// Returns the idle bus word: everything low except the active-low
    /// control lines /W, /CS and /RES, which rest released.
    #[must_use]
    pub const fn released() -> Self {
        Self(IN_RW_N | IN_CS_N | IN_RES_N)
    }

    /// Returns the raw packed word.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Sets the PHI2 clock-phase bit.
    pub const fn set_phi2(&mut self, high: bool) {
        self.set_bit(IN_PHI2, high);
    }

    /// Returns the PHI2 clock-phase bit.
    #[must_use]
    pub const fn phi2(self) -> bool {
        self.0 & IN_PHI2 != 0
    }

    /// Sets the active-low chip-select line. `selected` drives it low.
    pub const fn set_chip_select(&mut self, selected: bool) {
        self.set_bit(IN_CS_N, !selected);
    }

    /// Returns `true` while the active-low chip-select line is asserted.
    #[must_use]
    pub const fn chip_selected(self) -> bool {
        self.0 & IN_CS_N == 0
    }

    /// Sets the active-low write-direction line. `write` drives it low.
    pub const fn set_write_enable(&mut self, write: bool) {
        self.set_bit(IN_RW_N, !write);
    }

    /// Returns `true` while the active-low write-direction line is asserted.
    #[must_use]
    pub const fn write_enabled(self) -> bool {
        self.0 & IN_RW_N == 0
    }

    /// Sets the active-low reset line. `active` drives it low.
    pub const fn set_reset(&mut self, active: bool) {
        self.set_bit(IN_RES_N, !active);
    }

    /// Sets the 4-bit register address field.
    pub const fn set_address(&mut self, addr: u8) {
        self.0 = (self.0 & !(NIBBLE << IN_ADDR_SHIFT)) | ((addr as u64 & NIBBLE) << IN_ADDR_SHIFT);
    }

    /// Returns the register address field.
    #[must_use]
    pub const fn address(self) -> u8 {
        (self.0 >> IN_ADDR_SHIFT) as u8 & 0x0F
    }

    /// Sets the 8-bit write-data field.
    pub const fn set_data(&mut self, value: u8) {
        self.0 = (self.0 & !(BYTE << IN_DATA_SHIFT)) | ((value as u64) << IN_DATA_SHIFT);
    }

    /// Returns the write-data field.
    #[must_use]
    pub const fn data(self) -> u8 {
        (self.0 >> IN_DATA_SHIFT) as u8
    }

    /// Sets the drive byte for a port.
    pub const fn set_port(&mut self, port: Port, value: u8) {
        let shift = match port {
            Port::A => IN_PA_SHIFT,
            Port::B => IN_PB_SHIFT,
        };
        self.0 = (self.0 & !(BYTE << shift)) | ((value as u64) << shift);
    }

    /// Returns the drive byte currently applied to a port.
    #[must_use]
    pub const fn port(self, port: Port) -> u8 {
        let shift = match port {
            Port::A => IN_PA_SHIFT,
            Port::B => IN_PB_SHIFT,
        };
        (self.0 >> shift) as u8
    }

    /// Sets an input-pin level. `RES` routes to the /RES control line, where
    /// the trace convention `0` means reset asserted.
    pub const fn set_pin(&mut self, pin: InputPin, level: bool) {
        match pin {
            InputPin::Sp => self.set_bit(1 << 0, level),
            InputPin::Cnt => self.set_bit(1 << 1, level),
            InputPin::Tod => self.set_bit(1 << 2, level),
            InputPin::Flag => self.set_bit(1 << 3, level),
            InputPin::Res => self.set_bit(IN_RES_N, level),
        }
    }

    /// Returns an input-pin level as currently driven.
    #[must_use]
    pub const fn pin(self, pin: InputPin) -> bool {
        match pin {
            InputPin::Sp => self.0 & (1 << 0) != 0,
            InputPin::Cnt => self.0 & (1 << 1) != 0,
            InputPin::Tod => self.0 & (1 << 2) != 0,
            InputPin::Flag => self.0 & (1 << 3) != 0,
            InputPin::Res => self.0 & IN_RES_N != 0,
        }
    }

    const fn set_bit(&mut self, mask: u64, on: bool) {
        if on {
            self.0 |= mask;
        } else {
            self.0 &= !mask;
        }
    }
}

/// Packed output bus word produced by the device. Read-only to the engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct BusOut(u64);

impl BusOut {
    /// Wraps a raw packed word produced by a device model.
    #[must_use]
    pub const fn from_raw(raw: u64) -> Self {
        Self(raw)
    }

    /// Returns the raw packed word.
    #[must_use]
    pub const fn raw(self) -> u64 {
        self.0
    }

    /// Returns `true` while the active-low /IRQ line is asserted.
    #[must_use]
    pub const fn irq_asserted(self) -> bool {
        self.0 & OUT_IRQ_N == 0
    }

    /// Returns an output-pin level.
    #[must_use]
    pub const fn pin(self, pin: OutputPin) -> bool {
        let bit = match pin {
            OutputPin::Irq => 0,
            OutputPin::Sp => 1,
            OutputPin::Cnt => 2,
            OutputPin::Pc => 3,
        };
        (self.0 >> bit) & 1 != 0
    }

    /// Returns the 8-bit read-data field.
    #[must_use]
    pub const fn data(self) -> u8 {
        (self.0 >> OUT_DATA_SHIFT) as u8
    }

    /// Returns the driver byte the device asserts on a port.
    #[must_use]
    pub const fn port(self, port: Port) -> u8 {
        let shift = match port {
            Port::A => OUT_PA_SHIFT,
            Port::B => OUT_PB_SHIFT,
        };
        (self.0 >> shift) as u8
    }

    /// Returns the direction register for a port (`1` = line driven by the
    /// device).
    #[must_use]
    pub const fn ddr(self, port: Port) -> u8 {
        let shift = match port {
            Port::A => OUT_DDRA_SHIFT,
            Port::B => OUT_DDRB_SHIFT,
        };
        (self.0 >> shift) as u8
    }
}

/// Builder for device models assembling an output word from field values.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BusOutBuilder(u64);

impl Default for BusOutBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl BusOutBuilder {
    /// Starts from an all-zero word with /IRQ released (high).
    #[must_use]
    pub const fn new() -> Self {
        Self(OUT_IRQ_N)
    }

    /// Sets the /IRQ line. `asserted` drives it low.
    #[must_use]
    pub const fn irq(mut self, asserted: bool) -> Self {
        if asserted {
            self.0 &= !OUT_IRQ_N;
        } else {
            self.0 |= OUT_IRQ_N;
        }
        self
    }

    /// Sets an output-pin level.
    #[must_use]
    pub const fn pin(mut self, pin: OutputPin, level: bool) -> Self {
        let bit = match pin {
            OutputPin::Irq => 0,
            OutputPin::Sp => 1,
            OutputPin::Cnt => 2,
            OutputPin::Pc => 3,
        };
        if level {
            self.0 |= 1 << bit;
        } else {
            self.0 &= !(1 << bit);
        }
        self
    }

    /// Sets the read-data byte.
    #[must_use]
    pub const fn data(mut self, value: u8) -> Self {
        self.0 = (self.0 & !(BYTE << OUT_DATA_SHIFT)) | ((value as u64) << OUT_DATA_SHIFT);
        self
    }

    /// Sets a port's driver byte.
    #[must_use]
    pub const fn port(mut self, port: Port, value: u8) -> Self {
        let shift = match port {
            Port::A => OUT_PA_SHIFT,
            Port::B => OUT_PB_SHIFT,
        };
        self.0 = (self.0 & !(BYTE << shift)) | ((value as u64) << shift);
        self
    }

    /// Sets a port's direction register.
    #[must_use]
    pub const fn ddr(mut self, port: Port, value: u8) -> Self {
        let shift = match port {
            Port::A => OUT_DDRA_SHIFT,
            Port::B => OUT_DDRB_SHIFT,
        };
        self.0 = (self.0 & !(BYTE << shift)) | ((value as u64) << shift);
        self
    }

    /// Finishes the word.
    #[must_use]
    pub const fn build(self) -> BusOut {
        BusOut(self.0)
    }
}
