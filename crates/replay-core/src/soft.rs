//! Bus-level behavioral stand-in for a synthesized CIA core.
//!
//! `SoftCia` implements the [`CiaCore`] contract far enough to exercise the
//! replay engine end to end: a 16-register file latched through the PHI2
//! protocol, port output and direction registers with tri-state read-back,
//! and an interrupt control register with read-to-clear status, a
//! set/clear mask protocol and an active-low /IRQ derivation. The FLAG
//! input raises ICR bit 4 on a falling edge, which is the one interrupt
//! source visible at the bus boundary.
//!
//! Chip internals (timers, time-of-day counting, serial shift logic) are
//! not modeled; a synthesized core slots in behind the same trait.

use crate::bus::{BusIn, BusOut, BusOutBuilder};
use crate::device::{CiaCore, CiaModel};
use crate::signal::{InputPin, OutputPin, Port};

const REG_PRA: usize = 0x0;
const REG_PRB: usize = 0x1;
const REG_DDRA: usize = 0x2;
const REG_DDRB: usize = 0x3;
const REG_ICR: usize = 0xD;

const ICR_FLAG: u8 = 0x10;
const ICR_SOURCE_MASK: u8 = 0x1F;
const ICR_SET: u8 = 0x80;

/// Behavioral CIA stand-in driven through the packed bus words.
#[derive(Debug, Clone)]
#[allow(clippy::struct_excessive_bools)] // latched line levels, not flags
pub struct SoftCia {
    model: CiaModel,
    reset: bool,
    clk: bool,
    bus: BusIn,

    regs: [u8; 16],
    icr_status: u8,
    icr_mask: u8,
    data_out: u8,

    flag_level: bool,
    access_done: bool,
}

impl Default for SoftCia {
    fn default() -> Self {
        Self::new()
    }
}

impl SoftCia {
    /// Creates a core in its power-on state.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            model: CiaModel::Mos8521,
            reset: false,
            clk: false,
            bus: BusIn::released(),
            regs: [0; 16],
            icr_status: 0,
            icr_mask: 0,
            data_out: 0,
            flag_level: false,
            access_done: false,
        }
    }

    /// Returns the selected chip variant.
    #[must_use]
    pub const fn model(&self) -> CiaModel {
        self.model
    }

    const fn irq_active(&self) -> bool {
        self.icr_status & self.icr_mask & ICR_SOURCE_MASK != 0
    }

    fn read_register(&mut self, addr: usize) -> u8 {
        match addr {
            REG_PRA => self.port_pins(Port::A),
            REG_PRB => self.port_pins(Port::B),
            REG_ICR => {
                let value = self.icr_value();
                self.icr_status = 0;
                value
            }
            _ => self.regs[addr],
        }
    }

    fn write_register(&mut self, addr: usize, value: u8) {
        if addr == REG_ICR {
            // Set/clear protocol: bit 7 selects whether the remaining bits
            // set or clear mask positions.
            if value & ICR_SET != 0 {
                self.icr_mask |= value & ICR_SOURCE_MASK;
            } else {
                self.icr_mask &= !(value & ICR_SOURCE_MASK);
            }
        } else {
            self.regs[addr] = value;
        }
    }

    /// Pin-level port read-back: driven bits show the output register,
    /// input bits show the externally applied level.
    fn port_pins(&self, port: Port) -> u8 {
        let (pr, ddr) = match port {
            Port::A => (self.regs[REG_PRA], self.regs[REG_DDRA]),
            Port::B => (self.regs[REG_PRB], self.regs[REG_DDRB]),
        };
        (pr & ddr) | (self.bus.port(port) & !ddr)
    }

    const fn icr_value(&self) -> u8 {
        let ir = if self.irq_active() { ICR_SET } else { 0 };
        ir | (self.icr_status & ICR_SOURCE_MASK)
    }

    fn positive_edge(&mut self) {
        if self.reset || !self.bus.pin(InputPin::Res) {
            self.regs = [0; 16];
            self.icr_status = 0;
            self.icr_mask = 0;
            self.data_out = 0;
            self.access_done = false;
            return;
        }

        let flag = self.bus.pin(InputPin::Flag);
        if self.flag_level && !flag {
            self.icr_status |= ICR_FLAG;
        }
        self.flag_level = flag;

        if self.bus.phi2() {
            if self.bus.chip_selected() && !self.access_done {
                // One register access per PHI2-high phase.
                let addr = usize::from(self.bus.address());
                if self.bus.write_enabled() {
                    self.write_register(addr, self.bus.data());
                } else {
                    self.data_out = self.read_register(addr);
                }
                self.access_done = true;
            }
        } else {
            self.access_done = false;
        }
    }
}

impl CiaCore for SoftCia {
    fn set_model(&mut self, model: CiaModel) {
        self.model = model;
    }

    fn set_reset(&mut self, active: bool) {
        self.reset = active;
    }

    fn set_clk(&mut self, high: bool) {
        if high && !self.clk {
            self.positive_edge();
        }
        self.clk = high;
    }

    fn drive(&mut self, bus: BusIn) {
        self.bus = bus;
    }

    fn eval(&mut self) {
        // Outputs are recomputed on demand in `bus_out`; sequential state
        // already advanced on the positive clock edge.
    }

    fn bus_out(&self) -> BusOut {
        BusOutBuilder::new()
            .irq(self.irq_active())
            .pin(OutputPin::Sp, true)
            .pin(OutputPin::Cnt, true)
            .pin(OutputPin::Pc, true)
            .data(self.data_out)
            .port(Port::A, self.regs[REG_PRA])
            .ddr(Port::A, self.regs[REG_DDRA])
            .port(Port::B, self.regs[REG_PRB])
            .ddr(Port::B, self.regs[REG_DDRB])
            .build()
    }

    fn icr_snapshot(&self) -> u8 {
        self.icr_value()
    }

    fn advance_time(&mut self, _picoseconds: u64) {}
}
