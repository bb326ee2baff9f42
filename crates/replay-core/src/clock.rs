//! Two-phase clock sequencing over the fast simulation clock.
//!
//! The device model clocks on the positive edge of a fast clock running at
//! eight times the bus rate: four fast clocks per PHI2 phase, two phases per
//! bus cycle. Non-clock inputs are applied on the negative edge, which saves
//! an evaluation because combinational settling happens together with the
//! next positive edge.
//!
//! An optional slow time-of-day signal is derived from elapsed virtual time
//! with a remainder-preserving accumulator, so long replays do not drift.

use crate::bus::BusIn;
use crate::device::CiaCore;
use crate::signal::InputPin;

/// Virtual time per fast-clock edge, in picoseconds (8 MHz fast clock).
pub const FAST_EDGE_PICOS: u64 = 62_500;

/// Fast clocks per PHI2 phase; 4 keeps combinational settling comfortably
/// inside a phase at simulation speed.
pub const FAST_CLOCKS_PER_PHASE: u32 = 4;

const PICOS_PER_SECOND: u64 = 1_000_000_000_000;

/// Drives the fast clock, the PHI2 phase bit, and the optional TOD toggle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClockDriver {
    tod_half_period_picos: u64,
    tod_accumulated_picos: u64,
    tod_level: bool,
    in_high_phase: bool,
}

impl ClockDriver {
    /// Creates a driver. A TOD frequency of zero disables the slow-clock
    /// toggle entirely.
    #[must_use]
    pub const fn new(tod_frequency_hz: u64) -> Self {
        let tod_half_period_picos = if tod_frequency_hz == 0 {
            0
        } else {
            PICOS_PER_SECOND / tod_frequency_hz / 2
        };

        Self {
            tod_half_period_picos,
            tod_accumulated_picos: 0,
            tod_level: false,
            in_high_phase: false,
        }
    }

    /// Returns the current level of the generated TOD signal.
    #[must_use]
    pub const fn tod_level(&self) -> bool {
        self.tod_level
    }

    /// Runs one fast clock: negative edge with input apply, positive edge,
    /// one time quantum per edge, then the TOD divider update.
    fn fast_clock<D: CiaCore>(&mut self, bus: &mut BusIn, device: &mut D) {
        device.set_clk(false);
        device.drive(*bus);
        device.eval();
        device.advance_time(FAST_EDGE_PICOS);

        device.set_clk(true);
        device.eval();
        device.advance_time(FAST_EDGE_PICOS);

        if self.tod_half_period_picos != 0 {
            self.tod_accumulated_picos += 2 * FAST_EDGE_PICOS;
            if self.tod_accumulated_picos >= self.tod_half_period_picos {
                // Keep the remainder so the toggle stays phase-accurate
                // over arbitrarily long runs.
                self.tod_accumulated_picos -= self.tod_half_period_picos;
                self.tod_level = !self.tod_level;
                bus.set_pin(InputPin::Tod, self.tod_level);
            }
        }
    }

    /// Enters the PHI2-high phase and runs its fast clocks. Re-entry while
    /// already high is a no-op, so address/data changes can be inserted
    /// mid-phase without extra evaluations.
    pub fn phase_high<D: CiaCore>(&mut self, bus: &mut BusIn, device: &mut D) {
        if self.in_high_phase {
            return;
        }
        self.in_high_phase = true;

        bus.set_phi2(true);
        for _ in 0..FAST_CLOCKS_PER_PHASE {
            self.fast_clock(bus, device);
        }
    }

    /// Enters the PHI2-low phase and runs its fast clocks.
    pub fn phase_low<D: CiaCore>(&mut self, bus: &mut BusIn, device: &mut D) {
        self.in_high_phase = false;

        bus.set_phi2(false);
        for _ in 0..FAST_CLOCKS_PER_PHASE {
            self.fast_clock(bus, device);
        }
    }

    /// Runs one full bus cycle: high phase followed by low phase.
    pub fn step_cycle<D: CiaCore>(&mut self, bus: &mut BusIn, device: &mut D) {
        self.phase_high(bus, device);
        self.phase_low(bus, device);
    }
}
