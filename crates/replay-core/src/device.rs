//! The simulated-device contract.
//!
//! The replay engine treats the chip model as an opaque collaborator: it
//! drives a packed input word, asks for output recomputation, and samples a
//! packed output word plus one debug-only register. Anything behind that
//! surface (timers, serial logic, time-of-day counting) belongs to the
//! device model, not to this crate.

use crate::bus::{BusIn, BusOut};

/// Chip variant selection, latched once at power-on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum CiaModel {
    /// Original NMOS part.
    Mos6526,
    /// CMOS revision.
    #[default]
    Mos8521,
}

impl CiaModel {
    /// Parses the variant from its marketing number.
    #[must_use]
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "6526" => Some(Self::Mos6526),
            "8521" => Some(Self::Mos8521),
            _ => None,
        }
    }
}

/// Contract between the replay engine and a simulated CIA core.
///
/// The engine owns the input word and pushes a fresh copy with [`drive`]
/// before each evaluation; non-clock inputs therefore take effect on the
/// next fast-clock edge. [`eval`] recomputes outputs from the latched
/// inputs, and [`advance_time`] moves the model's monotonic virtual clock.
///
/// [`drive`]: CiaCore::drive
/// [`eval`]: CiaCore::eval
/// [`advance_time`]: CiaCore::advance_time
pub trait CiaCore {
    /// Selects the chip variant. Called once before the reset sequence.
    fn set_model(&mut self, model: CiaModel);

    /// Drives the model-level reset input.
    fn set_reset(&mut self, active: bool);

    /// Drives the fast simulation clock.
    fn set_clk(&mut self, high: bool);

    /// Latches the packed input bus word.
    fn drive(&mut self, bus: BusIn);

    /// Recomputes outputs from the latched inputs and clock state.
    fn eval(&mut self);

    /// Returns the packed output bus word.
    fn bus_out(&self) -> BusOut;

    /// Returns the debug-only interrupt control register snapshot.
    fn icr_snapshot(&self) -> u8;

    /// Advances the model's virtual time by `picoseconds`.
    fn advance_time(&mut self, picoseconds: u64);
}
