//! Falling-edge detection on the interrupt output line.
//!
//! /IRQ is active low and level-holding: once asserted it stays low until
//! the interrupt control register is read. The detector therefore reports
//! only the inactive-to-active transition, and captures the debug ICR
//! snapshot at that instant for the synthesized trace record.

use crate::device::CiaCore;

/// Edge detector over the /IRQ output bit.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IrqDetector {
    previous_asserted: bool,
}

impl Default for IrqDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl IrqDetector {
    /// Creates a detector with the line remembered as not asserted.
    #[must_use]
    pub const fn new() -> Self {
        Self {
            previous_asserted: false,
        }
    }

    /// Samples the interrupt line. Returns the captured ICR snapshot when
    /// the line transitioned from inactive to active since the last sample.
    pub fn sample<D: CiaCore>(&mut self, device: &D) -> Option<u8> {
        let asserted = device.bus_out().irq_asserted();
        let fired = asserted && !self.previous_asserted;
        self.previous_asserted = asserted;

        fired.then(|| device.icr_snapshot())
    }
}
