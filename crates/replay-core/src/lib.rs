//! Cycle-accurate bus replay engine for MOS 6526/8521 CIA verification.
//!
//! The crate drives a simulated CIA core through its external bus protocol
//! from a textual transaction trace and emits a normalized trace for
//! golden-file diffing: register and port accesses, pin stimulus, two-phase
//! clock sequencing, and interrupt-edge splicing with exact cycle
//! accounting.

/// Packed bus-state words and their named accessors.
pub mod bus;
pub use bus::{BusIn, BusOut, BusOutBuilder};

/// Symbolic signal names and typed target classification.
pub mod signal;
pub use signal::{Direction, InputPin, OutputPin, Port, Target, ICR_ADDRESS};

/// The simulated-device contract.
pub mod device;
pub use device::{CiaCore, CiaModel};

/// Bus-level behavioral stand-in core.
pub mod soft;
pub use soft::SoftCia;

/// Two-phase clock sequencing and the TOD frequency divider.
pub mod clock;
pub use clock::{ClockDriver, FAST_CLOCKS_PER_PHASE, FAST_EDGE_PICOS};

/// Bus transaction sequencing.
pub mod engine;
pub use engine::{BusEngine, ReplayConfig};

/// Interrupt-output edge detection.
pub mod interrupt;
pub use interrupt::IrqDetector;

/// Trace record parsing and serialization.
pub mod trace;
pub use trace::{parse_record, Operation, Record, TraceError, TraceErrorKind};

/// The top-level replay loop.
pub mod replay;
pub use replay::{replay, CycleAccounting, ReplayError};

#[cfg(test)]
use proptest as _;
#[cfg(test)]
use rstest as _;
