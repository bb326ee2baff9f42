//! The replay loop: trace in, normalized trace out.
//!
//! Each input record is processed as wait-then-apply: step the requested
//! number of bus cycles while watching the interrupt line, then apply the
//! operation and emit the (possibly rewritten) record. Three accounting
//! rules keep the emitted cycle stream equal to the requested one:
//!
//! * A register access consumes one bus cycle of its own; the skip-cycle
//!   flag makes the *next* record's wait absorb it instead of re-stepping.
//! * An interrupt firing mid-wait is spliced out as its own record; the
//!   wait is re-based so the original record keeps only the remainder.
//! * Interrupt annotations in the input are never stepped. Their delta is
//!   folded into the next real record's wait, which is what makes replay
//!   of an emitted trace byte-identical.

use std::io::{BufRead, Write};

use thiserror::Error;

use crate::device::CiaCore;
use crate::engine::{BusEngine, ReplayConfig};
use crate::interrupt::IrqDetector;
use crate::signal::Target;
use crate::trace::{parse_record, Operation, Record, TraceError, TraceErrorKind};

/// Carried cycle state threaded through the replay loop.
///
/// Mutated only at the documented points: after the wait loop, after an
/// operation is applied, and when an interrupt annotation folds its wait
/// forward.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct CycleAccounting {
    /// The previous register access already consumed one bus cycle; the
    /// next wait must not re-step it.
    pub skip_next_cycle: bool,
    /// Wait cycles folded forward from interrupt annotations.
    pub carried_cycles: u32,
}

/// Fatal replay failure.
#[derive(Debug, Error)]
pub enum ReplayError {
    /// A trace record failed to parse or violated the cycle protocol.
    #[error(transparent)]
    Trace(#[from] TraceError),
    /// The input or output stream failed.
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Replays a trace from `input` against `device`, writing the normalized
/// trace to `output`.
///
/// # Errors
///
/// Returns [`ReplayError::Trace`] on the first malformed or
/// protocol-violating record (with its line number and verbatim content),
/// or [`ReplayError::Io`] when a stream fails. Output emitted before the
/// failure has already been written.
pub fn replay<D, R, W>(
    device: &mut D,
    config: &ReplayConfig,
    input: R,
    output: &mut W,
) -> Result<(), ReplayError>
where
    D: CiaCore,
    R: BufRead,
    W: Write,
{
    let mut engine = BusEngine::power_on(device, config);
    let mut accounting = CycleAccounting::default();
    let mut detector = IrqDetector::new();

    for (index, line) in input.lines().enumerate() {
        let line = line?;
        let line_number = index + 1;
        let record = parse_record(&line, line_number)?;

        let wait = record.cycles + accounting.carried_cycles;
        accounting.carried_cycles = 0;

        if record.op == Operation::Interrupt {
            // No operation is associated with the annotation; its wait
            // belongs to the next real record. The pending skip survives
            // for the same reason.
            accounting.carried_cycles = wait;
            continue;
        }

        // A register or port write with no wait cannot land while the
        // previous access's cycle is still owed: there is no cycle for it.
        // A zero-wait read is fine, it re-uses the owed cycle.
        if accounting.skip_next_cycle
            && wait == 0
            && record.op == Operation::Write
            && !record.target.is_pin()
        {
            return Err(
                TraceError::new(TraceErrorKind::ProtocolViolation, line_number, &line).into(),
            );
        }

        let mut spent = 0;
        for i in 0..wait {
            if !accounting.skip_next_cycle || i > 0 {
                engine.step_cycle(device);
            }
            if let Some(icr) = detector.sample(device) {
                writeln!(output, "{}", Record::interrupt(i - spent, icr).to_line())?;
                spent = i;
            }
        }
        accounting.skip_next_cycle = false;

        let value = apply(&mut engine, device, &mut accounting, &record);

        let emitted = Record {
            cycles: wait - spent,
            value,
            ..record
        };
        writeln!(output, "{}", emitted.to_line())?;
    }

    Ok(())
}

/// Applies one operation through the engine and returns the value to emit:
/// the sampled value for reads, the caller's value for writes.
fn apply<D: CiaCore>(
    engine: &mut BusEngine,
    device: &mut D,
    accounting: &mut CycleAccounting,
    record: &Record,
) -> u8 {
    match (record.op, record.target) {
        (Operation::Read, Target::Register(addr)) => {
            let value = engine.read_register(device, addr);
            accounting.skip_next_cycle = true;
            value
        }
        (Operation::Write, Target::Register(addr)) => {
            engine.write_register(device, addr, record.value);
            accounting.skip_next_cycle = true;
            record.value
        }
        (Operation::Read, Target::Port(port)) => engine.read_port(device, port),
        (Operation::Write, Target::Port(port)) => {
            engine.write_port(device, port, record.value);
            record.value
        }
        (Operation::Read, Target::OutputPin(pin)) => u8::from(engine.read_pin(device, pin)),
        (Operation::Write, Target::InputPin(pin)) => {
            engine.write_pin(device, pin, record.value != 0);
            record.value
        }
        _ => unreachable!("target direction is checked at parse time"),
    }
}
