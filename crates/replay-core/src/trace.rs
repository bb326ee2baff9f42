//! Trace record parsing and serialization.
//!
//! One record per line: `<cycle-delta> <op> <target> <value>`. The value
//! field is two hexadecimal digits for byte-wide targets and one decimal
//! digit for pins. All parse failures are fatal and carry the 1-based line
//! number plus the verbatim line content: a malformed record means either
//! a corrupt golden file or an engine bug, and both need a human.

use std::fmt;

use thiserror::Error;

use crate::signal::{Direction, Target, ICR_ADDRESS};

/// Operation symbol of a trace record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Operation {
    /// Sample a register, port or output pin (`R`).
    Read,
    /// Drive a register, port or input pin (`W`).
    Write,
    /// Interrupt annotation (`I`); carries no replay semantics on input.
    Interrupt,
}

impl Operation {
    /// Parses the single-letter operation symbol.
    #[must_use]
    pub fn from_symbol(symbol: &str) -> Option<Self> {
        match symbol {
            "R" => Some(Self::Read),
            "W" => Some(Self::Write),
            "I" => Some(Self::Interrupt),
            _ => None,
        }
    }
}

impl fmt::Display for Operation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let symbol = match self {
            Self::Read => "R",
            Self::Write => "W",
            Self::Interrupt => "I",
        };
        write!(f, "{symbol}")
    }
}

/// One parsed trace record. Created per line, consumed immediately.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub struct Record {
    /// Bus cycles to wait before applying the operation.
    pub cycles: u32,
    /// What to do.
    pub op: Operation,
    /// Where to do it.
    pub target: Target,
    /// Value to drive, or the expected value for reads.
    pub value: u8,
}

impl Record {
    /// Serializes the record in the trace line layout (without newline).
    #[must_use]
    pub fn to_line(&self) -> String {
        if self.target.is_pin() {
            format!("{} {} {} {}", self.cycles, self.op, self.target, self.value)
        } else {
            format!("{} {} {} {:02X}", self.cycles, self.op, self.target, self.value)
        }
    }

    /// Builds a synthesized interrupt record carrying a captured ICR byte.
    #[must_use]
    pub const fn interrupt(cycles: u32, icr: u8) -> Self {
        Self {
            cycles,
            op: Operation::Interrupt,
            target: Target::Register(ICR_ADDRESS),
            value: icr,
        }
    }
}

/// Classification of fatal trace errors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TraceErrorKind {
    /// Wrong field count or an unparsable numeric field.
    #[error("malformed record")]
    MalformedRecord,
    /// Operation symbol outside `R`/`W`/`I`.
    #[error("invalid operation '{0}'")]
    InvalidOperation(String),
    /// Target name that resolves to nothing for the record's direction.
    #[error("invalid target '{0}'")]
    InvalidTarget(String),
    /// Value exceeding the resolved target's bit width.
    #[error("value out of range '{0}'")]
    ValueOutOfRange(String),
    /// A register or port write arrived with no wait while the preceding
    /// register access's cycle was still owed.
    #[error("cycle skip pending with no wait to absorb it")]
    ProtocolViolation,
}

/// A fatal trace error, located at a 1-based line with verbatim content.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("line {line}: {kind}: {text:?}")]
pub struct TraceError {
    /// 1-based line number.
    pub line: usize,
    /// Verbatim offending line.
    pub text: String,
    /// What went wrong.
    pub kind: TraceErrorKind,
}

impl TraceError {
    /// Creates a located error.
    #[must_use]
    pub fn new(kind: TraceErrorKind, line: usize, text: &str) -> Self {
        Self {
            line,
            text: text.to_owned(),
            kind,
        }
    }
}

/// Parses one trace line into a record.
///
/// # Errors
///
/// Returns a located [`TraceError`] for any malformed field, unknown
/// operation, unresolvable target or over-width value.
pub fn parse_record(line: &str, line_number: usize) -> Result<Record, TraceError> {
    let located = |kind| TraceError::new(kind, line_number, line);

    let mut fields = line.split_whitespace();
    let (Some(cycles), Some(op), Some(target), Some(value), None) = (
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
        fields.next(),
    ) else {
        return Err(located(TraceErrorKind::MalformedRecord));
    };

    let cycles: u32 = cycles
        .parse()
        .map_err(|_| located(TraceErrorKind::MalformedRecord))?;

    let op = Operation::from_symbol(op)
        .ok_or_else(|| located(TraceErrorKind::InvalidOperation(op.to_owned())))?;

    let target = resolve_target(op, target)
        .ok_or_else(|| located(TraceErrorKind::InvalidTarget(target.to_owned())))?;

    let value = parse_value(target, value).map_err(located)?;

    Ok(Record {
        cycles,
        op,
        target,
        value,
    })
}

/// Resolves a target name under the operation's direction. Interrupt
/// records accept only the fixed ICR debug address.
fn resolve_target(op: Operation, name: &str) -> Option<Target> {
    match op {
        Operation::Read => Target::resolve(name, Direction::Read),
        Operation::Write => Target::resolve(name, Direction::Write),
        Operation::Interrupt => match Target::resolve(name, Direction::Read) {
            Some(Target::Register(ICR_ADDRESS)) => Some(Target::Register(ICR_ADDRESS)),
            _ => None,
        },
    }
}

/// Parses a value field: hexadecimal for byte-wide targets, decimal for
/// pins. Unparsable text is malformed; a parseable value over the target
/// width is out of range.
#[allow(clippy::cast_possible_truncation)]
fn parse_value(target: Target, text: &str) -> Result<u8, TraceErrorKind> {
    let radix = if target.is_pin() { 10 } else { 16 };
    let value =
        u32::from_str_radix(text, radix).map_err(|_| TraceErrorKind::MalformedRecord)?;

    if value > u32::from(target.max_value()) {
        return Err(TraceErrorKind::ValueOutOfRange(text.to_owned()));
    }

    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::signal::{InputPin, OutputPin, Port};

    #[test]
    fn parses_register_write() {
        let record = parse_record("10 W 5 3F", 1).expect("valid record");
        assert_eq!(
            record,
            Record {
                cycles: 10,
                op: Operation::Write,
                target: Target::Register(5),
                value: 0x3F,
            }
        );
    }

    #[test]
    fn parses_port_read_with_hex_value() {
        let record = parse_record("0 R PB FF", 7).expect("valid record");
        assert_eq!(record.target, Target::Port(Port::B));
        assert_eq!(record.value, 0xFF);
    }

    #[test]
    fn parses_pin_records_per_direction() {
        let write = parse_record("2 W FLAG 1", 1).expect("valid record");
        assert_eq!(write.target, Target::InputPin(InputPin::Flag));
        assert_eq!(write.value, 1);

        let read = parse_record("0 R IRQ 0", 2).expect("valid record");
        assert_eq!(read.target, Target::OutputPin(OutputPin::Irq));
    }

    #[test]
    fn parses_interrupt_annotation() {
        let record = parse_record("3 I D 81", 4).expect("valid record");
        assert_eq!(record.op, Operation::Interrupt);
        assert_eq!(record.target, Target::Register(ICR_ADDRESS));
        assert_eq!(record.value, 0x81);
    }

    #[test]
    fn interrupt_records_reject_other_targets() {
        let err = parse_record("3 I 4 81", 9).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::InvalidTarget("4".into()));

        let err = parse_record("3 I PA 81", 9).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::InvalidTarget("PA".into()));
    }

    #[test]
    fn rejects_wrong_field_counts() {
        for line in ["", "10", "10 W", "10 W 5", "10 W 5 3F extra"] {
            let err = parse_record(line, 3).expect_err("must fail");
            assert_eq!(err.kind, TraceErrorKind::MalformedRecord);
            assert_eq!(err.line, 3);
        }
    }

    #[test]
    fn rejects_negative_or_textual_cycle_counts() {
        for line in ["-1 W 5 3F", "x W 5 3F"] {
            let err = parse_record(line, 2).expect_err("must fail");
            assert_eq!(err.kind, TraceErrorKind::MalformedRecord);
        }
    }

    #[test]
    fn rejects_unknown_operations() {
        let err = parse_record("0 X 5 00", 5).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::InvalidOperation("X".into()));
    }

    #[test]
    fn rejects_unknown_targets_with_the_verbatim_line() {
        let err = parse_record("0 W PZ 00", 12).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::InvalidTarget("PZ".into()));
        assert_eq!(err.line, 12);
        assert_eq!(err.text, "0 W PZ 00");
    }

    #[test]
    fn rejects_out_of_range_register_addresses() {
        let err = parse_record("0 W 1F 00", 1).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::InvalidTarget("1F".into()));
    }

    #[test]
    fn splits_unparsable_from_over_width_values() {
        let err = parse_record("0 W 5 ZZ", 1).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::MalformedRecord);

        let err = parse_record("0 W 5 100", 1).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::ValueOutOfRange("100".into()));

        let err = parse_record("0 W FLAG 2", 1).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::ValueOutOfRange("2".into()));
    }

    #[test]
    fn pin_values_parse_as_decimal() {
        // "1" is the only nonzero legal pin level either way, but a hex
        // digit like "A" must not sneak through the pin path.
        let err = parse_record("0 W TOD A", 1).expect_err("must fail");
        assert_eq!(err.kind, TraceErrorKind::MalformedRecord);
    }

    #[test]
    fn serializes_byte_targets_as_padded_hex() {
        let record = Record {
            cycles: 10,
            op: Operation::Write,
            target: Target::Register(5),
            value: 0x3F,
        };
        assert_eq!(record.to_line(), "10 W 5 3F");

        let low = Record {
            cycles: 0,
            op: Operation::Read,
            target: Target::Port(Port::A),
            value: 0x0A,
        };
        assert_eq!(low.to_line(), "0 R PA 0A");
    }

    #[test]
    fn serializes_pins_as_decimal_digits() {
        let record = Record {
            cycles: 4,
            op: Operation::Read,
            target: Target::OutputPin(OutputPin::Pc),
            value: 1,
        };
        assert_eq!(record.to_line(), "4 R PC 1");
    }

    #[test]
    fn synthesized_interrupt_uses_the_debug_register() {
        assert_eq!(Record::interrupt(3, 0x81).to_line(), "3 I D 81");
        assert_eq!(Record::interrupt(0, 0x02).to_line(), "0 I D 02");
    }

    #[test]
    fn parse_and_serialize_round_trip() {
        for line in ["10 W 5 3F", "0 R PA FF", "2 W FLAG 1", "3 I D 81", "7 R CNT 0"] {
            let record = parse_record(line, 1).expect("valid record");
            assert_eq!(record.to_line(), line);
        }
    }
}
