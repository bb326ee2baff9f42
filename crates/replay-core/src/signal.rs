//! Symbolic signal names and their classification into typed bus targets.
//!
//! Trace records name their target as a hexadecimal register address
//! (`0`-`F`), a port (`PA`, `PB`), or a pin. Pin vocabulary depends on the
//! transfer direction: the harness *writes* input pins (`RES`, `SP`, `CNT`,
//! `TOD`, `FLAG`) and *reads* output pins (`IRQ`, `SP`, `CNT`, `PC`).
//! `SP` and `CNT` are bidirectional lines and legal in both tables.
//!
//! Classification precedence is fixed and observable: register address parse
//! first, then ports, then the direction-specific pin table.

use std::fmt;

/// Register address of the interrupt control register, the only register
/// target legal on interrupt records.
pub const ICR_ADDRESS: u8 = 0xD;

/// Transfer direction of a trace record, seen from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    /// The harness samples a device output.
    Read,
    /// The harness drives a device input.
    Write,
}

/// One of the two 8-bit bidirectional I/O ports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Port {
    /// Port A.
    A,
    /// Port B.
    B,
}

/// Pins the harness drives into the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum InputPin {
    /// Serial port line (shared with the device's own open-drain driver).
    Sp,
    /// Counter line (shared with the device's own open-drain driver).
    Cnt,
    /// Time-of-day clock input.
    Tod,
    /// Handshake flag input.
    Flag,
    /// Reset line (trace value `0` asserts reset).
    Res,
}

/// Pins the harness samples from the device.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum OutputPin {
    /// Interrupt request line (active low).
    Irq,
    /// Serial port driver level.
    Sp,
    /// Counter driver level.
    Cnt,
    /// Port B handshake output.
    Pc,
}

/// A classified trace target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Deserialize, serde::Serialize))]
pub enum Target {
    /// Register access by 4-bit address.
    Register(u8),
    /// Port line access.
    Port(Port),
    /// Driven pin (write direction only).
    InputPin(InputPin),
    /// Sampled pin (read direction only).
    OutputPin(OutputPin),
}

impl Target {
    /// Classifies a target name for the given direction.
    ///
    /// Precedence is register address, then port, then pin; a name that
    /// parses as hexadecimal but lies outside `0x0..=0xF` resolves to
    /// nothing, as does a pin name used against its direction.
    #[must_use]
    pub fn resolve(name: &str, direction: Direction) -> Option<Self> {
        if let Ok(addr) = u8::from_str_radix(name, 16) {
            return (addr <= 0xF).then_some(Self::Register(addr));
        }

        match name {
            "PA" => return Some(Self::Port(Port::A)),
            "PB" => return Some(Self::Port(Port::B)),
            _ => {}
        }

        match direction {
            Direction::Read => match name {
                "IRQ" => Some(Self::OutputPin(OutputPin::Irq)),
                "SP" => Some(Self::OutputPin(OutputPin::Sp)),
                "CNT" => Some(Self::OutputPin(OutputPin::Cnt)),
                "PC" => Some(Self::OutputPin(OutputPin::Pc)),
                _ => None,
            },
            Direction::Write => match name {
                "SP" => Some(Self::InputPin(InputPin::Sp)),
                "CNT" => Some(Self::InputPin(InputPin::Cnt)),
                "TOD" => Some(Self::InputPin(InputPin::Tod)),
                "FLAG" => Some(Self::InputPin(InputPin::Flag)),
                "RES" => Some(Self::InputPin(InputPin::Res)),
                _ => None,
            },
        }
    }

    /// Largest legal value for this target: `0xFF` for byte-wide registers
    /// and ports, `1` for single-bit pins.
    #[must_use]
    pub const fn max_value(self) -> u8 {
        match self {
            Self::Register(_) | Self::Port(_) => 0xFF,
            Self::InputPin(_) | Self::OutputPin(_) => 1,
        }
    }

    /// Returns `true` for single-bit pin targets, which serialize their
    /// value as a decimal digit instead of a hex byte.
    #[must_use]
    pub const fn is_pin(self) -> bool {
        matches!(self, Self::InputPin(_) | Self::OutputPin(_))
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Register(addr) => write!(f, "{addr:X}"),
            Self::Port(Port::A) => write!(f, "PA"),
            Self::Port(Port::B) => write!(f, "PB"),
            Self::InputPin(pin) => {
                let name = match pin {
                    InputPin::Sp => "SP",
                    InputPin::Cnt => "CNT",
                    InputPin::Tod => "TOD",
                    InputPin::Flag => "FLAG",
                    InputPin::Res => "RES",
                };
                write!(f, "{name}")
            }
            Self::OutputPin(pin) => {
                let name = match pin {
                    OutputPin::Irq => "IRQ",
                    OutputPin::Sp => "SP",
                    OutputPin::Cnt => "CNT",
                    OutputPin::Pc => "PC",
                };
                write!(f, "{name}")
            }
        }
    }
}
