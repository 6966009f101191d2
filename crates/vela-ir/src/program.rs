//! Emitted neutral-atom instruction stream.
//!
//! The compiler's output is a linear list of [`NaInstruction`]s over exact
//! trap coordinates, preceded by the initial position of every atom. The
//! textual rendering (`Display`) is the machine-facing format:
//!
//! ```text
//! init at (0, 0), (3, 0);
//! load (0, 0), (3, 0);
//! move (0, 0), (3, 0) to (5, 70), (17, 70);
//! store (5, 70), (17, 70);
//! rydberg;
//! ```

use serde::{Deserialize, Serialize};
use std::fmt;

/// An exact location in the global coordinate system, in µm.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub struct Position {
    pub x: u64,
    pub y: u64,
}

impl Position {
    #[must_use]
    pub fn new(x: u64, y: u64) -> Self {
        Self { x, y }
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One low-level hardware instruction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NaInstruction {
    /// A single-qubit pulse addressed at concrete trap positions.
    LocalSq {
        gate: String,
        params: Vec<f64>,
        positions: Vec<Position>,
    },
    /// A single-qubit pulse applied to every atom that is not parked.
    GlobalSq { gate: String, params: Vec<f64> },
    /// Pick up atoms from their traps into the AOD.
    Load { positions: Vec<Position> },
    /// Parallel translation of all loaded atoms.
    Move {
        starts: Vec<Position>,
        ends: Vec<Position>,
    },
    /// Deposit loaded atoms into the traps at their current positions.
    Store { positions: Vec<Position> },
    /// Activate the Rydberg interaction laser.
    Rydberg,
}

impl fmt::Display for NaInstruction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fn join(positions: &[Position]) -> String {
            positions
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        }
        fn params(params: &[f64]) -> String {
            if params.is_empty() {
                String::new()
            } else {
                format!(
                    "({})",
                    params
                        .iter()
                        .map(ToString::to_string)
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            }
        }
        match self {
            Self::LocalSq {
                gate,
                params: p,
                positions,
            } => write!(f, "{gate}{} at {};", params(p), join(positions)),
            Self::GlobalSq { gate, params: p } => write!(f, "{gate}{};", params(p)),
            Self::Load { positions } => write!(f, "load {};", join(positions)),
            Self::Move { starts, ends } => {
                write!(f, "move {} to {};", join(starts), join(ends))
            }
            Self::Store { positions } => write!(f, "store {};", join(positions)),
            Self::Rydberg => write!(f, "rydberg;"),
        }
    }
}

/// A complete compiled program: initial atom positions plus the
/// instruction stream.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NaProgram {
    /// One entry per qubit, in qubit-index order.
    pub initial_positions: Vec<Position>,
    /// The instruction stream, in execution order.
    pub instructions: Vec<NaInstruction>,
}

impl NaProgram {
    /// Number of instructions.
    #[must_use]
    pub fn len(&self) -> usize {
        self.instructions.len()
    }

    /// True if the program contains no instructions.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.instructions.is_empty()
    }
}

impl fmt::Display for NaProgram {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "init at ")?;
        for (i, p) in self.initial_positions.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{p}")?;
        }
        writeln!(f, ";")?;
        for inst in &self.instructions {
            writeln!(f, "{inst}")?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instruction_display() {
        let load = NaInstruction::Load {
            positions: vec![Position::new(0, 0), Position::new(3, 0)],
        };
        assert_eq!(load.to_string(), "load (0, 0), (3, 0);");

        let mv = NaInstruction::Move {
            starts: vec![Position::new(0, 0)],
            ends: vec![Position::new(5, 70)],
        };
        assert_eq!(mv.to_string(), "move (0, 0) to (5, 70);");

        let rz = NaInstruction::LocalSq {
            gate: "rz".to_string(),
            params: vec![0.5],
            positions: vec![Position::new(3, 0)],
        };
        assert_eq!(rz.to_string(), "rz(0.5) at (3, 0);");

        let ry = NaInstruction::GlobalSq {
            gate: "ry".to_string(),
            params: vec![1.5],
        };
        assert_eq!(ry.to_string(), "ry(1.5);");

        assert_eq!(NaInstruction::Rydberg.to_string(), "rydberg;");
    }

    #[test]
    fn test_program_display() {
        let program = NaProgram {
            initial_positions: vec![Position::new(0, 0), Position::new(3, 0)],
            instructions: vec![NaInstruction::Rydberg],
        };
        assert_eq!(program.to_string(), "init at (0, 0), (3, 0);\nrydberg;\n");
    }
}
