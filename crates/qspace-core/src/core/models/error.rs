use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("Direction has a non-finite component")]
    NonFiniteComponent,

    #[error("Direction has zero length and cannot be normalized")]
    ZeroLengthDirection,

    #[error("A scheme must contain at least one shell")]
    EmptyScheme,

    #[error("Shell {shell} contains no directions")]
    EmptyShell { shell: usize },

    #[error("Shell {shell} has invalid strength {value}; strengths must be finite and non-negative")]
    InvalidStrength { shell: usize, value: f64 },

    #[error("Shells {first} and {second} share the strength {value}")]
    DuplicateStrength {
        first: usize,
        second: usize,
        value: f64,
    },

    #[error("Row {row} references shell {shell}, but only {num_shells} shell(s) are present")]
    ShellIndexOutOfRange {
        row: usize,
        shell: usize,
        num_shells: usize,
    },

    #[error("Strength table lists shell {shell} more than once")]
    DuplicateStrengthEntry { shell: usize },
}
