use super::direction::Direction;
use super::error::ModelError;
use super::shell::Shell;
use super::table::{DirectionRow, SchemeTable, StrengthRow};

/// A complete sampling scheme: an ordered sequence of shells.
///
/// Invariants checked at construction:
/// - at least one shell, and every shell holds at least one direction;
/// - strengths are finite and non-negative;
/// - no two shells carry the same strength.
///
/// A scheme owns its directions. Every optimizer reads a scheme and returns a
/// new one; nothing mutates a scheme in place.
///
/// Throughout the crate a direction is addressed by its *flat index*, the
/// position in shell-major order (all of shell 0, then all of shell 1, ...).
#[derive(Debug, Clone, PartialEq)]
pub struct Scheme {
    shells: Vec<Shell>,
}

impl Scheme {
    /// Creates a scheme from already-validated shells.
    ///
    /// # Errors
    ///
    /// Returns [`ModelError::EmptyScheme`] for an empty shell list and
    /// [`ModelError::DuplicateStrength`] if two shells share a strength.
    pub fn new(shells: Vec<Shell>) -> Result<Self, ModelError> {
        if shells.is_empty() {
            return Err(ModelError::EmptyScheme);
        }
        for (first, a) in shells.iter().enumerate() {
            let Some(value) = a.strength() else {
                continue;
            };
            for (offset, b) in shells[first + 1..].iter().enumerate() {
                if b.strength() == Some(value) {
                    return Err(ModelError::DuplicateStrength {
                        first,
                        second: first + 1 + offset,
                        value,
                    });
                }
            }
        }
        Ok(Self { shells })
    }

    /// Builds a scheme from per-shell direction lists and their strengths.
    ///
    /// `strengths` may be shorter than `groups`; missing entries are unlabeled.
    pub fn from_groups(
        strengths: &[Option<f64>],
        groups: Vec<Vec<Direction>>,
    ) -> Result<Self, ModelError> {
        let shells = groups
            .into_iter()
            .enumerate()
            .map(|(index, directions)| {
                let strength = strengths.get(index).copied().flatten();
                Shell::new(index, strength, directions)
            })
            .collect::<Result<Vec<_>, _>>()?;
        Self::new(shells)
    }

    /// Convenience constructor for a single-shell scheme.
    pub fn single_shell(
        strength: Option<f64>,
        directions: Vec<Direction>,
    ) -> Result<Self, ModelError> {
        Self::new(vec![Shell::new(0, strength, directions)?])
    }

    #[inline]
    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn shell(&self, index: usize) -> Option<&Shell> {
        self.shells.get(index)
    }

    #[inline]
    pub fn num_shells(&self) -> usize {
        self.shells.len()
    }

    pub fn num_directions(&self) -> usize {
        self.shells.iter().map(Shell::len).sum()
    }

    pub fn shell_counts(&self) -> Vec<usize> {
        self.shells.iter().map(Shell::len).collect()
    }

    pub fn strengths(&self) -> Vec<Option<f64>> {
        self.shells.iter().map(Shell::strength).collect()
    }

    /// Flat index of the first direction of each shell.
    pub fn offsets(&self) -> Vec<usize> {
        self.shells
            .iter()
            .scan(0, |acc, shell| {
                let start = *acc;
                *acc += shell.len();
                Some(start)
            })
            .collect()
    }

    /// Iterates `(shell_index, direction)` pairs in flat order.
    pub fn iter(&self) -> impl Iterator<Item = (usize, &Direction)> + '_ {
        self.shells
            .iter()
            .enumerate()
            .flat_map(|(s, shell)| shell.directions().iter().map(move |d| (s, d)))
    }

    /// All directions in flat order.
    pub fn directions(&self) -> Vec<Direction> {
        self.iter().map(|(_, d)| *d).collect()
    }

    /// Shell index of every direction in flat order.
    pub fn labels(&self) -> Vec<usize> {
        self.iter().map(|(s, _)| s).collect()
    }

    /// Maps a flat index to `(shell, index within shell)`.
    pub fn locate(&self, flat_index: usize) -> Option<(usize, usize)> {
        let mut remaining = flat_index;
        for (s, shell) in self.shells.iter().enumerate() {
            if remaining < shell.len() {
                return Some((s, remaining));
            }
            remaining -= shell.len();
        }
        None
    }

    /// Exports the scheme as the plain numeric table used at the I/O boundary.
    pub fn to_table(&self) -> SchemeTable {
        let directions = self
            .iter()
            .map(|(shell, d)| DirectionRow {
                x: d.x(),
                y: d.y(),
                z: d.z(),
                shell,
            })
            .collect();
        let strengths = self
            .shells
            .iter()
            .enumerate()
            .filter_map(|(shell, s)| s.strength().map(|strength| StrengthRow { shell, strength }))
            .collect();
        SchemeTable {
            directions,
            strengths,
        }
    }

    /// Rebuilds a scheme from the numeric table.
    ///
    /// Rows keep their relative order within each shell. The number of shells
    /// is one past the largest shell index found in either table; a shell
    /// index without any direction row is an [`ModelError::EmptyShell`].
    pub fn from_table(table: &SchemeTable) -> Result<Self, ModelError> {
        let num_shells = table
            .directions
            .iter()
            .map(|row| row.shell + 1)
            .chain(table.strengths.iter().map(|row| row.shell + 1))
            .max()
            .ok_or(ModelError::EmptyScheme)?;

        let mut strengths: Vec<Option<f64>> = vec![None; num_shells];
        for row in &table.strengths {
            if strengths[row.shell].is_some() {
                return Err(ModelError::DuplicateStrengthEntry { shell: row.shell });
            }
            strengths[row.shell] = Some(row.strength);
        }

        let mut groups: Vec<Vec<Direction>> = vec![Vec::new(); num_shells];
        for (row_index, row) in table.directions.iter().enumerate() {
            if row.shell >= num_shells {
                return Err(ModelError::ShellIndexOutOfRange {
                    row: row_index,
                    shell: row.shell,
                    num_shells,
                });
            }
            groups[row.shell].push(Direction::new(row.x, row.y, row.z)?);
        }

        Self::from_groups(&strengths, groups)
    }
}
