use thiserror::Error;

/// Errors produced while assigning CIP descriptors.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CipError {
    /// A request named an atom index the molecule does not have.
    #[error("atom index {index} out of range for a molecule with {atom_count} atoms")]
    AtomOutOfRange { index: usize, atom_count: usize },

    /// Geometric evaluation reached an atom without 3-D coordinates.
    #[error("atom {atom} has no 3-D coordinates")]
    MissingCoordinates { atom: usize },

    /// Geometric evaluation reached an atom with non-finite coordinates.
    #[error("atom {atom} has non-finite coordinates")]
    InvalidCoordinates { atom: usize },

    /// Substituent comparison did not yield a consistent ordering.
    #[error("inconsistent substituent ranking at atom {atom}")]
    InconsistentRanking { atom: usize },
}

impl CipError {
    /// `true` for faults confined to one centre's evaluation.
    pub fn is_local(&self) -> bool {
        !matches!(self, Self::AtomOutOfRange { .. })
    }
}
