pub mod aromaticity;
pub mod atom;
pub mod azacyclic;
pub mod bond;
pub mod candidates;
pub mod cip;
pub mod descriptor;
pub mod element;
pub mod error;
pub mod geometry;
pub mod mol;
pub mod rings;
pub mod traits;
pub mod wrappers;

pub use atom::Atom;
pub use bond::{Bond, BondOrder};
pub use cip::{assign_cip_labels, find_cip_labels, CipLabels, CipOptions, CipRequest, Rule1bPolicy};
pub use descriptor::{CipRule, Stereo, StereoDescriptor};
pub use error::CipError;
pub use mol::Mol;
pub use rings::SmallRings;
pub use traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D, HasStereoDescriptor};
pub use wrappers::WithPosition3D;
