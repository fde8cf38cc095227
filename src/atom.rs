use crate::descriptor::StereoDescriptor;

/// Default atom type for a molecular graph node.
///
/// `Atom` stores the intrinsic properties the CIP rules read: element and
/// isotope. Coordinates are supplied by the
/// [`WithPosition3D`](crate::WithPosition3D) wrapper. Hydrogens are expected
/// to be explicit graph atoms.
///
/// # Examples
///
/// ```
/// use crabcip::Atom;
///
/// let deuterium = Atom {
///     atomic_num: 1,
///     isotope: 2,
///     ..Atom::default()
/// };
/// assert_eq!(deuterium.atomic_num, 1);
/// ```
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Atom {
    /// Atomic number (1 = H, 6 = C, 7 = N, …).
    pub atomic_num: u8,
    /// Mass number. `0` means natural isotopic abundance (the common case).
    pub isotope: u16,
    /// Descriptor written back by [`assign_cip_labels`](crate::assign_cip_labels).
    pub stereo: StereoDescriptor,
}

impl Atom {
    pub fn new(atomic_num: u8) -> Self {
        Self {
            atomic_num,
            ..Self::default()
        }
    }
}

impl crate::traits::HasAtomicNum for Atom {
    fn atomic_num(&self) -> u8 {
        self.atomic_num
    }
}

impl crate::traits::HasIsotope for Atom {
    fn isotope(&self) -> u16 {
        self.isotope
    }
}

impl crate::traits::HasStereoDescriptor for Atom {
    fn stereo_descriptor(&self) -> StereoDescriptor {
        self.stereo
    }

    fn set_stereo_descriptor(&mut self, descriptor: StereoDescriptor) {
        self.stereo = descriptor;
    }
}
