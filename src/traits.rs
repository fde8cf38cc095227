use crate::bond::BondOrder;
use crate::descriptor::StereoDescriptor;

pub trait HasAtomicNum {
    fn atomic_num(&self) -> u8;
}

/// Mass number of an explicitly labelled isotope; `0` means natural abundance.
pub trait HasIsotope {
    fn isotope(&self) -> u16;
}

pub trait HasPosition3D {
    fn position_3d(&self) -> Option<[f64; 3]>;
    fn set_position_3d(&mut self, pos: Option<[f64; 3]>);
}

pub trait HasBondOrder {
    fn bond_order(&self) -> BondOrder;
}

/// Storage for an assigned CIP descriptor.
pub trait HasStereoDescriptor {
    fn stereo_descriptor(&self) -> StereoDescriptor;
    fn set_stereo_descriptor(&mut self, descriptor: StereoDescriptor);
}
