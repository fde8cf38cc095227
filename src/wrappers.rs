use crate::descriptor::StereoDescriptor;
use crate::traits::*;

/// Adds 3-D coordinates (ångströms) to an atom payload.
#[derive(Debug, Clone, PartialEq)]
pub struct WithPosition3D<T> {
    pub inner: T,
    pub position_3d: Option<[f64; 3]>,
}

impl<T> WithPosition3D<T> {
    pub fn new(inner: T, position: [f64; 3]) -> Self {
        Self {
            inner,
            position_3d: Some(position),
        }
    }
}

impl<T> HasPosition3D for WithPosition3D<T> {
    fn position_3d(&self) -> Option<[f64; 3]> {
        self.position_3d
    }
    fn set_position_3d(&mut self, pos: Option<[f64; 3]>) {
        self.position_3d = pos;
    }
}

macro_rules! delegate_trait {
    ($wrapper:ident, $trait:ident, $method:ident, $ret:ty) => {
        impl<T: $trait> $trait for $wrapper<T> {
            fn $method(&self) -> $ret {
                self.inner.$method()
            }
        }
    };
}

delegate_trait!(WithPosition3D, HasAtomicNum, atomic_num, u8);
delegate_trait!(WithPosition3D, HasIsotope, isotope, u16);
delegate_trait!(WithPosition3D, HasBondOrder, bond_order, crate::bond::BondOrder);

impl<T: HasStereoDescriptor> HasStereoDescriptor for WithPosition3D<T> {
    fn stereo_descriptor(&self) -> StereoDescriptor {
        self.inner.stereo_descriptor()
    }
    fn set_stereo_descriptor(&mut self, descriptor: StereoDescriptor) {
        self.inner.set_stereo_descriptor(descriptor);
    }
}
