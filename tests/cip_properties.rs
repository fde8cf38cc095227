use serde::Deserialize;

use crabcip::{
    assign_cip_labels, find_cip_labels, Atom, Bond, BondOrder, CipLabels, CipOptions, CipRequest,
    HasStereoDescriptor, Mol, Stereo, WithPosition3D,
};

#[derive(Deserialize)]
struct AtomEntry {
    z: u8,
    xyz: [f64; 3],
    #[serde(default)]
    isotope: u16,
}

#[derive(Deserialize)]
struct CipEntry {
    name: String,
    atoms: Vec<AtomEntry>,
    bonds: Vec<(usize, usize, u8)>,
}

fn dataset() -> Vec<CipEntry> {
    serde_json::from_str(include_str!("approval_data/cip.json")).unwrap()
}

/// Builds the molecule with atom `i` of the entry stored at `order[i]` and
/// every coordinate passed through `map`.
fn build(entry: &CipEntry, order: &[usize], map: impl Fn([f64; 3]) -> [f64; 3]) -> Mol<WithPosition3D<Atom>, Bond> {
    let mut slots: Vec<Option<&AtomEntry>> = vec![None; entry.atoms.len()];
    for (i, a) in entry.atoms.iter().enumerate() {
        slots[order[i]] = Some(a);
    }
    let mut mol = Mol::new();
    let ids: Vec<_> = slots
        .into_iter()
        .map(|a| {
            let a = a.unwrap();
            let atom = Atom {
                atomic_num: a.z,
                isotope: a.isotope,
                ..Atom::default()
            };
            mol.add_atom(WithPosition3D::new(atom, map(a.xyz)))
        })
        .collect();
    for &(a, b, order_num) in &entry.bonds {
        let bond = match order_num {
            2 => BondOrder::Double,
            3 => BondOrder::Triple,
            _ => BondOrder::Single,
        };
        mol.add_bond(ids[order[a]], ids[order[b]], Bond::new(bond));
    }
    mol
}

fn identity(n: usize) -> Vec<usize> {
    (0..n).collect()
}

fn labels(mol: &Mol<WithPosition3D<Atom>, Bond>) -> CipLabels {
    find_cip_labels(mol, &CipRequest::all(), &CipOptions::default()).unwrap()
}

#[test]
fn labelling_is_idempotent() {
    for entry in dataset() {
        let mut mol = build(&entry, &identity(entry.atoms.len()), |p| p);
        let first = assign_cip_labels(&mut mol, &CipOptions::default()).unwrap();
        let second = assign_cip_labels(&mut mol, &CipOptions::default()).unwrap();
        assert_eq!(first, second, "{}", entry.name);
        for i in mol.atoms() {
            assert_eq!(mol.atom(i).stereo_descriptor(), second.get(i.index()), "{}", entry.name);
        }
    }
}

#[test]
fn labels_follow_atoms_under_renumbering() {
    for entry in dataset() {
        let n = entry.atoms.len();
        let base = labels(&build(&entry, &identity(n), |p| p));

        let reversed: Vec<usize> = (0..n).rev().collect();
        let rotated: Vec<usize> = (0..n).map(|i| (i + 1) % n).collect();
        for order in [reversed, rotated] {
            let permuted = labels(&build(&entry, &order, |p| p));
            for i in 0..n {
                assert_eq!(
                    permuted.get(order[i]).stereo,
                    base.get(i).stereo,
                    "{}: atom {i} under {order:?}",
                    entry.name
                );
            }
        }
    }
}

#[test]
fn inversion_swaps_handedness() {
    for entry in dataset() {
        let n = entry.atoms.len();
        let base = labels(&build(&entry, &identity(n), |p| p));
        let inverted = labels(&build(&entry, &identity(n), |[x, y, z]| [-x, -y, -z]));
        for i in 0..n {
            let (b, m) = (base.get(i).stereo, inverted.get(i).stereo);
            assert_eq!(m, b.mirrored(), "{}: atom {i}", entry.name);
            assert_eq!(m.is_undetermined(), b.is_undetermined());
            if matches!(b, Stereo::Z | Stereo::E) {
                assert_eq!(m, b);
            }
        }
    }
}
