use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;

use crate::mol::Mol;

/// Largest cycle recorded as a small ring.
pub const SMALL_RING_MAX: usize = 7;

/// Every simple cycle of at most [`SMALL_RING_MAX`] atoms reachable from a set
/// of start atoms, each stored once as an atom bitset.
#[derive(Debug, Clone, Default)]
pub struct SmallRings {
    rings: Vec<FixedBitSet>,
}

impl SmallRings {
    /// Depth-first ring search from every atom in `atoms`. An atom reached
    /// by an earlier search is not used as a new start.
    pub fn find<A, B>(mol: &Mol<A, B>, atoms: &FixedBitSet) -> Self {
        let n = mol.atom_count();
        let mut todo = atoms.clone();
        todo.grow(n);
        let mut found = Self::default();

        loop {
            let Some(start) = todo.ones().next() else {
                break;
            };
            if start >= n {
                todo.set(start, false);
                continue;
            }
            let mut path = vec![NodeIndex::new(start)];
            found.expand(mol, &mut path, &mut todo);
        }

        found
    }

    fn expand<A, B>(&mut self, mol: &Mol<A, B>, path: &mut Vec<NodeIndex>, todo: &mut FixedBitSet) {
        let sphere = path.len() - 1;
        if sphere > SMALL_RING_MAX {
            return;
        }
        let atom = path[sphere];
        todo.set(atom.index(), false);
        if mol.degree(atom) > 4 {
            return;
        }
        let parent = sphere.checked_sub(1).map(|i| path[i]);

        let mut next = Vec::with_capacity(4);
        for nb in mol.neighbors(atom) {
            if mol.degree(nb) == 1 || Some(nb) == parent {
                continue;
            }
            match path.iter().position(|&a| a == nb) {
                Some(pos) => self.record(mol.atom_count(), &path[pos..]),
                None => next.push(nb),
            }
        }

        for nb in next {
            path.push(nb);
            self.expand(mol, path, todo);
            path.pop();
        }
    }

    fn record(&mut self, atom_count: usize, cycle: &[NodeIndex]) {
        if cycle.len() > SMALL_RING_MAX {
            return;
        }
        let mut ring = FixedBitSet::with_capacity(atom_count);
        for a in cycle {
            ring.insert(a.index());
        }
        if !self.rings.contains(&ring) {
            self.rings.push(ring);
        }
    }

    pub fn num_rings(&self) -> usize {
        self.rings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rings.is_empty()
    }

    pub fn rings(&self) -> &[FixedBitSet] {
        &self.rings
    }

    pub fn is_ring_atom(&self, atom: NodeIndex) -> bool {
        self.rings.iter().any(|r| r.contains(atom.index()))
    }

    /// `true` when some small ring holds both atoms.
    pub fn share_ring(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.rings
            .iter()
            .any(|r| r.contains(a.index()) && r.contains(b.index()))
    }

    pub fn atom_rings(&self, atom: NodeIndex) -> impl Iterator<Item = &FixedBitSet> + '_ {
        self.rings.iter().filter(move |r| r.contains(atom.index()))
    }

    /// Drops `atoms` from every ring.
    pub fn remove_atoms(&mut self, atoms: &FixedBitSet) {
        for ring in &mut self.rings {
            ring.difference_with(atoms);
        }
    }

    /// Rings as sorted atom index lists.
    pub fn to_vecs(&self) -> Vec<Vec<usize>> {
        self.rings.iter().map(|r| r.ones().collect()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{Atom, Bond, BondOrder};

    fn all(mol: &Mol<Atom, Bond>) -> FixedBitSet {
        let mut bs = FixedBitSet::with_capacity(mol.atom_count());
        bs.insert_range(..);
        bs
    }

    fn cycle(n: usize) -> Mol<Atom, Bond> {
        let mut mol = Mol::new();
        let atoms: Vec<_> = (0..n).map(|_| mol.add_atom(Atom::new(6))).collect();
        for i in 0..n {
            mol.add_bond(atoms[i], atoms[(i + 1) % n], Bond::default());
        }
        mol
    }

    #[test]
    fn cyclohexane_one_ring() {
        let mol = cycle(6);
        let rings = SmallRings::find(&mol, &all(&mol));
        assert_eq!(rings.num_rings(), 1);
        assert_eq!(rings.rings()[0].count_ones(..), 6);
    }

    #[test]
    fn cyclopropane() {
        let mol = cycle(3);
        let rings = SmallRings::find(&mol, &all(&mol));
        assert_eq!(rings.to_vecs(), vec![vec![0, 1, 2]]);
    }

    #[test]
    fn eight_membered_ring_is_not_small() {
        let mol = cycle(8);
        let rings = SmallRings::find(&mol, &all(&mol));
        assert!(rings.is_empty());
    }

    #[test]
    fn seven_membered_ring_is_small() {
        let mol = cycle(7);
        let rings = SmallRings::find(&mol, &all(&mol));
        assert_eq!(rings.num_rings(), 1);
    }

    #[test]
    fn acyclic_chain() {
        let mut mol = Mol::<Atom, Bond>::new();
        let a = mol.add_atom(Atom::new(6));
        let b = mol.add_atom(Atom::new(6));
        let c = mol.add_atom(Atom::new(8));
        mol.add_bond(a, b, Bond::default());
        mol.add_bond(b, c, Bond::new(BondOrder::Double));
        let rings = SmallRings::find(&mol, &all(&mol));
        assert!(rings.is_empty());
    }

    #[test]
    fn bicyclo_2_2_1_records_every_cycle_once() {
        // norbornane skeleton: C0..C6, bridgeheads 0 and 3
        let mut mol = Mol::<Atom, Bond>::new();
        let c: Vec<_> = (0..7).map(|_| mol.add_atom(Atom::new(6))).collect();
        for (a, b) in [(0, 1), (1, 2), (2, 3), (3, 4), (4, 5), (5, 0), (0, 6), (6, 3)] {
            mol.add_bond(c[a], c[b], Bond::default());
        }
        let rings = SmallRings::find(&mol, &all(&mol));
        let mut sizes: Vec<usize> = rings.rings().iter().map(|r| r.count_ones(..)).collect();
        sizes.sort();
        assert_eq!(sizes, vec![5, 5, 6]);
        for (i, r) in rings.rings().iter().enumerate() {
            for other in &rings.rings()[i + 1..] {
                assert_ne!(r, other);
            }
        }
    }

    #[test]
    fn start_set_limits_search() {
        let mut mol = cycle(5);
        let tail = mol.add_atom(Atom::new(6));
        let far = mol.add_atom(Atom::new(6));
        mol.add_bond(NodeIndex::new(0), tail, Bond::default());
        mol.add_bond(tail, far, Bond::default());
        let mut only_far = FixedBitSet::with_capacity(mol.atom_count());
        only_far.insert(far.index());
        // `far` is terminal, so nothing is reachable from it.
        let rings = SmallRings::find(&mol, &only_far);
        assert!(rings.is_empty());
    }

    #[test]
    fn share_ring_and_remove_atoms() {
        let mol = cycle(6);
        let mut rings = SmallRings::find(&mol, &all(&mol));
        assert!(rings.share_ring(NodeIndex::new(0), NodeIndex::new(3)));
        let mut drop = FixedBitSet::with_capacity(6);
        drop.insert(3);
        rings.remove_atoms(&drop);
        assert!(!rings.share_ring(NodeIndex::new(0), NodeIndex::new(3)));
        assert!(rings.is_ring_atom(NodeIndex::new(0)));
    }
}
