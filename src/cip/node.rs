//! The hierarchical digraph explored from one root atom.
//!
//! Nodes live in an arena owned by [`Digraph`] and refer to each other by
//! [`NodeId`]. A shallow [`Digraph::clone_node`] copies a node's child list,
//! so the clone and the original share the same child nodes.

use std::cmp::Ordering;
use std::collections::HashMap;
use std::rc::Rc;

use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::trace;

use super::{CipOptions, Perception, Rule1bPolicy};
use crate::descriptor::{CipRule, Stereo};
use crate::element::{atom_mass, average_mass, is_first_row, isotope_class, IsotopeClass};
use crate::mol::Mol;
use crate::traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D};

pub(crate) type NodeId = usize;

/// Auxiliary E/Z of a double bond inside the digraph. Rule 3 prefers the
/// smaller value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub(crate) enum AuxEz {
    Unset,
    Z,
    E,
    Both,
}

/// Auxiliary descriptor of a stereogenic node, used by rules 4a-5.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum AuxLabel {
    R,
    S,
    PseudoR,
    PseudoS,
}

impl AuxLabel {
    pub(crate) fn stereo(self) -> Stereo {
        match self {
            AuxLabel::R => Stereo::R,
            AuxLabel::S => Stereo::S,
            AuxLabel::PseudoR => Stereo::PseudoR,
            AuxLabel::PseudoS => Stereo::PseudoS,
        }
    }
}

#[derive(Debug, Clone)]
pub(crate) struct CipNode {
    pub serial: u32,
    /// `None` for a phantom (padding) substituent.
    pub atom: Option<NodeIndex>,
    pub parent: Option<NodeId>,
    pub sphere: usize,
    pub root_distance: i32,
    pub is_set: bool,
    pub is_duplicate: bool,
    pub is_terminal: bool,
    pub is_alkene: bool,
    pub bond_count: usize,
    /// Atomic number, or the mean over Kekulé-ambiguous neighbours for a
    /// multiple-bond duplicate on an ambiguous atom.
    pub elem_no: f64,
    pub mass: f64,
    pub reverse_rule2: bool,
    pub h1_count: u8,
    pub atoms: [Option<NodeId>; 4],
    pub n_atoms: usize,
    pub bs_path: FixedBitSet,
    pub path_points: Option<Rc<HashMap<usize, i32>>>,
    pub priorities: [u32; 4],
    pub n_priorities: usize,
    pub saved_priorities: Option<([u32; 4], usize)>,
    pub n_root_duplicates: usize,
    pub alkene_parent: Option<NodeId>,
    pub alkene_child: Option<NodeId>,
    pub is_alkene_atom2: bool,
    pub is_kekule_ambiguous: bool,
    pub next_sp2: Option<NodeId>,
    pub multiple_bond_duplicate: bool,
    pub is_even_ene: bool,
    pub aux_ez: AuxEz,
    pub is_sp3: bool,
    pub aux: Option<AuxLabel>,
    pub next_chiral_branch: Option<NodeId>,
    pub is_chiral_path: bool,
    /// Auxiliary type for rules 4b/5: 1 (R-like), 2 (S-like), or 0. On the
    /// root it counts the chiral branches instead.
    pub rule4_type: usize,
    /// Like/unlike reference sets for reference types 1 and 2.
    pub bs_rs: Option<Box<[FixedBitSet; 2]>>,
    pub new_atoms: Option<[Option<NodeId>; 4]>,
}

impl CipNode {
    fn new(serial: u32, parent: Option<NodeId>) -> Self {
        Self {
            serial,
            atom: None,
            parent,
            sphere: 0,
            root_distance: 0,
            is_set: false,
            is_duplicate: true,
            is_terminal: false,
            is_alkene: false,
            bond_count: 0,
            elem_no: 0.0,
            mass: 0.0,
            reverse_rule2: false,
            h1_count: 0,
            atoms: [None; 4],
            n_atoms: 0,
            bs_path: FixedBitSet::new(),
            path_points: None,
            priorities: [0; 4],
            n_priorities: 0,
            saved_priorities: None,
            n_root_duplicates: 0,
            alkene_parent: None,
            alkene_child: None,
            is_alkene_atom2: false,
            is_kekule_ambiguous: false,
            next_sp2: None,
            multiple_bond_duplicate: false,
            is_even_ene: true,
            aux_ez: AuxEz::Unset,
            is_sp3: true,
            aux: None,
            next_chiral_branch: None,
            is_chiral_path: false,
            rule4_type: 0,
            bs_rs: None,
            new_atoms: None,
        }
    }

    pub(crate) fn is_phantom(&self) -> bool {
        self.atom.is_none()
    }
}

/// How a substituent list is being ranked.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Pass {
    /// Re-sort explored subtrees before a top-level comparison. Ties are
    /// left unbroken.
    Prepare,
    /// Rank at the given sphere, breaking ties by exploring further out.
    Sphere(usize),
}

/// Per-root evaluation state: the node arena and the rule state shared by
/// every comparison made for this root.
pub(crate) struct Digraph<'a, A, B> {
    pub mol: &'a Mol<A, B>,
    pub perception: &'a Perception,
    pub options: &'a CipOptions,
    pub nodes: Vec<CipNode>,
    pub root: NodeId,
    pub rule: CipRule,
    /// Ranking by auxiliary type against `rule4_ref` while building the
    /// rule 4b reference sets.
    pub reference_ranking: bool,
    pub rule4_ref: usize,
    pub rule6_ref: Option<NodeIndex>,
    pub set_auxiliary: bool,
    pub aux_labels: Vec<(NodeIndex, Stereo)>,
    serial: u32,
}

impl<'a, A, B> Digraph<'a, A, B>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    pub fn new(mol: &'a Mol<A, B>, perception: &'a Perception, options: &'a CipOptions) -> Self {
        Self {
            mol,
            perception,
            options,
            nodes: Vec::new(),
            root: 0,
            rule: CipRule::Rule1a,
            reference_ranking: false,
            rule4_ref: 0,
            rule6_ref: None,
            set_auxiliary: false,
            aux_labels: Vec::new(),
            serial: 0,
        }
    }

    /// Index of the root's atom, for error reporting.
    pub fn root_atom_index(&self) -> usize {
        self.nodes
            .get(self.root)
            .and_then(|n| n.atom)
            .map_or(0, |a| a.index())
    }

    fn push(&mut self, node: CipNode) -> NodeId {
        self.nodes.push(node);
        self.nodes.len() - 1
    }

    fn next_serial(&mut self) -> u32 {
        self.serial += 1;
        self.serial
    }

    /// Creates a node for `atom` below `parent`, deciding whether it is a
    /// duplicate and how far from the root it counts for rule 1b.
    ///
    /// `is_duplicate` marks a multiple-bond duplicate. `is_parent_bond` marks
    /// a node reached back along the bond to its parent.
    pub fn create(
        &mut self,
        atom: Option<NodeIndex>,
        parent: Option<NodeId>,
        is_alkene: bool,
        is_duplicate: bool,
        is_parent_bond: bool,
    ) -> NodeId {
        let serial = self.next_serial();
        let mut node = CipNode::new(serial, parent);
        let Some(atom) = atom else {
            return self.push(node);
        };
        let i = atom.index();
        let mut is_duplicate = is_duplicate;

        node.is_alkene = is_alkene;
        node.atom = Some(atom);
        node.is_kekule_ambiguous = self.perception.kekule_ambiguous.contains(i);
        node.elem_no = match parent {
            Some(p) if is_duplicate && node.is_kekule_ambiguous => self.kekule_element_number(p),
            _ => f64::from(self.mol.atom(atom).atomic_num()),
        };
        node.bond_count = self.mol.degree(atom);
        node.is_sp3 = node.bond_count == 4
            || (node.bond_count == 3
                && !is_alkene
                && (node.elem_no > 10.0 || self.perception.azacyclic.contains(i)));
        if let Some(p) = parent {
            node.sphere = self.nodes[p].sphere + 1;
        }
        if node.sphere == 1 {
            node.path_points = Some(Rc::new(HashMap::new()));
        } else if let Some(p) = parent {
            node.path_points = self.nodes[p].path_points.clone();
        }
        node.bs_path = match parent {
            Some(p) => self.nodes[p].bs_path.clone(),
            None => FixedBitSet::with_capacity(self.mol.atom_count()),
        };
        node.multiple_bond_duplicate = is_duplicate;
        node.root_distance = node.sphere as i32;

        let policy = self.options.rule1b;
        if parent.is_none() {
            node.bs_path.insert(i);
        } else if is_duplicate
            && (policy == Rule1bPolicy::SelfDistance
                || (policy == Rule1bPolicy::SelfDistanceKekule && node.is_kekule_ambiguous))
        {
        } else if is_duplicate && policy == Rule1bPolicy::DecrementParent {
            node.root_distance -= 1;
        } else if self.nodes.get(self.root).and_then(|r| r.atom) == Some(atom) {
            is_duplicate = true;
            node.root_distance = 0;
            self.nodes[self.root].n_root_duplicates += 1;
        } else if node.bs_path.contains(i) {
            is_duplicate = true;
            node.root_distance = match (is_parent_bond, parent) {
                (true, Some(p)) => self.nodes[p].sphere as i32,
                _ => node
                    .path_points
                    .as_ref()
                    .and_then(|pp| pp.get(&i).copied())
                    .unwrap_or(node.root_distance),
            };
        } else {
            node.bs_path.insert(i);
            let distance = node.root_distance;
            Rc::make_mut(node.path_points.get_or_insert_with(Default::default)).insert(i, distance);
        }
        node.is_duplicate = is_duplicate;

        let (mass, reverse) = self.rule2_mass(atom, node.elem_no);
        node.mass = mass;
        node.reverse_rule2 = reverse;
        self.push(node)
    }

    /// Mass compared by rule 2, and whether the comparison is reversed.
    fn rule2_mass(&self, atom: NodeIndex, elem_no: f64) -> (f64, bool) {
        let a = self.mol.atom(atom);
        let mass = atom_mass(a.atomic_num(), a.isotope());
        if mass.fract() != 0.0 || mass > f64::from(u16::MAX) {
            return (mass, false);
        }
        match isotope_class(mass as u16, elem_no as u8) {
            IsotopeClass::Reversed => (mass, true),
            IsotopeClass::Average => (average_mass(elem_no as u8), false),
            IsotopeClass::Plain => (mass, false),
        }
    }

    fn kekule_element_number(&self, parent: NodeId) -> f64 {
        let Some(atom) = self.nodes[parent].atom else {
            return 0.0;
        };
        let (sum, n) = self
            .mol
            .neighbors(atom)
            .filter(|nb| self.perception.kekule_ambiguous.contains(nb.index()))
            .fold((0.0, 0u32), |(s, n), nb| (s + f64::from(self.mol.atom(nb).atomic_num()), n + 1));
        if n == 0 {
            0.0
        } else {
            sum / f64::from(n)
        }
    }

    /// Expands a node's substituents. Returns `false` when the atom cannot
    /// be expanded (too many substituents, or a second plain hydrogen on the
    /// root); the node is then terminal.
    pub fn set_node(&mut self, id: NodeId) -> bool {
        if self.nodes[id].is_set {
            return true;
        }
        self.nodes[id].is_set = true;
        if self.nodes[id].is_duplicate {
            return true;
        }
        let Some(atom) = self.nodes[id].atom else {
            return true;
        };
        if self.nodes[id].sphere >= self.options.max_sphere {
            self.nodes[id].is_terminal = true;
            return true;
        }

        let parent_atom = self.nodes[id].parent.and_then(|p| self.nodes[p].atom);
        let bonds = self.mol.bonded(atom);
        let n_bonds = bonds.len();
        let mut slot = 0;
        for &(_, other, order) in bonds.iter().rev() {
            let to_parent = parent_atom == Some(other);
            let mut order = order;
            if order == 2 {
                if self.nodes[id].elem_no > 10.0 || !is_first_row(self.mol.atom(other).atomic_num()) {
                    order = 1;
                } else {
                    self.nodes[id].is_alkene = true;
                    if to_parent {
                        self.set_ene(id);
                    }
                }
            }
            if n_bonds == 1 && order == 1 && to_parent {
                self.nodes[id].is_terminal = true;
                return true;
            }

            let light = self.nodes[id].elem_no <= 10.0;
            let mut adds: Vec<(bool, bool, bool)> = Vec::with_capacity(3);
            if order == 3 {
                adds.push((to_parent, false, to_parent));
            }
            if order >= 2 {
                adds.push((order != 2 || to_parent, order == 2, to_parent));
            }
            if !to_parent {
                adds.push((order != 1 && light, false, false));
            }
            for (is_dup, is_alkene, is_parent_bond) in adds {
                if self.add_atom(id, slot, other, is_dup, is_alkene, is_parent_bond).is_none() {
                    self.nodes[id].is_terminal = true;
                    return false;
                }
                slot += 1;
            }
        }

        self.nodes[id].n_atoms = slot;
        for s in slot..4 {
            let phantom = self.create(None, Some(id), false, true, false);
            self.nodes[id].atoms[s] = Some(phantom);
        }
        self.sort_natural(id);
        true
    }

    fn add_atom(
        &mut self,
        parent: NodeId,
        slot: usize,
        atom: NodeIndex,
        is_duplicate: bool,
        is_alkene: bool,
        is_parent_bond: bool,
    ) -> Option<NodeId> {
        if slot >= 4 {
            trace!("too many substituents on atom {}", self.nodes[parent].atom.map_or(0, |a| a.index()));
            return None;
        }
        let a = self.mol.atom(atom);
        if a.atomic_num() == 1 && a.isotope() == 0 {
            self.nodes[parent].h1_count += 1;
            if self.nodes[parent].h1_count > 1 && self.nodes[parent].parent.is_none() {
                trace!("second hydrogen on root atom {}", self.nodes[parent].atom.map_or(0, |a| a.index()));
                return None;
            }
        }
        let child = self.create(Some(atom), Some(parent), is_alkene, is_duplicate, is_parent_bond);
        self.nodes[parent].atoms[slot] = Some(child);
        Some(child)
    }

    /// Alkene bookkeeping for a node reached through a double bond: links the
    /// first atom of the ene with its far end, and tracks cumulene parity.
    pub fn set_ene(&mut self, id: NodeId) {
        let Some(parent) = self.nodes[id].parent else {
            return;
        };
        self.nodes[parent].alkene_child = None;
        let alkene_parent = self.nodes[parent].alkene_parent.unwrap_or(parent);
        self.nodes[id].alkene_parent = Some(alkene_parent);
        self.nodes[alkene_parent].alkene_child = Some(id);
        self.nodes[id].next_sp2 = Some(parent);
        if self.nodes[parent].alkene_parent.is_none() {
            self.nodes[parent].next_sp2 = Some(id);
        }
        let cumulated = self.nodes[id]
            .atom
            .is_some_and(|a| self.mol.degree(a) == 2 && self.mol.valence(a) == 4);
        if cumulated {
            self.nodes[parent].is_alkene_atom2 = false;
            let even = self.nodes[alkene_parent].is_even_ene;
            self.nodes[alkene_parent].is_even_ene = !even;
        } else {
            self.nodes[id].is_alkene_atom2 = true;
        }
    }

    /// Shallow copy sharing the children and the path map of `id`, with its
    /// ranking and auxiliary state cleared.
    pub fn clone_node(&mut self, id: NodeId) -> NodeId {
        let serial = self.next_serial();
        let mut node = self.nodes[id].clone();
        node.serial = serial;
        node.priorities = [0; 4];
        node.n_priorities = 0;
        node.alkene_parent = None;
        node.aux_ez = AuxEz::Unset;
        node.rule4_type = 0;
        node.bs_rs = None;
        self.push(node)
    }

    /// Orders the child list: real atoms before phantoms, then rule 1a,
    /// non-duplicates before duplicates, rule 1b among duplicates, rule 2.
    pub fn sort_natural(&mut self, id: NodeId) {
        let mut atoms = self.nodes[id].atoms;
        // Stable insertion sort; four slots at most.
        for i in 1..atoms.len() {
            let mut j = i;
            while j > 0 && self.natural_cmp(atoms[j], atoms[j - 1]) == Ordering::Less {
                atoms.swap(j, j - 1);
                j -= 1;
            }
        }
        self.nodes[id].atoms = atoms;
    }

    fn natural_cmp(&self, x: Option<NodeId>, y: Option<NodeId>) -> Ordering {
        let (x, y) = match (x, y) {
            (None, None) => return Ordering::Equal,
            (None, Some(_)) => return Ordering::Greater,
            (Some(_), None) => return Ordering::Less,
            (Some(x), Some(y)) => (x, y),
        };
        let (nx, ny) = (&self.nodes[x], &self.nodes[y]);
        match (nx.is_phantom(), ny.is_phantom()) {
            (true, true) => return Ordering::Equal,
            (true, false) => return Ordering::Greater,
            (false, true) => return Ordering::Less,
            _ => {}
        }
        self.rule1a(x, y)
            .then_with(|| duplicate_cmp(nx, ny))
            .then_with(|| {
                if nx.is_duplicate {
                    self.rule1b(x, y)
                } else {
                    Ordering::Equal
                }
            })
            .then_with(|| self.rule2(x, y))
    }
}

/// Non-duplicates outrank duplicates.
pub(crate) fn duplicate_cmp(x: &CipNode, y: &CipNode) -> Ordering {
    match (x.is_duplicate, y.is_duplicate) {
        (false, true) => Ordering::Less,
        (true, false) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}
