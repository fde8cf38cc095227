//! CIP descriptor assignment.
//!
//! [`find_cip_labels`] perceives small rings, Kekulé-ambiguous rings and
//! bridgehead nitrogens once, filters the candidate atoms, then ranks the
//! substituents of each candidate through rules 1a to 6 on a hierarchical
//! digraph rooted at that atom. Double bonds, cumulenes and atropisomeric
//! bonds are handled afterwards from both of their ends.

mod auxiliary;
mod bond_stereo;
mod node;
mod rules;


use fixedbitset::FixedBitSet;
use petgraph::graph::NodeIndex;
use tracing::{debug, trace, warn};

use crate::aromaticity::find_kekule_ambiguous;
use crate::azacyclic::find_azacyclic;
use crate::candidates::{could_be_chiral_alkene, could_be_chiral_atom, AlkeneRole};
use crate::descriptor::{CipRule, Stereo, StereoDescriptor};
use crate::error::CipError;
use crate::mol::Mol;
use crate::rings::SmallRings;
use crate::traits::{HasAtomicNum, HasBondOrder, HasIsotope, HasPosition3D, HasStereoDescriptor};

use auxiliary::auxiliary_atoms;
use bond_stereo::{clear_small_ring_ez, BondEvaluator};
use node::{Digraph, NodeId, Pass};
use rules::Hand;

/// How rule 1b measures the distance of a multiple-bond duplicate from the
/// root.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Rule1bPolicy {
    /// Treat it like any other duplicate.
    Unchanged,
    /// One sphere closer than its position, i.e. at its parent's distance.
    #[default]
    DecrementParent,
    /// Its own sphere, without path bookkeeping.
    SelfDistance,
    /// As [`Unchanged`](Self::Unchanged), but rule 1b does not apply below
    /// an alkene atom.
    IgnoreAlkene,
    /// [`SelfDistance`](Self::SelfDistance) for Kekulé-ambiguous atoms only.
    SelfDistanceKekule,
}

/// Tunables of the rule engine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CipOptions {
    pub rule1b: Rule1bPolicy,
    /// Digraph nodes at this sphere or deeper are not expanded.
    pub max_sphere: usize,
}

impl Default for CipOptions {
    fn default() -> Self {
        Self {
            rule1b: Rule1bPolicy::default(),
            max_sphere: 50,
        }
    }
}

impl CipOptions {
    pub fn with_rule1b(mut self, rule1b: Rule1bPolicy) -> Self {
        self.rule1b = rule1b;
        self
    }

    pub fn with_max_sphere(mut self, max_sphere: usize) -> Self {
        self.max_sphere = max_sphere;
        self
    }
}

/// Which atoms to label, plus stereo the caller already knows.
///
/// ```
/// use crabcip::CipRequest;
///
/// let request = CipRequest::atoms([3])
///     .with_atropisomeric([5, 6])
///     .with_auxiliary(true);
/// assert_eq!(request.atoms, Some(vec![3]));
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CipRequest {
    /// Atoms to evaluate; `None` evaluates every atom.
    pub atoms: Option<Vec<usize>>,
    /// Atoms at the ends of atropisomeric single bonds.
    pub atropisomeric: Vec<usize>,
    /// Atoms labelled M from a known helix.
    pub helix_m: Vec<usize>,
    /// Atoms labelled P from a known helix.
    pub helix_p: Vec<usize>,
    /// Also report the auxiliary descriptors found below the centre. Only
    /// honoured when exactly one atom is evaluated.
    pub set_auxiliary: bool,
}

impl CipRequest {
    pub fn all() -> Self {
        Self::default()
    }

    pub fn atoms(atoms: impl IntoIterator<Item = usize>) -> Self {
        Self {
            atoms: Some(atoms.into_iter().collect()),
            ..Self::default()
        }
    }

    pub fn with_atropisomeric(mut self, atoms: impl IntoIterator<Item = usize>) -> Self {
        self.atropisomeric = atoms.into_iter().collect();
        self
    }

    pub fn with_helix_m(mut self, atoms: impl IntoIterator<Item = usize>) -> Self {
        self.helix_m = atoms.into_iter().collect();
        self
    }

    pub fn with_helix_p(mut self, atoms: impl IntoIterator<Item = usize>) -> Self {
        self.helix_p = atoms.into_iter().collect();
        self
    }

    pub fn with_auxiliary(mut self, set_auxiliary: bool) -> Self {
        self.set_auxiliary = set_auxiliary;
        self
    }

    fn bitset(atoms: &[usize], atom_count: usize) -> Result<FixedBitSet, CipError> {
        let mut bs = FixedBitSet::with_capacity(atom_count);
        for &index in atoms {
            if index >= atom_count {
                return Err(CipError::AtomOutOfRange { index, atom_count });
            }
            bs.insert(index);
        }
        Ok(bs)
    }

    fn selected(&self, atom_count: usize) -> Result<FixedBitSet, CipError> {
        match &self.atoms {
            Some(atoms) => Self::bitset(atoms, atom_count),
            None => {
                let mut bs = FixedBitSet::with_capacity(atom_count);
                bs.insert_range(..);
                Ok(bs)
            }
        }
    }
}

/// Result of one labelling run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CipLabels {
    /// Descriptor per atom, indexed like the molecule.
    pub atoms: Vec<StereoDescriptor>,
    /// End atoms of the double bonds and cumulenes that were labelled,
    /// lower index first.
    pub bonds: Vec<(usize, usize)>,
    /// Small rings found around the evaluated atoms.
    pub rings: Vec<Vec<usize>>,
    pub kekule_ambiguous: Vec<usize>,
}

impl CipLabels {
    pub fn get(&self, atom: usize) -> StereoDescriptor {
        self.atoms.get(atom).copied().unwrap_or_default()
    }

    /// The printable label of `atom`, empty when it has none.
    pub fn label(&self, atom: usize) -> &'static str {
        self.get(atom).label()
    }
}

/// Molecule-wide facts computed once per run and read by every digraph.
#[derive(Debug, Clone, Default)]
pub(crate) struct Perception {
    pub rings: SmallRings,
    pub kekule_ambiguous: FixedBitSet,
    pub azacyclic: FixedBitSet,
}

impl Perception {
    pub fn perceive<A, B>(mol: &Mol<A, B>, atoms: &FixedBitSet) -> Self
    where
        A: HasAtomicNum,
        B: HasBondOrder,
    {
        let rings = SmallRings::find(mol, atoms);
        let kekule_ambiguous = find_kekule_ambiguous(mol, &rings);
        let azacyclic = find_azacyclic(mol, atoms, &rings, &kekule_ambiguous);
        Self {
            rings,
            kekule_ambiguous,
            azacyclic,
        }
    }
}

/// How a run of the sequence rules ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Outcome {
    Undetermined,
    Centre { hand: Hand, pseudo: bool, rule: CipRule },
    /// Bond-end ranking: the slot of the top substituent.
    Top { index: usize, rule: CipRule },
}

impl<'a, A, B> Digraph<'a, A, B>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    /// Applies rules 1a to 6 in turn to the children of `root` until one
    /// separates them all. With `end_check` the root is a bond end and only
    /// its top substituent is wanted.
    pub(crate) fn run_rules(&mut self, root: NodeId, end_check: bool) -> Result<Outcome, CipError> {
        if !self.set_node(root) {
            return Ok(Outcome::Undetermined);
        }
        let mut i = 0;
        while let Some(&rule) = CipRule::ALL.get(i) {
            self.rule = rule;
            trace!("{} for atom {}", rule, self.root_atom_index());
            let mut rule6 = None;
            match rule {
                CipRule::Rule3 => {
                    self.create_auxiliary(root, None, false)?;
                }
                CipRule::Rule4a if self.nodes[root].rule4_type == 0 => {
                    i = CipRule::ALL.len() - 1;
                    continue;
                }
                CipRule::Rule4a | CipRule::Rule4b | CipRule::Rule4c => {
                    self.sort_substituents(root, Pass::Prepare)?;
                }
                CipRule::Rule6 => {
                    rule6 = self.setup_rule6(root, false)?;
                    if rule6.is_none() {
                        i += 1;
                        continue;
                    }
                }
                _ => {}
            }

            let previous = self.nodes[root].n_priorities;
            let settled = match rule6 {
                Some(_) => true,
                None => self.sort_substituents(root, Pass::Sphere(0))?,
            };
            if settled {
                if end_check {
                    let index = self.nodes[root].atoms[0].map_or(0, |c| usize::from(self.nodes[c].is_duplicate));
                    return Ok(Outcome::Top { index, rule });
                }
                let hand = match rule6 {
                    Some(hand) => Some(hand),
                    None => self.handedness(root)?,
                };
                let Some(hand) = hand else {
                    return Ok(Outcome::Undetermined);
                };
                let pseudo = rule == CipRule::Rule5 && (self.nodes[root].n_priorities != 4 || previous != 2);
                return Ok(Outcome::Centre { hand, pseudo, rule });
            }
            i += 1;
        }
        Ok(Outcome::Undetermined)
    }

    /// Descriptor of a stereocentre at `atom`, or `None` when no rule
    /// separates its substituents.
    pub(crate) fn atom_chirality(&mut self, atom: NodeIndex) -> Result<Option<StereoDescriptor>, CipError> {
        let root = self.create(Some(atom), None, false, false, false);
        self.root = root;
        if !self.nodes[root].is_sp3 {
            return Ok(None);
        }
        Ok(match self.run_rules(root, false)? {
            Outcome::Centre { hand, pseudo, rule } => {
                let stereo = match (hand, pseudo) {
                    (Hand::R, false) => Stereo::R,
                    (Hand::S, false) => Stereo::S,
                    (Hand::R, true) => Stereo::PseudoR,
                    (Hand::S, true) => Stereo::PseudoS,
                };
                Some(StereoDescriptor::new(stereo, rule))
            }
            _ => None,
        })
    }
}

/// Computes CIP descriptors for the requested atoms and the double bonds
/// and atropisomeric bonds among them.
///
/// Atoms that are not candidates keep [`StereoDescriptor::NONE`].
/// Candidates that no rule can settle get [`Stereo::BothRs`]. A fault in
/// one atom's or bond's evaluation (such as missing coordinates) is logged
/// and confined to that atom or bond.
///
/// # Errors
///
/// [`CipError::AtomOutOfRange`] when the request names an atom the molecule
/// does not have.
pub fn find_cip_labels<A, B>(mol: &Mol<A, B>, request: &CipRequest, options: &CipOptions) -> Result<CipLabels, CipError>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D,
    B: HasBondOrder,
{
    let n = mol.atom_count();
    let selected = request.selected(n)?;
    let atropisomeric = CipRequest::bitset(&request.atropisomeric, n)?;
    let helix_m = CipRequest::bitset(&request.helix_m, n)?;
    let helix_p = CipRequest::bitset(&request.helix_p, n)?;

    let mut labels = CipLabels {
        atoms: vec![StereoDescriptor::NONE; n],
        ..CipLabels::default()
    };
    if selected.count_ones(..) == 0 {
        return Ok(labels);
    }
    let set_auxiliary = request.set_auxiliary && selected.count_ones(..) == 1;

    let mut perception = Perception::perceive(mol, &selected);
    labels.rings = perception.rings.to_vecs();
    labels.kekule_ambiguous = perception.kekule_ambiguous.ones().collect();
    debug!("small rings: {:?}", labels.rings);
    debug!("kekule-ambiguous atoms: {:?}", labels.kekule_ambiguous);

    let mut todo = selected.clone();
    let mut have_alkenes = false;
    for i in selected.ones() {
        let atom = NodeIndex::new(i);
        match could_be_chiral_atom(mol, atom, &perception.azacyclic) {
            Ok(true) => {
                if !have_alkenes && could_be_chiral_alkene(mol, atom, None) != AlkeneRole::NotCandidate {
                    have_alkenes = true;
                }
            }
            Ok(false) => todo.set(i, false),
            Err(e) => {
                warn!("atom {} not evaluated: {}", i, e);
                labels.atoms[i] = StereoDescriptor::bare(Stereo::BothRs);
                todo.set(i, false);
            }
        }
    }

    for i in todo.ones() {
        let mut dg = Digraph::new(mol, &perception, options);
        dg.set_auxiliary = set_auxiliary;
        let result = dg.atom_chirality(NodeIndex::new(i));
        for (atom, stereo) in auxiliary_atoms(&dg.aux_labels) {
            labels.atoms[atom] = StereoDescriptor::bare(stereo);
        }
        labels.atoms[i] = match result {
            Ok(Some(descriptor)) => descriptor,
            Ok(None) => StereoDescriptor::bare(Stereo::BothRs),
            Err(e) => {
                warn!("atom {} left undetermined: {}", i, e);
                StereoDescriptor::bare(Stereo::BothRs)
            }
        };
        debug!(
            "atom {}: {:?} by {}",
            i,
            labels.atoms[i].stereo,
            labels.atoms[i].rule.map_or("no rule", CipRule::name)
        );
    }

    if have_alkenes {
        let evaluator = BondEvaluator {
            mol,
            perception: &perception,
            options,
            atropisomeric: &atropisomeric,
        };
        labels.bonds = evaluator.evaluate(&mut todo, &mut labels.atoms);
        if !perception.rings.is_empty() && !labels.bonds.is_empty() {
            clear_small_ring_ez(&mut perception.rings, &atropisomeric, &labels.bonds, &mut labels.atoms);
        }
        for i in helix_m.ones() {
            labels.atoms[i] = StereoDescriptor::bare(Stereo::M);
        }
        for i in helix_p.ones() {
            labels.atoms[i] = StereoDescriptor::bare(Stereo::P);
        }
    }

    Ok(labels)
}

/// Labels every atom of `mol` and stores each descriptor on its atom.
///
/// # Errors
///
/// Never fails for a whole-molecule request; the `Result` mirrors
/// [`find_cip_labels`].
pub fn assign_cip_labels<A, B>(mol: &mut Mol<A, B>, options: &CipOptions) -> Result<CipLabels, CipError>
where
    A: HasAtomicNum + HasIsotope + HasPosition3D + HasStereoDescriptor,
    B: HasBondOrder,
{
    let labels = find_cip_labels(mol, &CipRequest::all(), options)?;
    for (i, &descriptor) in labels.atoms.iter().enumerate() {
        mol.atom_mut(NodeIndex::new(i)).set_stereo_descriptor(descriptor);
    }
    Ok(labels)
}
