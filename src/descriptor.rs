//! CIP descriptors and their packed integer codes.
//!
//! The low five bits of a code hold the stereo flags, and bits 5 and up hold
//! the deciding rule's [`CipRule::number`] (0 when no rule decided it):
//!
//! | flag | meaning |
//! |------|---------|
//! | 1, 2 | R, S (3 = both, undetermined) |
//! | 4    | E/Z (Z = 5, E = 6, both = 7) |
//! | 8    | pseudo-asymmetric, lowercase (r = 9, s = 10) |
//! | 16   | axial (M = 17, P = 18, m = 25, p = 26) |

use std::fmt;

/// The sequence rules, in application order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum CipRule {
    Rule1a,
    Rule1b,
    Rule2,
    Rule3,
    Rule4a,
    Rule4b,
    Rule4c,
    Rule5,
    Rule6,
}

impl CipRule {
    pub const ALL: [CipRule; 9] = [
        CipRule::Rule1a,
        CipRule::Rule1b,
        CipRule::Rule2,
        CipRule::Rule3,
        CipRule::Rule4a,
        CipRule::Rule4b,
        CipRule::Rule4c,
        CipRule::Rule5,
        CipRule::Rule6,
    ];

    /// One-based position in [`CipRule::ALL`] (1a = 1 … 6 = 9).
    pub fn number(self) -> u8 {
        self as u8 + 1
    }

    pub fn from_number(n: u8) -> Option<Self> {
        n.checked_sub(1)
            .and_then(|i| Self::ALL.get(i as usize))
            .copied()
    }

    pub fn name(self) -> &'static str {
        match self {
            CipRule::Rule1a => "1a",
            CipRule::Rule1b => "1b",
            CipRule::Rule2 => "2",
            CipRule::Rule3 => "3",
            CipRule::Rule4a => "4a",
            CipRule::Rule4b => "4b",
            CipRule::Rule4c => "4c",
            CipRule::Rule5 => "5",
            CipRule::Rule6 => "6",
        }
    }
}

impl fmt::Display for CipRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "rule {}", self.name())
    }
}

pub(crate) const FLAG_R: u32 = 1;
pub(crate) const FLAG_S: u32 = 2;
pub(crate) const FLAG_EZ: u32 = 4;
pub(crate) const FLAG_PSEUDO: u32 = 8;
pub(crate) const FLAG_AXIAL: u32 = 16;
const STEREO_MASK: u32 = 0x1F;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Stereo {
    #[default]
    None,
    R,
    S,
    /// Pseudo-asymmetric `r`.
    PseudoR,
    /// Pseudo-asymmetric `s`.
    PseudoS,
    Z,
    E,
    M,
    P,
    PseudoM,
    PseudoP,
    /// Stereogenic candidate whose substituents could not be separated.
    BothRs,
    BothEz,
}

impl Stereo {
    pub fn flags(self) -> u32 {
        match self {
            Stereo::None => 0,
            Stereo::R => FLAG_R,
            Stereo::S => FLAG_S,
            Stereo::BothRs => FLAG_R | FLAG_S,
            Stereo::Z => FLAG_EZ | FLAG_R,
            Stereo::E => FLAG_EZ | FLAG_S,
            Stereo::BothEz => FLAG_EZ | FLAG_R | FLAG_S,
            Stereo::PseudoR => FLAG_PSEUDO | FLAG_R,
            Stereo::PseudoS => FLAG_PSEUDO | FLAG_S,
            Stereo::M => FLAG_AXIAL | FLAG_R,
            Stereo::P => FLAG_AXIAL | FLAG_S,
            Stereo::PseudoM => FLAG_AXIAL | FLAG_PSEUDO | FLAG_R,
            Stereo::PseudoP => FLAG_AXIAL | FLAG_PSEUDO | FLAG_S,
        }
    }

    pub fn from_flags(flags: u32) -> Option<Self> {
        Some(match flags {
            0 => Stereo::None,
            1 => Stereo::R,
            2 => Stereo::S,
            3 => Stereo::BothRs,
            5 => Stereo::Z,
            6 => Stereo::E,
            7 => Stereo::BothEz,
            9 => Stereo::PseudoR,
            10 => Stereo::PseudoS,
            17 => Stereo::M,
            18 => Stereo::P,
            25 => Stereo::PseudoM,
            26 => Stereo::PseudoP,
            _ => return None,
        })
    }

    pub fn label(self) -> &'static str {
        match self {
            Stereo::None | Stereo::BothRs | Stereo::BothEz => "",
            Stereo::R => "R",
            Stereo::S => "S",
            Stereo::PseudoR => "r",
            Stereo::PseudoS => "s",
            Stereo::Z => "Z",
            Stereo::E => "E",
            Stereo::M => "M",
            Stereo::P => "P",
            Stereo::PseudoM => "m",
            Stereo::PseudoP => "p",
        }
    }

    /// `true` for the two undetermined outcomes.
    pub fn is_undetermined(self) -> bool {
        matches!(self, Stereo::BothRs | Stereo::BothEz)
    }

    /// `true` for any R/S, r/s, Z/E, M/P or m/p result.
    pub fn is_determined(self) -> bool {
        !matches!(self, Stereo::None | Stereo::BothRs | Stereo::BothEz)
    }

    /// The descriptor of the same centre in the mirror-image molecule.
    /// Pseudo-asymmetric labels are reflection invariant.
    pub fn mirrored(self) -> Self {
        match self {
            Stereo::R => Stereo::S,
            Stereo::S => Stereo::R,
            Stereo::M => Stereo::P,
            Stereo::P => Stereo::M,
            other => other,
        }
    }
}

impl fmt::Display for Stereo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// A stereo label together with the rule that decided it.
///
/// ```
/// use crabcip::{CipRule, Stereo, StereoDescriptor};
///
/// let d = StereoDescriptor::new(Stereo::PseudoS, CipRule::Rule5);
/// assert_eq!(d.code(), 10 | (8 << 5));
/// assert_eq!(StereoDescriptor::from_code(d.code()), Some(d));
/// assert_eq!(d.to_string(), "s");
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub struct StereoDescriptor {
    pub stereo: Stereo,
    pub rule: Option<CipRule>,
}

impl StereoDescriptor {
    pub const NONE: StereoDescriptor = StereoDescriptor {
        stereo: Stereo::None,
        rule: None,
    };

    pub fn new(stereo: Stereo, rule: CipRule) -> Self {
        Self {
            stereo,
            rule: Some(rule),
        }
    }

    /// A label with no deciding rule, such as an undetermined centre or a
    /// helix override.
    pub fn bare(stereo: Stereo) -> Self {
        Self { stereo, rule: None }
    }

    pub fn code(self) -> u32 {
        let rule = self.rule.map_or(0, |r| u32::from(r.number()));
        self.stereo.flags() | (rule << 5)
    }

    /// Decodes a packed code. A rule field of zero means no deciding rule,
    /// which is how undetermined labels and helix overrides are stored.
    pub fn from_code(code: u32) -> Option<Self> {
        let stereo = Stereo::from_flags(code & STEREO_MASK)?;
        let rule_bits = code >> 5;
        if rule_bits == 0 {
            return Some(Self::bare(stereo));
        }
        if !stereo.is_determined() {
            return None;
        }
        let rule = u8::try_from(rule_bits).ok().and_then(CipRule::from_number)?;
        Some(Self::new(stereo, rule))
    }

    pub fn label(self) -> &'static str {
        self.stereo.label()
    }
}

impl fmt::Display for StereoDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}
