//! Element data needed by the sequence rules: average atomic masses and the
//! isotope exceptions of rule 2.

// IUPAC CIAAW 2021 standard atomic weights, Z = 1..=118. Elements without a
// stable isotope carry the mass number of their longest-lived isotope.
#[rustfmt::skip]
static ATOMIC_WEIGHTS: [f64; 118] = [
    1.008, 4.002602, 6.94, 9.0121831, 10.81, 12.011, 14.007, 15.999, 18.998403163, 20.1797,
    22.98976928, 24.305, 26.9815384, 28.085, 30.973761998, 32.06, 35.45, 39.948, 39.0983, 40.078,
    44.955908, 47.867, 50.9415, 51.9961, 54.938043, 55.845, 58.933194, 58.6934, 63.546, 65.38,
    69.723, 72.630, 74.921595, 78.971, 79.904, 83.798, 85.4678, 87.62, 88.90584, 91.224,
    92.90637, 95.95, 97.0, 101.07, 102.90549, 106.42, 107.8682, 112.414, 114.818, 118.710,
    121.760, 127.60, 126.90447, 131.293, 132.90545196, 137.327, 138.90547, 140.116, 140.90766, 144.242,
    145.0, 150.36, 151.964, 157.25, 158.925354, 162.500, 164.930328, 167.259, 168.934218, 173.045,
    174.9668, 178.486, 180.94788, 183.84, 186.207, 190.23, 192.217, 195.084, 196.966570, 200.592,
    204.38, 207.2, 208.98040, 209.0, 210.0, 222.0, 223.0, 226.0, 227.0, 232.0377,
    231.03588, 238.02891, 237.0, 244.0, 243.0, 247.0, 247.0, 251.0, 252.0, 257.0,
    258.0, 259.0, 266.0, 267.0, 268.0, 269.0, 270.0, 277.0, 278.0, 281.0,
    282.0, 285.0, 286.0, 289.0, 290.0, 293.0, 294.0, 294.0,
];

// (mass number, Z) of isotopes that make up (practically) all of their
// element. Naming one explicitly is the same as naming the element.
#[rustfmt::skip]
const MONOISOTOPIC: [(u16, u8); 30] = [
    (9, 4), (19, 9), (23, 11), (27, 13), (31, 15), (45, 21), (55, 25), (59, 27),
    (75, 33), (89, 39), (93, 41), (98, 43), (103, 45), (127, 53), (133, 55), (141, 59),
    (145, 61), (159, 65), (165, 67), (169, 69), (197, 79), (209, 83), (209, 84), (210, 85),
    (222, 86), (223, 87), (226, 88), (227, 89), (231, 91), (232, 90),
];

// Isotopes whose mass number is above the element's average mass although the
// isotope itself is the lighter one.
const REVERSED: [(u16, u8); 5] = [(4, 2), (16, 8), (52, 24), (96, 42), (175, 71)];

/// Standard atomic weight of element `atomic_num`, or `0.0` when unknown.
pub fn average_mass(atomic_num: u8) -> f64 {
    match atomic_num {
        1..=118 => ATOMIC_WEIGHTS[atomic_num as usize - 1],
        _ => 0.0,
    }
}

/// Mass of an atom as used by rule 2: the isotope mass number when one is
/// given, else the average atomic mass.
pub fn atom_mass(atomic_num: u8, isotope: u16) -> f64 {
    if isotope > 0 {
        isotope as f64
    } else {
        average_mass(atomic_num)
    }
}

/// How an integral mass must be treated when comparing by rule 2.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IsotopeClass {
    /// Compare the mass as given.
    Plain,
    /// Compare using the element's average mass.
    Average,
    /// Compare with the direction reversed.
    Reversed,
}

pub fn isotope_class(mass_number: u16, atomic_num: u8) -> IsotopeClass {
    if REVERSED.contains(&(mass_number, atomic_num)) {
        IsotopeClass::Reversed
    } else if atomic_num > 92 || MONOISOTOPIC.contains(&(mass_number, atomic_num)) {
        IsotopeClass::Average
    } else {
        IsotopeClass::Plain
    }
}

/// Li through Ne.
pub fn is_first_row(atomic_num: u8) -> bool {
    (3..=10).contains(&atomic_num)
}
