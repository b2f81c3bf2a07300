//! Physical constants and reference values.

/// Floating-point precision to use for emission-line computations.
#[allow(non_camel_case_types)]
pub type fem = f64;

// Solar reference abundances (Asplund et al. 2009)

/// Solar oxygen abundance, 12 + log10(O/H).
pub const OH_SUN: fem = 8.69;
/// Solar metallicity mass fraction.
pub const Z_SUN: fem = 0.0134;

// Units

/// Human-readable description of the emission-line luminosity unit.
pub const LINE_LUMINOSITY_UNIT: &str =
    "3.826e33 erg/s per unit SFR(Msun/yr) for an age of 1e8 yr";

/// Converts a gas-phase oxygen abundance 12 + log10(O/H) into log10 of
/// the metallicity mass fraction, scaling with the solar reference values.
pub fn oxygen_abundance_to_log_metallicity(oxygen_abundance: fem) -> fem {
    oxygen_abundance - OH_SUN + fem::log10(Z_SUN)
}
