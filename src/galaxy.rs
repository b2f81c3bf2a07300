//! Physical properties of the stellar components of simulated galaxies.

use crate::{
    constants::{self, fem},
    error::{NebularError, Result},
    model::Property,
};
use ndarray::prelude::*;
use std::fmt;

/// A stellar component of a galaxy.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Component {
    Disk,
    Bulge,
}

impl Component {
    pub const ALL: [Component; 2] = [Component::Disk, Component::Bulge];

    pub fn name(&self) -> &'static str {
        match self {
            Component::Disk => "disk",
            Component::Bulge => "bulge",
        }
    }
}

impl fmt::Display for Component {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Per-galaxy properties of one stellar component, all in log10.
#[derive(Clone, Debug, PartialEq)]
pub struct ComponentProperties {
    log_u: Array1<fem>,
    log_ne: Array1<fem>,
    log_z: Array1<fem>,
}

impl ComponentProperties {
    /// Creates component properties from the log10 of the ionization parameter,
    /// the electron density [cm^-3] and the metallicity mass fraction.
    pub fn new(log_u: Array1<fem>, log_ne: Array1<fem>, log_z: Array1<fem>) -> Result<Self> {
        if log_ne.len() != log_u.len() || log_z.len() != log_u.len() {
            return Err(NebularError::inconsistent_input(format!(
                "Property arrays have different lengths (U: {}, ne: {}, Z: {})",
                log_u.len(),
                log_ne.len(),
                log_z.len()
            )));
        }
        Ok(Self {
            log_u,
            log_ne,
            log_z,
        })
    }

    /// Creates component properties with the gas metallicity given as
    /// the oxygen abundance 12 + log10(O/H).
    pub fn from_oxygen_abundance(
        log_u: Array1<fem>,
        log_ne: Array1<fem>,
        oxygen_abundance: Array1<fem>,
    ) -> Result<Self> {
        let log_z = oxygen_abundance.mapv(constants::oxygen_abundance_to_log_metallicity);
        Self::new(log_u, log_ne, log_z)
    }

    pub fn n_galaxies(&self) -> usize {
        self.log_u.len()
    }

    pub fn log_u(&self) -> &Array1<fem> {
        &self.log_u
    }

    pub fn log_ne(&self) -> &Array1<fem> {
        &self.log_ne
    }

    pub fn log_z(&self) -> &Array1<fem> {
        &self.log_z
    }

    /// Returns the log10 values of the given property.
    pub fn values(&self, property: Property) -> &Array1<fem> {
        match property {
            Property::IonizationParameter => &self.log_u,
            Property::Metallicity => &self.log_z,
            Property::ElectronDensity => &self.log_ne,
        }
    }

    /// Returns the log10 values of the given property for modification.
    pub fn values_mut(&mut self, property: Property) -> &mut Array1<fem> {
        match property {
            Property::IonizationParameter => &mut self.log_u,
            Property::Metallicity => &mut self.log_z,
            Property::ElectronDensity => &mut self.log_ne,
        }
    }
}

/// Properties of the disk and bulge of a set of galaxies.
#[derive(Clone, Debug, PartialEq)]
pub struct GalaxyProperties {
    disk: ComponentProperties,
    bulge: ComponentProperties,
}

impl GalaxyProperties {
    pub fn new(disk: ComponentProperties, bulge: ComponentProperties) -> Result<Self> {
        if disk.n_galaxies() != bulge.n_galaxies() {
            return Err(NebularError::inconsistent_input(format!(
                "Disk has {} galaxies while bulge has {}",
                disk.n_galaxies(),
                bulge.n_galaxies()
            )));
        }
        Ok(Self { disk, bulge })
    }

    pub fn n_galaxies(&self) -> usize {
        self.disk.n_galaxies()
    }

    pub fn component(&self, component: Component) -> &ComponentProperties {
        match component {
            Component::Disk => &self.disk,
            Component::Bulge => &self.bulge,
        }
    }

    pub fn component_mut(&mut self, component: Component) -> &mut ComponentProperties {
        match component {
            Component::Disk => &mut self.disk,
            Component::Bulge => &mut self.bulge,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;

    #[test]
    fn oxygen_abundance_is_converted() {
        let properties = ComponentProperties::from_oxygen_abundance(
            array![-3.0],
            array![2.0],
            array![constants::OH_SUN],
        )
        .unwrap();
        assert_abs_diff_eq!(
            properties.log_z()[0],
            fem::log10(constants::Z_SUN),
            epsilon = 1e-12
        );
    }

    #[test]
    fn mismatched_lengths_are_rejected() {
        assert!(ComponentProperties::new(array![1.0, 2.0], array![1.0], array![1.0, 2.0]).is_err());

        let disk = ComponentProperties::new(array![1.0], array![1.0], array![1.0]).unwrap();
        let bulge =
            ComponentProperties::new(array![1.0, 2.0], array![1.0, 2.0], array![1.0, 2.0]).unwrap();
        assert!(matches!(
            GalaxyProperties::new(disk, bulge),
            Err(NebularError::InconsistentInput { .. })
        ));
    }

    #[test]
    fn values_are_selected_by_property() {
        let mut properties =
            ComponentProperties::new(array![-3.0], array![2.0], array![-2.0]).unwrap();
        assert_eq!(properties.values(Property::ElectronDensity)[0], 2.0);
        properties.values_mut(Property::Metallicity)[0] = -1.5;
        assert_eq!(properties.log_z()[0], -1.5);
    }
}
