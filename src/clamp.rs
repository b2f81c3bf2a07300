//! Clamping of galaxy properties to the validity limits of a model.

use crate::{
    galaxy::{Component, GalaxyProperties},
    limits::PropertyLimits,
};
use log::debug;
use ndarray::prelude::*;

/// Clamps a value to the given closed interval.
///
/// NaN is returned unchanged so that later stages can report it.
pub fn clamp<F: num::Float>(value: F, lower: F, upper: F) -> F {
    if value < lower {
        lower
    } else if value > upper {
        upper
    } else {
        value
    }
}

/// Clamps every value of the array to the given closed interval.
pub fn clamp_values<F: num::Float>(mut values: ArrayViewMut1<F>, lower: F, upper: F) {
    values.mapv_inplace(|value| clamp(value, lower, upper));
}

/// Clamps the properties of both components of every galaxy to the given limits.
///
/// Galaxy properties are stored in log10, so limits tabulated on a linear
/// scale are converted before clamping.
pub fn clamp_galaxy_properties(properties: &mut GalaxyProperties, limits: &[PropertyLimits]) {
    for component in Component::ALL {
        for property_limits in limits {
            let (lower, upper) = property_limits.on_log_scale();
            debug!(
                "Clamping {} {} to [{}, {}]",
                component, property_limits.property, lower, upper
            );
            clamp_values(
                properties
                    .component_mut(component)
                    .values_mut(property_limits.property)
                    .view_mut(),
                lower,
                upper,
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        constants::fem,
        galaxy::ComponentProperties,
        model::{LimitScale, Property},
    };
    use approx::assert_abs_diff_eq;

    #[test]
    fn values_inside_range_are_unchanged() {
        for &value in &[-4.0, -3.3, -1.0] {
            assert_eq!(clamp(value, -4.0, -1.0), value);
        }
    }

    #[test]
    fn values_outside_range_are_moved_to_bounds() {
        assert_eq!(clamp(-7.0, -4.0, -1.0), -4.0);
        assert_eq!(clamp(0.5, -4.0, -1.0), -1.0);
        assert_eq!(clamp(f64::NEG_INFINITY, -4.0, -1.0), -4.0);
    }

    #[test]
    fn clamping_is_idempotent() {
        let mut values = array![-10.0, -4.0, -2.2, -1.0, 3.0];
        clamp_values(values.view_mut(), -4.0, -1.0);
        let once = values.clone();
        clamp_values(values.view_mut(), -4.0, -1.0);
        assert_eq!(values, once);
        assert_eq!(once, array![-4.0, -4.0, -2.2, -1.0, -1.0]);
    }

    #[test]
    fn nan_passes_through() {
        assert!(clamp(f64::NAN, 1.0, 4.0).is_nan());
    }

    #[test]
    fn galaxy_properties_are_clamped_per_property() {
        let disk = ComponentProperties::new(
            array![-5.0, -2.0],
            array![0.5, 4.5],
            array![fem::log10(0.05), fem::log10(0.01)],
        )
        .unwrap();
        let bulge = ComponentProperties::new(
            array![0.0, -3.0],
            array![f64::NAN, 2.0],
            array![fem::log10(0.00001), fem::log10(0.02)],
        )
        .unwrap();
        let mut properties = GalaxyProperties::new(disk, bulge).unwrap();

        let limits = [
            PropertyLimits::new(Property::IonizationParameter, -4.0, -1.0, LimitScale::Log10)
                .unwrap(),
            PropertyLimits::new(Property::Metallicity, 0.0001, 0.040, LimitScale::Linear).unwrap(),
            PropertyLimits::new(Property::ElectronDensity, 1.0, 4.0, LimitScale::Log10).unwrap(),
        ];
        clamp_galaxy_properties(&mut properties, &limits);

        let disk = properties.component(Component::Disk);
        assert_eq!(disk.log_u(), &array![-4.0, -2.0]);
        assert_eq!(disk.log_ne(), &array![1.0, 4.0]);
        assert_abs_diff_eq!(10f64.powf(disk.log_z()[0]), 0.040, epsilon = 1e-12);
        assert_abs_diff_eq!(10f64.powf(disk.log_z()[1]), 0.01, epsilon = 1e-12);

        let bulge = properties.component(Component::Bulge);
        assert_eq!(bulge.log_u(), &array![-1.0, -3.0]);
        assert!(bulge.log_ne()[0].is_nan());
        assert_abs_diff_eq!(10f64.powf(bulge.log_z()[0]), 0.0001, epsilon = 1e-12);
    }
}
