use serde::{Deserialize, Serialize};

const DAMPING_FLOOR: f32 = 1.0e-4;
const DAMPING_CEILING: f32 = 1.0 - 1.0e-4;

/// Tunables for the force simulation, read fresh every frame.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ForceSettings {
    /// Stiffness of the spring between entities sharing a visible label.
    pub spring_constant: f32,
    /// Strength of the inverse-square push between unrelated entities.
    pub repulsion_coefficient: f32,
    /// Rest length of the spring.
    pub ideal_distance: f32,
    /// Pull of every entity toward the origin.
    pub center_strength: f32,
    /// Per-tick velocity multiplier.
    pub damping: f32,
    pub max_velocity: f32,
    pub max_bound_radius: f32,
    pub show_relationships: bool,
}

impl Default for ForceSettings {
    fn default() -> Self {
        Self {
            spring_constant: 2.0,
            repulsion_coefficient: 0.1,
            ideal_distance: 3.0,
            center_strength: 0.02,
            damping: 0.95,
            max_velocity: 5.0,
            max_bound_radius: 10.0,
            show_relationships: true,
        }
    }
}

impl ForceSettings {
    /// Copy that cannot drive the simulation into non-finite state: non-finite
    /// fields fall back to defaults, damping lands strictly inside `(0, 1)`,
    /// and repulsion and both caps are non-negative. Infinite caps are kept.
    pub fn sanitized(&self) -> Self {
        let defaults = Self::default();
        let finite_or = |value: f32, fallback: f32| {
            if value.is_finite() { value } else { fallback }
        };
        let cap_or = |value: f32, fallback: f32| {
            if value.is_nan() {
                fallback
            } else {
                value.max(0.0)
            }
        };

        Self {
            spring_constant: finite_or(self.spring_constant, defaults.spring_constant),
            repulsion_coefficient: finite_or(
                self.repulsion_coefficient,
                defaults.repulsion_coefficient,
            )
            .max(0.0),
            ideal_distance: finite_or(self.ideal_distance, defaults.ideal_distance),
            center_strength: finite_or(self.center_strength, defaults.center_strength),
            damping: finite_or(self.damping, defaults.damping).clamp(DAMPING_FLOOR, DAMPING_CEILING),
            max_velocity: cap_or(self.max_velocity, defaults.max_velocity),
            max_bound_radius: cap_or(self.max_bound_radius, defaults.max_bound_radius),
            show_relationships: self.show_relationships,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn damping_is_forced_into_open_unit_interval() {
        for raw in [-3.0, 0.0, 1.0, 1.5, f32::NAN, f32::INFINITY] {
            let damping = ForceSettings {
                damping: raw,
                ..ForceSettings::default()
            }
            .sanitized()
            .damping;
            assert!(damping > 0.0 && damping < 1.0, "{raw} -> {damping}");
        }

        let untouched = ForceSettings::default().sanitized();
        assert_eq!(untouched, ForceSettings::default());
    }

    #[test]
    fn non_finite_and_negative_values_are_replaced() {
        let settings = ForceSettings {
            spring_constant: f32::NAN,
            repulsion_coefficient: -4.0,
            ideal_distance: f32::NEG_INFINITY,
            center_strength: f32::INFINITY,
            max_velocity: -1.0,
            max_bound_radius: f32::NAN,
            ..ForceSettings::default()
        }
        .sanitized();

        let defaults = ForceSettings::default();
        assert_eq!(settings.spring_constant, defaults.spring_constant);
        assert_eq!(settings.repulsion_coefficient, 0.0);
        assert_eq!(settings.ideal_distance, defaults.ideal_distance);
        assert_eq!(settings.center_strength, defaults.center_strength);
        assert_eq!(settings.max_velocity, 0.0);
        assert_eq!(settings.max_bound_radius, defaults.max_bound_radius);
    }

    #[test]
    fn deserializes_camel_case_with_defaults() {
        let settings: ForceSettings =
            serde_json::from_str(r#"{"springConstant": 1.5, "showRelationships": false}"#).unwrap();
        assert_eq!(settings.spring_constant, 1.5);
        assert!(!settings.show_relationships);
        assert_eq!(settings.ideal_distance, 3.0);
    }
}
