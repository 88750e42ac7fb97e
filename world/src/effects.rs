//! Live tower effects and their motion.

use std::time::Duration;

use garden_defence_core::{Coordinate, EffectId, EffectKind, EffectSnapshot};

/// Effect travelling from a tower toward a captured point.
///
/// Position is tracked with sub-pixel precision so short frames do not lose
/// motion to integer truncation; queries report the truncated pixel.
#[derive(Clone, Debug)]
pub(crate) struct EffectState {
    pub(crate) id: EffectId,
    pub(crate) kind: EffectKind,
    x: f64,
    y: f64,
    velocity_x: f64,
    velocity_y: f64,
    pub(crate) age: Duration,
}

impl EffectState {
    /// Launches an effect at `origin` that reaches `target` after one second.
    pub(crate) fn launch(
        id: EffectId,
        kind: EffectKind,
        origin: Coordinate,
        target: Coordinate,
    ) -> Self {
        Self {
            id,
            kind,
            x: f64::from(origin.x()),
            y: f64::from(origin.y()),
            velocity_x: f64::from(target.x()) - f64::from(origin.x()),
            velocity_y: f64::from(target.y()) - f64::from(origin.y()),
            age: Duration::ZERO,
        }
    }

    /// Ages the effect and moves it along its fixed velocity.
    pub(crate) fn advance(&mut self, dt: Duration) {
        self.age = self.age.saturating_add(dt);
        let seconds = dt.as_secs_f64();
        self.x += self.velocity_x * seconds;
        self.y += self.velocity_y * seconds;
    }

    pub(crate) fn position(&self) -> Coordinate {
        Coordinate::new(self.x as i32, self.y as i32)
    }

    pub(crate) fn is_expired(&self) -> bool {
        self.age >= self.kind.lifetime()
    }

    pub(crate) fn snapshot(&self) -> EffectSnapshot {
        EffectSnapshot {
            id: self.id,
            kind: self.kind,
            position: self.position(),
            age: self.age,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn launch_spans_the_full_coordinate_range() {
        let mut effect = EffectState::launch(
            EffectId::new(3),
            EffectKind::SaltCrystal,
            Coordinate::new(-2_000_000_000, 2_000_000_000),
            Coordinate::new(2_000_000_000, -2_000_000_000),
        );

        effect.advance(Duration::from_millis(500));

        assert_eq!(effect.position(), Coordinate::new(0, 0));
    }

    #[test]
    fn crystal_reaches_target_after_one_second() {
        let mut effect = EffectState::launch(
            EffectId::new(0),
            EffectKind::SaltCrystal,
            Coordinate::new(300, 300),
            Coordinate::new(200, 250),
        );

        for _ in 0..50 {
            effect.advance(Duration::from_millis(20));
        }

        let position = effect.position();
        assert!((position.x() - 200).abs() <= 1);
        assert!((position.y() - 250).abs() <= 1);
    }

    #[test]
    fn expiry_is_reached_at_lifetime() {
        let mut effect = EffectState::launch(
            EffectId::new(3),
            EffectKind::SaltCrystal,
            Coordinate::new(0, 0),
            Coordinate::new(0, 0),
        );

        effect.advance(Duration::from_millis(1_499));
        assert!(!effect.is_expired());
        effect.advance(Duration::from_millis(1));
        assert!(effect.is_expired());
    }
}
