//! Trigger and associate particle selection.

use crate::particle::{pid, Event, Particle};
use crate::{Error, Result};
use serde::{Deserialize, Serialize};

/// Inclusive transverse-momentum range `[min, max]` in GeV.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PtRange {
    /// Lower bound (GeV).
    pub min: f64,
    /// Upper bound (GeV).
    pub max: f64,
}

impl PtRange {
    /// Creates a new range.
    #[must_use]
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    /// Returns true if `min <= pt <= max`.
    #[inline]
    #[must_use]
    pub fn contains(&self, pt: f64) -> bool {
        (self.min..=self.max).contains(&pt)
    }

    fn validate(&self, what: &str) -> Result<()> {
        if !self.min.is_finite() || !self.max.is_finite() || self.min > self.max {
            return Err(Error::ConfigError(format!(
                "invalid {what} pT range [{}, {}]",
                self.min, self.max
            )));
        }
        Ok(())
    }
}

/// How the two bounds of an [`EtaWindow`] are combined.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EtaWindowMode {
    /// `|eta| < max || |eta| > min`. Accepts every particle whenever
    /// `min < max`; kept to reproduce the historical trigger selection.
    #[default]
    Union,
    /// `min < |eta| < max`.
    Intersection,
}

/// Pseudorapidity-magnitude window.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct EtaWindow {
    /// Lower bound on `|eta|`.
    pub min: f64,
    /// Upper bound on `|eta|`.
    pub max: f64,
    /// How the bounds are combined.
    #[serde(default)]
    pub mode: EtaWindowMode,
}

impl EtaWindow {
    /// Returns true if `abs_eta` passes the window.
    #[inline]
    #[must_use]
    pub fn accepts(&self, abs_eta: f64) -> bool {
        match self.mode {
            EtaWindowMode::Union => abs_eta < self.max || abs_eta > self.min,
            EtaWindowMode::Intersection => abs_eta > self.min && abs_eta < self.max,
        }
    }
}

/// Identity plus momentum requirement for one trigger species.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SpeciesCut {
    /// Required PDG code.
    pub pid: i32,
    /// Accepted transverse momentum.
    pub pt: PtRange,
}

impl SpeciesCut {
    /// Returns true if the particle has the right identity and momentum.
    #[inline]
    #[must_use]
    pub fn accepts(&self, particle: &Particle) -> bool {
        particle.pid == self.pid && self.pt.contains(particle.pt)
    }
}

/// Trigger particle predicate: eta window and any of the species cuts.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TriggerCut {
    /// Pseudorapidity acceptance.
    pub eta: EtaWindow,
    /// Accepted species; a particle must satisfy at least one.
    pub species: Vec<SpeciesCut>,
}

impl Default for TriggerCut {
    /// Neutral pions with 0.12-0.16 GeV or photons with 5-9 GeV in the
    /// 3.1-3.9 pseudorapidity window.
    fn default() -> Self {
        Self {
            eta: EtaWindow {
                min: 3.1,
                max: 3.9,
                mode: EtaWindowMode::Union,
            },
            species: vec![
                SpeciesCut {
                    pid: pid::PI0,
                    pt: PtRange::new(0.12, 0.16),
                },
                SpeciesCut {
                    pid: pid::PHOTON,
                    pt: PtRange::new(5.0, 9.0),
                },
            ],
        }
    }
}

impl TriggerCut {
    /// Returns true if the particle qualifies as a trigger.
    #[must_use]
    pub fn accepts(&self, particle: &Particle) -> bool {
        self.eta.accepts(particle.abs_eta()) && self.species.iter().any(|s| s.accepts(particle))
    }

    /// Sets the eta window mode.
    #[must_use]
    pub fn with_eta_mode(mut self, mode: EtaWindowMode) -> Self {
        self.eta.mode = mode;
        self
    }

    /// Validates the cut.
    ///
    /// # Errors
    /// Returns an error for an empty species list, non-finite eta bounds or
    /// an inverted pT range.
    pub fn validate(&self) -> Result<()> {
        if !self.eta.min.is_finite() || !self.eta.max.is_finite() {
            return Err(Error::ConfigError(
                "trigger eta bounds must be finite".to_string(),
            ));
        }
        if self.species.is_empty() {
            return Err(Error::ConfigError(
                "trigger cut needs at least one species".to_string(),
            ));
        }
        for species in &self.species {
            species.pt.validate("trigger")?;
        }
        Ok(())
    }
}

/// Associate particle predicate.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct AssociateCut {
    /// Upper bound (exclusive) on `|eta|`.
    pub max_abs_eta: f64,
    /// Accepted transverse momentum.
    pub pt: PtRange,
    /// Only accept charged particles.
    pub charged_only: bool,
}

impl Default for AssociateCut {
    /// Charged particles with `|eta| < 1` and 1.2-20 GeV.
    fn default() -> Self {
        Self {
            max_abs_eta: 1.0,
            pt: PtRange::new(1.2, 20.0),
            charged_only: true,
        }
    }
}

impl AssociateCut {
    /// Returns true if the particle qualifies as an associate.
    #[must_use]
    pub fn accepts(&self, particle: &Particle) -> bool {
        (!self.charged_only || particle.is_charged())
            && particle.abs_eta() < self.max_abs_eta
            && self.pt.contains(particle.pt)
    }

    /// Validates the cut.
    ///
    /// # Errors
    /// Returns an error for a non-positive eta bound or an inverted pT range.
    pub fn validate(&self) -> Result<()> {
        if self.max_abs_eta.is_nan() || self.max_abs_eta <= 0.0 {
            return Err(Error::ConfigError(format!(
                "associate |eta| bound must be positive, got {}",
                self.max_abs_eta
            )));
        }
        self.pt.validate("associate")
    }
}

/// Applies trigger and associate cuts to an event.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ParticleSelector {
    trigger: TriggerCut,
    associate: AssociateCut,
}

impl ParticleSelector {
    /// Creates a selector from the two cuts.
    #[must_use]
    pub fn new(trigger: TriggerCut, associate: AssociateCut) -> Self {
        Self { trigger, associate }
    }

    /// Trigger particles, highest pT first.
    #[must_use]
    pub fn select_triggers(&self, event: &Event) -> Vec<Particle> {
        by_descending_pt(event, |p| self.trigger.accepts(p))
    }

    /// Associate particles, highest pT first.
    #[must_use]
    pub fn select_associates(&self, event: &Event) -> Vec<Particle> {
        by_descending_pt(event, |p| self.associate.accepts(p))
    }
}

/// Filters particles and sorts them by descending pT.
///
/// The sort is stable, so equal-pT particles keep their input order.
fn by_descending_pt<F>(event: &Event, keep: F) -> Vec<Particle>
where
    F: Fn(&Particle) -> bool,
{
    let mut selected: Vec<Particle> = event
        .particles
        .iter()
        .filter(|p| keep(*p))
        .copied()
        .collect();
    selected.sort_by(|a, b| b.pt.total_cmp(&a.pt));
    selected
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::particle::pid;

    fn photon(pt: f64, eta: f64) -> Particle {
        Particle::new(pid::PHOTON, pt, eta, 0.0)
    }

    #[test]
    fn test_pt_range_inclusive() {
        let range = PtRange::new(5.0, 9.0);
        assert!(range.contains(5.0));
        assert!(range.contains(9.0));
        assert!(!range.contains(4.999));
        assert!(!range.contains(f64::NAN));
    }

    #[test]
    fn test_eta_window_modes() {
        let union = EtaWindow {
            min: 3.1,
            max: 3.9,
            mode: EtaWindowMode::Union,
        };
        let intersection = EtaWindow {
            mode: EtaWindowMode::Intersection,
            ..union
        };

        for abs_eta in [0.0, 2.0, 3.5, 5.0] {
            assert!(union.accepts(abs_eta));
        }
        assert!(intersection.accepts(3.5));
        assert!(!intersection.accepts(2.0));
        assert!(!intersection.accepts(3.1));
        assert!(!intersection.accepts(3.9));
        assert!(!intersection.accepts(5.0));
    }

    #[test]
    fn test_default_trigger_cut() {
        let cut = TriggerCut::default();
        assert!(cut.accepts(&photon(6.0, 3.5)));
        assert!(cut.accepts(&photon(6.0, 0.2)));
        assert!(!cut.accepts(&photon(4.0, 3.5)));
        assert!(!cut.accepts(&photon(9.5, 3.5)));
        assert!(cut.accepts(&Particle::new(pid::PI0, 0.14, -3.5, 1.0)));
        assert!(!cut.accepts(&Particle::new(pid::PI0, 6.0, 3.5, 1.0)));
        assert!(!cut.accepts(&Particle::new(pid::PI_PLUS, 6.0, 3.5, 1.0)));

        let strict = TriggerCut::default().with_eta_mode(EtaWindowMode::Intersection);
        assert!(strict.accepts(&photon(6.0, -3.5)));
        assert!(!strict.accepts(&photon(6.0, 0.2)));
    }

    #[test]
    fn test_default_associate_cut() {
        let cut = AssociateCut::default();
        assert!(cut.accepts(&Particle::new(pid::PI_PLUS, 2.0, 0.5, 0.0)));
        assert!(cut.accepts(&Particle::new(-pid::PROTON, 1.2, -0.9, 0.0)));
        assert!(!cut.accepts(&Particle::new(pid::PI_PLUS, 2.0, 1.0, 0.0)));
        assert!(!cut.accepts(&Particle::new(pid::PI_PLUS, 1.0, 0.5, 0.0)));
        assert!(!cut.accepts(&Particle::new(pid::PHOTON, 2.0, 0.5, 0.0)));
        assert!(!cut.accepts(&Particle::new(pid::NEUTRON, 2.0, 0.5, 0.0)));
    }

    #[test]
    fn test_selection_sorted_by_pt() {
        let event = Event::new(
            1.0,
            vec![
                Particle::new(pid::PI_PLUS, 2.0, 0.1, 0.1),
                photon(5.5, 3.5),
                Particle::new(pid::PI_PLUS, 4.0, 0.1, 0.2),
                photon(8.0, 3.3),
                Particle::new(-pid::PI_PLUS, 2.0, 0.1, 0.3),
            ],
        );
        let selector = ParticleSelector::default();

        let triggers = selector.select_triggers(&event);
        let trigger_pts: Vec<f64> = triggers.iter().map(|p| p.pt).collect();
        assert_eq!(trigger_pts, vec![8.0, 5.5]);

        let associates = selector.select_associates(&event);
        let associate_phis: Vec<f64> = associates.iter().map(|p| p.phi).collect();
        // Equal pT keeps input order
        assert_eq!(associate_phis, vec![0.2, 0.1, 0.3]);
    }

    #[test]
    fn test_empty_selection() {
        let selector = ParticleSelector::default();
        let event = Event::default();
        assert!(selector.select_triggers(&event).is_empty());
        assert!(selector.select_associates(&event).is_empty());
    }

    #[test]
    fn test_validate() {
        assert!(TriggerCut::default().validate().is_ok());
        assert!(AssociateCut::default().validate().is_ok());

        let mut trigger = TriggerCut::default();
        trigger.species.clear();
        assert!(trigger.validate().is_err());

        let associate = AssociateCut {
            pt: PtRange::new(5.0, 1.0),
            ..AssociateCut::default()
        };
        assert!(associate.validate().is_err());
    }
}
