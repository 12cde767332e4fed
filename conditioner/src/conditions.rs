//! Simulated-network parameters.

use crate::Error;

/// The four impairment parameters and the derived `active` flag.
///
/// All parameters default to zero, which leaves the simulator inactive: a
/// transport can check [Conditions::is_active] to decide whether to shunt
/// packets through the simulator at all (an optimization, not a correctness
/// requirement).
pub(crate) struct Conditions {
    latency: f32,
    jitter: f32,
    packet_loss: f32,
    duplicate: f32,
    active: bool,
}

impl Conditions {
    pub fn new() -> Self {
        Self {
            latency: 0.0,
            jitter: 0.0,
            packet_loss: 0.0,
            duplicate: 0.0,
            active: false,
        }
    }

    /// Set the latency added on send, in milliseconds.
    pub fn set_latency(&mut self, milliseconds: f32) -> Result<(), Error> {
        check_duration(milliseconds)?;
        self.latency = milliseconds;
        self.update_active();
        Ok(())
    }

    /// Set the jitter applied +/- around the latency, in milliseconds.
    pub fn set_jitter(&mut self, milliseconds: f32) -> Result<(), Error> {
        check_duration(milliseconds)?;
        self.jitter = milliseconds;
        self.update_active();
        Ok(())
    }

    /// Set the percentage of sends dropped outright.
    pub fn set_packet_loss(&mut self, percent: f32) -> Result<(), Error> {
        check_percentage(percent)?;
        self.packet_loss = percent;
        self.update_active();
        Ok(())
    }

    /// Set the percentage chance that a send is duplicated.
    pub fn set_duplicate(&mut self, percent: f32) -> Result<(), Error> {
        check_percentage(percent)?;
        self.duplicate = percent;
        self.update_active();
        Ok(())
    }

    pub fn latency(&self) -> f32 {
        self.latency
    }

    pub fn jitter(&self) -> f32 {
        self.jitter
    }

    pub fn packet_loss(&self) -> f32 {
        self.packet_loss
    }

    pub fn duplicate(&self) -> f32 {
        self.duplicate
    }

    pub fn is_active(&self) -> bool {
        self.active
    }

    // Recomputed on every setter so is_active() stays O(1).
    fn update_active(&mut self) {
        self.active = self.latency != 0.0
            || self.jitter != 0.0
            || self.packet_loss != 0.0
            || self.duplicate != 0.0;
    }
}

fn check_duration(milliseconds: f32) -> Result<(), Error> {
    if !milliseconds.is_finite() || milliseconds < 0.0 {
        return Err(Error::InvalidDuration(milliseconds));
    }
    Ok(())
}

fn check_percentage(percent: f32) -> Result<(), Error> {
    if !percent.is_finite() || !(0.0..=100.0).contains(&percent) {
        return Err(Error::InvalidPercentage(percent));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inactive_by_default() {
        let conditions = Conditions::new();
        assert!(!conditions.is_active());
        assert_eq!(conditions.latency(), 0.0);
        assert_eq!(conditions.jitter(), 0.0);
        assert_eq!(conditions.packet_loss(), 0.0);
        assert_eq!(conditions.duplicate(), 0.0);
    }

    #[test]
    fn test_any_parameter_activates() {
        let mut conditions = Conditions::new();

        conditions.set_latency(25.0).unwrap();
        assert!(conditions.is_active());
        conditions.set_latency(0.0).unwrap();
        assert!(!conditions.is_active());

        conditions.set_jitter(5.0).unwrap();
        assert!(conditions.is_active());
        conditions.set_jitter(0.0).unwrap();
        assert!(!conditions.is_active());

        conditions.set_packet_loss(10.0).unwrap();
        assert!(conditions.is_active());
        conditions.set_packet_loss(0.0).unwrap();
        assert!(!conditions.is_active());

        conditions.set_duplicate(1.0).unwrap();
        assert!(conditions.is_active());
        conditions.set_duplicate(0.0).unwrap();
        assert!(!conditions.is_active());
    }

    #[test]
    fn test_rejects_invalid_durations() {
        let mut conditions = Conditions::new();
        assert!(matches!(
            conditions.set_latency(-1.0),
            Err(Error::InvalidDuration(_))
        ));
        assert!(matches!(
            conditions.set_jitter(f32::NAN),
            Err(Error::InvalidDuration(_))
        ));
        assert!(matches!(
            conditions.set_latency(f32::INFINITY),
            Err(Error::InvalidDuration(_))
        ));

        // Rejected values leave the parameters (and the flag) untouched
        assert!(!conditions.is_active());
        assert_eq!(conditions.latency(), 0.0);
    }

    #[test]
    fn test_rejects_invalid_percentages() {
        let mut conditions = Conditions::new();
        assert!(matches!(
            conditions.set_packet_loss(-5.0),
            Err(Error::InvalidPercentage(_))
        ));
        assert!(matches!(
            conditions.set_packet_loss(150.0),
            Err(Error::InvalidPercentage(_))
        ));
        assert!(matches!(
            conditions.set_duplicate(f32::NAN),
            Err(Error::InvalidPercentage(_))
        ));
        assert!(!conditions.is_active());

        // Boundaries are valid
        conditions.set_packet_loss(100.0).unwrap();
        conditions.set_duplicate(0.0).unwrap();
        assert!(conditions.is_active());
    }
}
