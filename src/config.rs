use crate::error::{ConvertError, Result};

/// Conversion settings, built once from the command line and passed by
/// value into the conversion routine.
#[derive(Debug, Clone, Copy)]
pub struct ConversionConfig {
    /// Tempo override in BPM. `None` falls back to the file's first tempo
    /// meta-event, or 120 BPM if the file has none.
    pub tempo_bpm: Option<f64>,
    /// When false, the velocity field is left out of the output entirely.
    pub velocity_enabled: bool,
    /// Scales every computed start time and duration.
    pub speed_multiplier: f64,
}

impl Default for ConversionConfig {
    fn default() -> Self {
        Self {
            tempo_bpm: None,
            velocity_enabled: true,
            speed_multiplier: 1.0,
        }
    }
}

impl ConversionConfig {
    pub fn validate(&self) -> Result<()> {
        if let Some(bpm) = self.tempo_bpm {
            if !bpm.is_finite() || bpm <= 0.0 {
                return Err(ConvertError::Validation(format!(
                    "tempo must be a positive number, got {}",
                    bpm
                )));
            }
        }
        if !self.speed_multiplier.is_finite() || self.speed_multiplier <= 0.0 {
            return Err(ConvertError::Validation(format!(
                "speed multiplier must be a positive number, got {}",
                self.speed_multiplier
            )));
        }
        Ok(())
    }

    /// Tempo used for tick-to-time conversion, in BPM.
    pub fn effective_bpm(&self, embedded: Option<f64>) -> f64 {
        self.tempo_bpm.or(embedded).unwrap_or(120.0)
    }
}
