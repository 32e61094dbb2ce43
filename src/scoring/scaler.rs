//! Pre-fitted standard scaler for `Time` and `Amount`

use std::path::Path;

use serde::{Deserialize, Serialize};

use super::ModelError;

/// One-dimensional standard scaler: `(x - mean) / scale`
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct StandardScaler {
    pub mean: f64,
    pub scale: f64,
}

impl StandardScaler {
    pub fn new(mean: f64, scale: f64) -> Result<Self, ModelError> {
        if !mean.is_finite() || !scale.is_finite() || scale == 0.0 {
            return Err(ModelError::Invalid(format!(
                "scaler requires finite mean and non-zero scale (mean={mean}, scale={scale})"
            )));
        }
        Ok(Self { mean, scale })
    }

    /// Identity transform
    #[cfg(test)]
    pub fn identity() -> Self {
        Self { mean: 0.0, scale: 1.0 }
    }

    /// Load a scaler exported as `{"mean": .., "scale": ..}`
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ModelError> {
        let path = path.as_ref();
        let raw = std::fs::read_to_string(path)
            .map_err(|e| ModelError::Io(path.display().to_string(), e))?;
        let parsed: StandardScaler = serde_json::from_str(&raw)
            .map_err(|e| ModelError::Parse(path.display().to_string(), e))?;
        Self::new(parsed.mean, parsed.scale)
    }

    pub fn transform(&self, value: f64) -> f64 {
        (value - self.mean) / self.scale
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_transform() {
        let scaler = StandardScaler::new(88.35, 250.12).unwrap();
        assert!((scaler.transform(88.35)).abs() < 1e-12);
        assert!((scaler.transform(338.47) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn test_zero_scale_rejected() {
        assert!(matches!(StandardScaler::new(1.0, 0.0), Err(ModelError::Invalid(_))));
    }

    #[test]
    fn test_load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, r#"{{"mean": 10.0, "scale": 2.0}}"#).unwrap();

        let scaler = StandardScaler::load(file.path()).unwrap();
        assert_eq!(scaler.transform(14.0), 2.0);
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            StandardScaler::load("/nonexistent/scaler.json"),
            Err(ModelError::Io(_, _))
        ));
    }
}
