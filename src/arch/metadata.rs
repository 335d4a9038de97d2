//! Architecture metadata acquisition
//!
//! Metadata reaches the engine either as a registry key (GFX identifier plus
//! compute-unit count) or as a dynamic agent record. Both paths end in one
//! validating constructor; the analysis code never sees where it came from.

use serde::Deserialize;

use super::profile::ArchitectureProfile;
use crate::error::{LensError, LensResult};

/// Dynamic agent metadata record
///
/// Every field is optional at the serde level so that an incomplete record
/// produces [`LensError::MissingMetadataField`] naming the field.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct AgentMetadata {
    /// GFX identifier used to select the family (e.g. "gfx942")
    #[serde(alias = "gfx", alias = "name")]
    pub arch_name: Option<String>,
    pub compute_unit_count: Option<u32>,
    pub simd_per_cu: Option<u32>,
    pub max_waves_per_cu: Option<u32>,
    pub wavefront_size: Option<u32>,
    pub max_clock_mhz: Option<f64>,
}

/// Validated view of an [`AgentMetadata`] record
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ValidatedMetadata {
    pub arch_name: String,
    pub compute_unit_count: u32,
    pub simd_per_cu: u32,
    pub max_waves_per_cu: u32,
    pub wavefront_size: u32,
    pub max_clock_mhz: f64,
}

impl AgentMetadata {
    /// Parse a metadata record from JSON
    pub fn from_json(text: &str) -> LensResult<Self> {
        Ok(serde_json::from_str(text)?)
    }

    /// Check that every required field is present
    pub(crate) fn validate(&self) -> LensResult<ValidatedMetadata> {
        let arch_name = self
            .arch_name
            .as_deref()
            .map(str::trim)
            .filter(|name| !name.is_empty())
            .ok_or(LensError::MissingMetadataField("arch_name"))?
            .to_string();

        let compute_unit_count = self
            .compute_unit_count
            .ok_or(LensError::MissingMetadataField("compute_unit_count"))?;
        let simd_per_cu = self
            .simd_per_cu
            .ok_or(LensError::MissingMetadataField("simd_per_cu"))?;
        let max_waves_per_cu = self
            .max_waves_per_cu
            .ok_or(LensError::MissingMetadataField("max_waves_per_cu"))?;
        let wavefront_size = self
            .wavefront_size
            .ok_or(LensError::MissingMetadataField("wavefront_size"))?;
        let max_clock_mhz = self
            .max_clock_mhz
            .ok_or(LensError::MissingMetadataField("max_clock_mhz"))?;

        if simd_per_cu == 0 {
            return Err(LensError::InvalidConfiguration(
                "simd_per_cu must be non-zero".to_string(),
            ));
        }
        if wavefront_size == 0 {
            return Err(LensError::InvalidConfiguration(
                "wavefront_size must be non-zero".to_string(),
            ));
        }
        if compute_unit_count == 0 {
            return Err(LensError::InvalidConfiguration(
                "compute_unit_count must be non-zero".to_string(),
            ));
        }
        if !max_clock_mhz.is_finite() || max_clock_mhz <= 0.0 {
            return Err(LensError::InvalidConfiguration(format!(
                "max_clock_mhz must be positive, got {}",
                max_clock_mhz
            )));
        }

        Ok(ValidatedMetadata {
            arch_name,
            compute_unit_count,
            simd_per_cu,
            max_waves_per_cu,
            wavefront_size,
            max_clock_mhz,
        })
    }
}

/// Where architecture metadata comes from
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ArchitectureSource {
    /// Fixed per-family registry keyed by GFX identifier
    Registry { id: String, compute_units: u32 },
    /// Dynamic agent record
    Metadata(AgentMetadata),
}

impl ArchitectureSource {
    /// Build the immutable profile for this run
    pub fn build(&self) -> LensResult<ArchitectureProfile> {
        match self {
            ArchitectureSource::Registry { id, compute_units } => {
                ArchitectureProfile::from_registry(id, *compute_units)
            }
            ArchitectureSource::Metadata(meta) => ArchitectureProfile::from_metadata(meta),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn complete() -> AgentMetadata {
        AgentMetadata {
            arch_name: Some("gfx942".to_string()),
            compute_unit_count: Some(304),
            simd_per_cu: Some(4),
            max_waves_per_cu: Some(32),
            wavefront_size: Some(64),
            max_clock_mhz: Some(2100.0),
        }
    }

    #[test]
    fn test_complete_record_validates() {
        let validated = complete().validate().unwrap();
        assert_eq!(validated.arch_name, "gfx942");
        assert_eq!(validated.compute_unit_count, 304);
        assert_eq!(validated.max_clock_mhz, 2100.0);
    }

    #[test]
    fn test_each_missing_field_is_named() {
        let cases: [(&str, fn(&mut AgentMetadata)); 5] = [
            ("compute_unit_count", |m| m.compute_unit_count = None),
            ("simd_per_cu", |m| m.simd_per_cu = None),
            ("max_waves_per_cu", |m| m.max_waves_per_cu = None),
            ("wavefront_size", |m| m.wavefront_size = None),
            ("max_clock_mhz", |m| m.max_clock_mhz = None),
        ];

        for (field, strip) in cases {
            let mut meta = complete();
            strip(&mut meta);
            match meta.validate() {
                Err(LensError::MissingMetadataField(name)) => assert_eq!(name, field),
                other => panic!("expected missing {}, got {:?}", field, other),
            }
        }
    }

    #[test]
    fn test_blank_arch_name_is_missing() {
        let mut meta = complete();
        meta.arch_name = Some("  ".to_string());
        assert!(matches!(
            meta.validate(),
            Err(LensError::MissingMetadataField("arch_name"))
        ));
    }

    #[test]
    fn test_absent_arch_name_is_checked_first() {
        let mut meta = complete();
        meta.arch_name = None;
        meta.max_clock_mhz = None;
        let err = ArchitectureProfile::from_metadata(&meta).unwrap_err();
        assert!(matches!(err, LensError::MissingMetadataField("arch_name")));
        assert!(err.is_configuration_error());
    }

    #[test]
    fn test_zero_simd_rejected() {
        let mut meta = complete();
        meta.simd_per_cu = Some(0);
        assert!(matches!(
            meta.validate(),
            Err(LensError::InvalidConfiguration(_))
        ));
    }

    #[test]
    fn test_from_json_missing_field() {
        let meta = AgentMetadata::from_json(
            r#"{"arch_name": "gfx1030", "compute_unit_count": 12, "simd_per_cu": 2,
                "max_waves_per_cu": 32, "wavefront_size": 32}"#,
        )
        .unwrap();
        assert!(matches!(
            meta.validate(),
            Err(LensError::MissingMetadataField("max_clock_mhz"))
        ));
    }

    #[test]
    fn test_source_deserialization() {
        let source: ArchitectureSource =
            serde_json::from_str(r#"{"registry": {"id": "gfx90a", "compute_units": 104}}"#)
                .unwrap();
        assert_eq!(
            source,
            ArchitectureSource::Registry {
                id: "gfx90a".to_string(),
                compute_units: 104
            }
        );

        let source: ArchitectureSource =
            serde_json::from_str(r#"{"metadata": {"gfx": "gfx942"}}"#).unwrap();
        assert!(matches!(source, ArchitectureSource::Metadata(_)));
        assert!(source.build().is_err());
    }
}
