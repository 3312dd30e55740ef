use std::fs::File;
use std::io::BufReader;
use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::constituent::EnergyScheme;
use crate::event::{JetSelection, ParticleSelection};
use crate::jets::JetDefinition;
use crate::softdrop::SoftdropParams;

/// Settings of the jet spectrum analysis
#[derive(Copy, Clone, Debug, PartialEq, PartialOrd, Deserialize, Serialize)]
#[serde(default)] // allow partial configuration files
pub struct AnalysisConfig {
    pub do_softdrop: bool,
    pub drop_mass0_jets: bool,
    pub softdrop: SoftdropParams,
    pub energy_scheme: EnergyScheme,
    pub jet_def: JetDefinition,
    pub particles: ParticleSelection,
    pub jets: JetSelection,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            do_softdrop: true,
            drop_mass0_jets: true,
            softdrop: Default::default(),
            energy_scheme: Default::default(),
            jet_def: Default::default(),
            particles: Default::default(),
            jets: Default::default(),
        }
    }
}

impl AnalysisConfig {
    /// Read settings from a JSON file, missing entries keep their defaults
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("Failed to open {path:?}"))?;
        let config = serde_json::from_reader(BufReader::new(file))
            .with_context(|| format!("Failed to parse configuration {path:?}"))?;
        Ok(config)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jets::JetAlgorithm;

    #[test]
    fn partial_config() {
        let config: AnalysisConfig = serde_json::from_str(
            r#"{ "softdrop": { "zcut": 0.2 }, "jet_def": { "radius": 0.2 } }"#,
        )
        .unwrap();
        assert_eq!(config.softdrop.zcut, 0.2);
        assert_eq!(config.softdrop.beta, 0.);
        assert_eq!(config.softdrop.reclusterizer, JetAlgorithm::CambridgeAachen);
        assert_eq!(config.jet_def.radius, 0.2);
        assert_eq!(config.jet_def.algorithm, JetAlgorithm::AntiKt);
        assert_eq!(config.particles.max_abs_eta, 0.7);
        assert!(config.do_softdrop);
    }

    #[test]
    fn defaults() {
        let config = AnalysisConfig::default();
        assert!(config.do_softdrop);
        assert!(config.drop_mass0_jets);
        assert_eq!(config.energy_scheme, EnergyScheme::NonLinearityCorrected);
        assert_eq!(config.jet_def.radius, 0.4);
    }

    #[test]
    fn missing_file() {
        assert!(AnalysisConfig::load(Path::new("/nonexistent/sdpart.json")).is_err());
    }
}
