//! Fusion modes and their selection rule

use crate::request::entities::Request;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Context key that pins a fusion mode explicitly (e.g. `fusion_mode = "interface_forge"`)
pub const FUSION_MODE_KEY: &str = "fusion_mode";

/// Composite pipeline run for elevated-complexity requests
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FusionMode {
    /// Parallel ideation across all agents, highest-confidence synthesis
    #[default]
    HyperCreation,
    /// Sequential refinement where each agent builds on the previous one
    ChronoSculptor,
    /// Several independent rounds reduced by consensus
    AdaptiveGenesis,
    /// Creative draft reviewed in turn, then rendered by the text backend
    InterfaceForge,
}

impl FusionMode {
    pub const ALL: [FusionMode; 4] = [
        FusionMode::HyperCreation,
        FusionMode::ChronoSculptor,
        FusionMode::AdaptiveGenesis,
        FusionMode::InterfaceForge,
    ];

    /// Select the mode for a request.
    ///
    /// An explicit [`FUSION_MODE_KEY`] context entry wins. Otherwise the type
    /// and query are scanned for keywords in order: "interface", "analysis",
    /// "creation", "adaptive"; the default is `HyperCreation`.
    pub fn select(request: &Request) -> Self {
        if let Some(mode) = request
            .context_value(FUSION_MODE_KEY)
            .and_then(|value| value.parse().ok())
        {
            return mode;
        }

        let haystack = format!("{} {}", request.request_type, request.query).to_lowercase();
        if haystack.contains("interface") {
            FusionMode::InterfaceForge
        } else if haystack.contains("analysis") {
            FusionMode::ChronoSculptor
        } else if haystack.contains("creation") {
            FusionMode::HyperCreation
        } else if haystack.contains("adaptive") {
            FusionMode::AdaptiveGenesis
        } else {
            FusionMode::HyperCreation
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            FusionMode::HyperCreation => "hyper_creation",
            FusionMode::ChronoSculptor => "chrono_sculptor",
            FusionMode::AdaptiveGenesis => "adaptive_genesis",
            FusionMode::InterfaceForge => "interface_forge",
        }
    }
}

impl fmt::Display for FusionMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for FusionMode {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().replace('-', "_").as_str() {
            "hyper_creation" | "hyper" => Ok(FusionMode::HyperCreation),
            "chrono_sculptor" | "chrono" => Ok(FusionMode::ChronoSculptor),
            "adaptive_genesis" | "adaptive" => Ok(FusionMode::AdaptiveGenesis),
            "interface_forge" | "interface" => Ok(FusionMode::InterfaceForge),
            _ => Err(format!("Invalid FusionMode: {}", s)),
        }
    }
}
