//! Scraper settings, loaded from an optional JSON file

use std::fs;
use std::io;
use std::path::Path;

use log::debug;
use serde::{Deserialize, Serialize};

use crate::data::prototype::DEFAULT_PROTOTYPE_PREFIXES;
use crate::graphics::frm::FrameAlignment;
use crate::graphics::palette::DEFAULT_PALETTE_MEMBER;
use crate::map::{MapOptions, VariableLayout};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ScraperConfig {
    pub palette_member: String,
    pub prototype_prefixes: Vec<String>,
    pub frame_alignment: FrameAlignment,
    pub variable_layout: VariableLayout,
    pub optimise_png: bool,
}

impl Default for ScraperConfig {
    fn default() -> Self {
        ScraperConfig {
            palette_member: DEFAULT_PALETTE_MEMBER.to_string(),
            prototype_prefixes: DEFAULT_PROTOTYPE_PREFIXES
                .iter()
                .map(|prefix| prefix.to_string())
                .collect(),
            frame_alignment: FrameAlignment::default(),
            variable_layout: VariableLayout::default(),
            optimise_png: false,
        }
    }
}

impl ScraperConfig {
    pub fn load(path: &Path) -> io::Result<Self> {
        let text = fs::read_to_string(path)?;
        let config: ScraperConfig = serde_json::from_str(&text)
            .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
        debug!("Loaded config from {}: {:?}", path.display(), config);
        Ok(config)
    }

    pub fn map_options(&self) -> MapOptions {
        MapOptions {
            variable_layout: self.variable_layout,
        }
    }
}
