//! Dynamic texture atlas configuration.

use crate::error::{AtlasError, Result};
use serde::{Deserialize, Serialize};

/// Upper bound on the number of slices of an array atlas.
pub const MAX_SLICE_COUNT: u32 = 2048;

/// Shape of the texture backing the atlas.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum AtlasDimension {
    /// A single 2D texture: exactly one slice.
    #[default]
    #[serde(rename = "2d")]
    Texture2D,
    /// A 2D texture array that grows slice by slice.
    #[serde(rename = "2d_array")]
    Texture2DArray,
}

/// Configuration of a [`DynamicTextureAtlas`](super::DynamicTextureAtlas).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct TextureAtlasConfig {
    /// Name used in log messages.
    pub name: String,
    /// Width of every slice in texels.
    pub width: u32,
    /// Height of every slice in texels.
    pub height: u32,
    pub dimension: AtlasDimension,
    /// Initial number of slices of an array atlas.
    pub array_size: u32,
    /// Minimum allocation alignment (0 or a power of two).
    pub min_alignment: u32,
    /// Slices added whenever an array atlas grows; 0 doubles the array.
    pub extra_slice_count: u32,
    /// Maximum number of slices of an array atlas.
    pub max_slice_count: u32,
    /// Do not log failed allocations.
    pub silent: bool,
}

impl Default for TextureAtlasConfig {
    fn default() -> Self {
        Self {
            name: "Dynamic texture atlas".to_string(),
            width: 512,
            height: 512,
            dimension: AtlasDimension::Texture2D,
            array_size: 1,
            min_alignment: 0,
            extra_slice_count: 0,
            max_slice_count: MAX_SLICE_COUNT,
            silent: false,
        }
    }
}

impl TextureAtlasConfig {
    /// Create a config for a single `width`x`height` texture.
    pub fn new(width: u32, height: u32) -> Self {
        Self {
            width,
            height,
            ..Self::default()
        }
    }

    /// Turn the atlas into a texture array with `array_size` initial slices.
    pub fn with_array(mut self, array_size: u32, max_slice_count: u32) -> Self {
        self.dimension = AtlasDimension::Texture2DArray;
        self.array_size = array_size;
        self.max_slice_count = max_slice_count;
        self
    }

    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    pub fn with_min_alignment(mut self, alignment: u32) -> Self {
        self.min_alignment = alignment;
        self
    }

    pub fn with_extra_slice_count(mut self, count: u32) -> Self {
        self.extra_slice_count = count;
        self
    }

    pub fn with_silent(mut self, silent: bool) -> Self {
        self.silent = silent;
        self
    }

    /// Number of slices the atlas may ever use.
    pub fn max_slices(&self) -> u32 {
        match self.dimension {
            AtlasDimension::Texture2D => 1,
            AtlasDimension::Texture2DArray => self.max_slice_count.min(MAX_SLICE_COUNT),
        }
    }

    /// Check that the configuration describes a usable atlas.
    pub fn validate(&self) -> Result<()> {
        if self.width == 0 {
            return Err(AtlasError::InvalidConfig(
                "texture width must not be zero".to_string(),
            ));
        }
        if self.height == 0 {
            return Err(AtlasError::InvalidConfig(
                "texture height must not be zero".to_string(),
            ));
        }
        if self.max_slices() == 0 {
            return Err(AtlasError::InvalidConfig(
                "maximum slice count must not be zero".to_string(),
            ));
        }

        if self.min_alignment != 0 {
            if !self.min_alignment.is_power_of_two() {
                return Err(AtlasError::InvalidConfig(format!(
                    "minimum alignment ({}) is not a power of two",
                    self.min_alignment
                )));
            }
            if self.width % self.min_alignment != 0 {
                return Err(AtlasError::InvalidConfig(format!(
                    "texture width ({}) is not a multiple of minimum alignment ({})",
                    self.width, self.min_alignment
                )));
            }
            if self.height % self.min_alignment != 0 {
                return Err(AtlasError::InvalidConfig(format!(
                    "texture height ({}) is not a multiple of minimum alignment ({})",
                    self.height, self.min_alignment
                )));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        assert!(TextureAtlasConfig::default().validate().is_ok());
        assert_eq!(TextureAtlasConfig::default().max_slices(), 1);
    }

    #[test]
    fn test_zero_dimensions_rejected() {
        assert!(TextureAtlasConfig::new(0, 16).validate().is_err());
        assert!(TextureAtlasConfig::new(16, 0).validate().is_err());
    }

    #[test]
    fn test_alignment_rules() {
        let config = TextureAtlasConfig::new(512, 512);
        assert!(config.clone().with_min_alignment(16).validate().is_ok());
        assert!(matches!(
            config.clone().with_min_alignment(24).validate(),
            Err(AtlasError::InvalidConfig(msg)) if msg.contains("power of two")
        ));
        assert!(matches!(
            TextureAtlasConfig::new(520, 512).with_min_alignment(16).validate(),
            Err(AtlasError::InvalidConfig(msg)) if msg.contains("width")
        ));
        assert!(matches!(
            TextureAtlasConfig::new(512, 500).with_min_alignment(16).validate(),
            Err(AtlasError::InvalidConfig(msg)) if msg.contains("height")
        ));
    }

    #[test]
    fn test_max_slices_is_capped() {
        let config = TextureAtlasConfig::new(64, 64).with_array(1, 10_000);
        assert_eq!(config.max_slices(), MAX_SLICE_COUNT);
        let config = TextureAtlasConfig::new(64, 64).with_array(1, 3);
        assert_eq!(config.max_slices(), 3);
    }

    #[test]
    fn test_config_from_json() {
        let config: TextureAtlasConfig = serde_json::from_str(
            r#"{ "width": 256, "height": 128, "dimension": "2d_array", "min_alignment": 8 }"#,
        )
        .unwrap();
        assert_eq!(config.width, 256);
        assert_eq!(config.height, 128);
        assert_eq!(config.dimension, AtlasDimension::Texture2DArray);
        assert_eq!(config.max_slice_count, MAX_SLICE_COUNT);
        assert!(config.validate().is_ok());
    }
}
