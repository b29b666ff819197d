use std::path::Path;

use image::Luma;
use qrcode::{EcLevel, QrCode};

use crate::config::AppConfig;
use crate::error::EntryError;

pub trait QrRenderer {
    fn render(&self, text: &str, path: &Path) -> Result<(), EntryError>;
}

#[derive(Debug, Clone, Copy)]
pub struct PngQrRenderer {
    pub ec_level: EcLevel,
    pub module_size: u32,
}

impl PngQrRenderer {
    pub fn from_config(cfg: &AppConfig) -> Self {
        Self {
            ec_level: cfg.qr_ec_level,
            module_size: cfg.qr_module_size,
        }
    }
}

impl QrRenderer for PngQrRenderer {
    fn render(&self, text: &str, path: &Path) -> Result<(), EntryError> {
        let code = QrCode::with_error_correction_level(text.as_bytes(), self.ec_level)?;
        let img = code
            .render::<Luma<u8>>()
            .quiet_zone(true)
            .module_dimensions(self.module_size, self.module_size)
            .build();
        img.save_with_format(path, image::ImageFormat::Png)?;
        Ok(())
    }
}
