//! 页面渲染与裁剪 - 业务能力层
//!
//! 校准与提取使用同一渲染倍率，裁剪框坐标才能直接复用。

use base64::engine::general_purpose::STANDARD as BASE64_STANDARD;
use base64::Engine;
use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{imageops, ExtendedColorType, ImageEncoder, ImageError, RgbImage};

use crate::error::DocumentError;
use crate::infrastructure::PageSource;
use crate::models::{reference_page_number, CropBox, RENDER_SCALE};

/// 保存到试卷中的截图质量
pub const CROP_JPEG_QUALITY: u8 = 80;

/// OCR 预处理中间图的质量
pub const OCR_JPEG_QUALITY: u8 = 100;

/// 页面渲染器
#[derive(Debug, Clone, Copy)]
pub struct PageRasterizer {
    scale: f32,
}

impl PageRasterizer {
    pub fn new(scale: f32) -> Self {
        Self { scale }
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    /// 渲染单页
    pub fn render<D: PageSource + ?Sized>(
        &self,
        document: &D,
        page_number: usize,
    ) -> Result<RgbImage, DocumentError> {
        document.render_page(page_number, self.scale)
    }

    /// 渲染校准参考页并编码为 PNG，供操作员量取裁剪框坐标
    pub fn render_reference_png<D: PageSource + ?Sized>(
        &self,
        document: &D,
    ) -> Result<(usize, Vec<u8>), DocumentError> {
        let page_number = reference_page_number(document.page_count()?);
        let raster = self.render(document, page_number)?;
        let png = encode_png(&raster).map_err(|e| DocumentError::RenderFailed {
            page: page_number,
            reason: e.to_string(),
        })?;
        Ok((page_number, png))
    }
}

impl Default for PageRasterizer {
    fn default() -> Self {
        Self::new(RENDER_SCALE)
    }
}

/// 截取矩形区域，超出页面的部分被裁掉；完全落在页面外时返回 `None`
pub fn crop(raster: &RgbImage, crop: &CropBox) -> Option<RgbImage> {
    let (width, height) = raster.dimensions();
    let clamp = |value: f32, max: u32| value.round().clamp(0.0, max as f32) as u32;

    let x0 = clamp(crop.x, width);
    let y0 = clamp(crop.y, height);
    let x1 = clamp(crop.right(), width);
    let y1 = clamp(crop.bottom(), height);
    if x1 <= x0 || y1 <= y0 {
        return None;
    }

    Some(imageops::crop_imm(raster, x0, y0, x1 - x0, y1 - y0).to_image())
}

/// 编码为 JPEG，`quality` 取值 1-100
pub fn encode_jpeg(image: &RgbImage, quality: u8) -> Result<Vec<u8>, ImageError> {
    let mut encoded = Vec::new();
    JpegEncoder::new_with_quality(&mut encoded, quality.clamp(1, 100)).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(encoded)
}

pub fn encode_png(image: &RgbImage) -> Result<Vec<u8>, ImageError> {
    let mut encoded = Vec::new();
    PngEncoder::new(&mut encoded).write_image(
        image.as_raw(),
        image.width(),
        image.height(),
        ExtendedColorType::Rgb8,
    )?;
    Ok(encoded)
}

/// JPEG 字节 → data URL
pub fn to_data_url(jpeg: &[u8]) -> String {
    format!("data:image/jpeg;base64,{}", BASE64_STANDARD.encode(jpeg))
}
