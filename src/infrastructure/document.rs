//! 文档能力抽象 - 基础设施层
//!
//! 流程层只依赖这里的 trait，不认识 Pdfium，测试中可以用内存文档替换。

use image::RgbImage;

use crate::error::DocumentError;

/// 文本层中的一个片段，坐标为文档原生单位（PDF 点，原点在左下角）
#[derive(Debug, Clone, PartialEq)]
pub struct TextToken {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

impl TextToken {
    pub fn new(text: impl Into<String>, x: f32, y: f32) -> Self {
        Self {
            text: text.into(),
            x,
            y,
        }
    }
}

/// 页面视口：原生坐标到渲染像素坐标的变换
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Viewport {
    pub page_width: f32,
    pub page_height: f32,
    pub scale: f32,
}

impl Viewport {
    pub fn new(page_width: f32, page_height: f32, scale: f32) -> Self {
        Self {
            page_width,
            page_height,
            scale,
        }
    }

    /// 原生坐标 → 像素坐标（y 轴翻转为自上而下）
    pub fn to_pixel(&self, x: f32, y: f32) -> (f32, f32) {
        (x * self.scale, (self.page_height - y) * self.scale)
    }
}

/// 单页文本层
#[derive(Debug, Clone, PartialEq)]
pub struct TextLayer {
    pub viewport: Viewport,
    pub tokens: Vec<TextToken>,
}

/// 页面来源：页数与按页渲染
pub trait PageSource: Send + Sync {
    /// 文档名称（通常是文件名）
    fn name(&self) -> &str;

    /// 文档总页数
    fn page_count(&self) -> Result<usize, DocumentError>;

    /// 以给定倍率渲染第 `page_number` 页（从 1 开始）
    fn render_page(&self, page_number: usize, scale: f32) -> Result<RgbImage, DocumentError>;
}

/// 文本层来源：读取嵌入文本及其位置
pub trait TextLayerSource: Send + Sync {
    fn text_layer(&self, page_number: usize, scale: f32) -> Result<TextLayer, DocumentError>;
}

/// 可供批量转换使用的完整文档
pub trait ExamDocument: PageSource + TextLayerSource {}

impl<T: PageSource + TextLayerSource + ?Sized> ExamDocument for T {}

/// 校验页码并返回从 0 开始的索引
pub fn page_index(page_number: usize, page_count: usize) -> Result<usize, DocumentError> {
    if page_number == 0 || page_number > page_count {
        return Err(DocumentError::PageOutOfRange {
            page: page_number,
            page_count,
        });
    }
    Ok(page_number - 1)
}
