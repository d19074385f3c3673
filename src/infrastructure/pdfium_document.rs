//! Pdfium 文档 - 基础设施层
//!
//! 每次调用都从缓存的字节重新打开文档，`PdfiumDocument` 本身只持有
//! `Arc<Pdfium>` 与文件字节，因此可以安全地跨任务共享。

use std::env;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use image::{DynamicImage, RgbImage, RgbaImage};
use pdfium_render::prelude::{PdfDocument, PdfRenderConfig, Pdfium, PdfiumError};
use tracing::debug;

use crate::error::DocumentError;
use crate::infrastructure::document::{
    page_index, PageSource, TextLayer, TextLayerSource, TextToken, Viewport,
};

/// 基于 Pdfium 的 PDF 文档
pub struct PdfiumDocument {
    pdfium: Arc<Pdfium>,
    path: PathBuf,
    name: String,
    bytes: Mutex<Option<Arc<Vec<u8>>>>,
}

impl PdfiumDocument {
    pub fn new(pdfium: Arc<Pdfium>, path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .unwrap_or_default()
            .to_string_lossy()
            .to_string();
        Self {
            pdfium,
            path,
            name,
            bytes: Mutex::new(None),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 首次访问时读取文件，之后复用
    fn bytes(&self) -> Result<Arc<Vec<u8>>, DocumentError> {
        let mut cached = self.bytes.lock().unwrap_or_else(|e| e.into_inner());
        if let Some(bytes) = cached.as_ref() {
            return Ok(Arc::clone(bytes));
        }

        let bytes = std::fs::read(&self.path).map_err(|e| DocumentError::OpenFailed {
            name: self.name.clone(),
            reason: e.to_string(),
        })?;
        debug!("已读取文档 {} ({} 字节)", self.name, bytes.len());

        let bytes = Arc::new(bytes);
        *cached = Some(Arc::clone(&bytes));
        Ok(bytes)
    }

    fn with_document<T>(
        &self,
        f: impl FnOnce(&PdfDocument<'_>) -> Result<T, PdfiumError>,
    ) -> Result<Result<T, PdfiumError>, DocumentError> {
        let bytes = self.bytes()?;
        let document = self
            .pdfium
            .load_pdf_from_byte_slice(&bytes, None)
            .map_err(|e| DocumentError::OpenFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            })?;
        Ok(f(&document))
    }

    fn pdf_page_index(&self, document: &PdfDocument<'_>, page_number: usize) -> Option<u16> {
        let page_count = document.pages().len() as usize;
        page_index(page_number, page_count)
            .ok()
            .and_then(|index| u16::try_from(index).ok())
    }
}

impl PageSource for PdfiumDocument {
    fn name(&self) -> &str {
        &self.name
    }

    fn page_count(&self) -> Result<usize, DocumentError> {
        self.with_document(|document| Ok(document.pages().len() as usize))?
            .map_err(|e| DocumentError::PageCountFailed {
                name: self.name.clone(),
                reason: e.to_string(),
            })
    }

    fn render_page(&self, page_number: usize, scale: f32) -> Result<RgbImage, DocumentError> {
        let mut out_of_range = None;
        let rendered = self.with_document(|document| {
            let Some(index) = self.pdf_page_index(document, page_number) else {
                out_of_range = Some(document.pages().len() as usize);
                return Ok(None);
            };
            let page = document.pages().get(index)?;
            let config = PdfRenderConfig::new().scale_page_by_factor(scale);
            let bitmap = page.render_with_config(&config)?;
            Ok(Some((
                bitmap.width() as u32,
                bitmap.height() as u32,
                bitmap.as_rgba_bytes(),
            )))
        })?;

        if let Some(page_count) = out_of_range {
            return Err(DocumentError::PageOutOfRange {
                page: page_number,
                page_count,
            });
        }

        let render_failed = |reason: String| DocumentError::RenderFailed {
            page: page_number,
            reason,
        };
        let (width, height, rgba) = rendered
            .map_err(|e| render_failed(e.to_string()))?
            .ok_or_else(|| render_failed("空位图".to_string()))?;
        let image = RgbaImage::from_raw(width, height, rgba)
            .ok_or_else(|| render_failed(format!("位图尺寸不匹配 {}x{}", width, height)))?;

        Ok(DynamicImage::ImageRgba8(image).to_rgb8())
    }
}

impl TextLayerSource for PdfiumDocument {
    fn text_layer(&self, page_number: usize, scale: f32) -> Result<TextLayer, DocumentError> {
        let mut out_of_range = None;
        let layer = self.with_document(|document| {
            let Some(index) = self.pdf_page_index(document, page_number) else {
                out_of_range = Some(document.pages().len() as usize);
                return Ok(None);
            };
            let page = document.pages().get(index)?;
            let viewport = Viewport::new(page.width().value, page.height().value, scale);
            let text = page.text()?;

            let tokens = text
                .segments()
                .iter()
                .filter_map(|segment| {
                    let value = segment.text();
                    if value.trim().is_empty() {
                        return None;
                    }
                    let bounds = segment.bounds();
                    Some(TextToken::new(
                        value,
                        bounds.left().value,
                        bounds.bottom().value,
                    ))
                })
                .collect::<Vec<_>>();

            Ok(Some(TextLayer { viewport, tokens }))
        })?;

        if let Some(page_count) = out_of_range {
            return Err(DocumentError::PageOutOfRange {
                page: page_number,
                page_count,
            });
        }

        layer
            .map_err(|e| DocumentError::TextLayerFailed {
                page: page_number,
                reason: e.to_string(),
            })?
            .ok_or(DocumentError::TextLayerFailed {
                page: page_number,
                reason: "空文本层".to_string(),
            })
    }
}

/// 绑定 Pdfium 动态库
///
/// 查找顺序：`PDFIUM_LIBRARY_PATH` / `PDFIUM_LIB_DIR` 环境变量、常见相对路径、当前目录、系统库。
pub fn load_pdfium() -> Result<Pdfium, PdfiumError> {
    if let Some(result) = try_bind_from_env("PDFIUM_LIBRARY_PATH") {
        return result;
    }

    if let Some(Ok(pdfium)) = try_bind_from_env("PDFIUM_LIB_DIR") {
        return Ok(pdfium);
    }

    for candidate in DEFAULT_PDFIUM_LOCATIONS {
        if let Some(Ok(pdfium)) = try_bind_from_path(candidate) {
            return Ok(pdfium);
        }
    }

    match Pdfium::bind_to_library(Pdfium::pdfium_platform_library_name_at_path("./")) {
        Ok(bindings) => Ok(Pdfium::new(bindings)),
        Err(primary_err) => match Pdfium::bind_to_system_library() {
            Ok(bindings) => Ok(Pdfium::new(bindings)),
            Err(_) => Err(primary_err),
        },
    }
}

const DEFAULT_PDFIUM_LOCATIONS: &[&str] = &["pdfium/lib", "pdfium", "third_party/pdfium/lib"];

fn try_bind_from_env(var: &str) -> Option<Result<Pdfium, PdfiumError>> {
    let value = env::var_os(var)?;
    try_bind_from_path(PathBuf::from(value))
}

fn try_bind_from_path(path: impl AsRef<Path>) -> Option<Result<Pdfium, PdfiumError>> {
    let path = path.as_ref();
    if path.is_dir() {
        let lib_path = Pdfium::pdfium_platform_library_name_at_path(path);
        Some(Pdfium::bind_to_library(lib_path).map(Pdfium::new))
    } else if path.exists() {
        Some(Pdfium::bind_to_library(path).map(Pdfium::new))
    } else {
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 需要本地 Pdfium 动态库：`cargo test -- --ignored`
    #[test]
    #[ignore]
    fn test_missing_file_is_open_failure() {
        let pdfium = Arc::new(load_pdfium().expect("未找到 Pdfium 动态库"));
        let document = PdfiumDocument::new(pdfium, "does-not-exist-123.pdf");
        assert_eq!(document.name(), "does-not-exist-123.pdf");
        match document.page_count() {
            Err(DocumentError::OpenFailed { name, .. }) => {
                assert_eq!(name, "does-not-exist-123.pdf")
            }
            other => panic!("应返回 OpenFailed，实际: {:?}", other.map(|_| ())),
        }
    }
}
