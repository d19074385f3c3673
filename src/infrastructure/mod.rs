//! 基础设施层（Infrastructure）
//!
//! 持有稀缺资源（Pdfium 运行时、OCR 进程、磁盘目录），只向上暴露能力：
//!
//! - `document` - 文档能力抽象：按页渲染、读取文本层
//! - `pdfium_document` - 基于 Pdfium 的 PDF 实现
//! - `tesseract` - 基于 tesseract 命令行的 OCR 引擎
//! - `test_store` - 试卷持久化（外部协作方接口 + JSON 文件实现）

pub mod document;
pub mod pdfium_document;
pub mod tesseract;
pub mod test_store;

pub use document::{ExamDocument, PageSource, TextLayer, TextLayerSource, TextToken, Viewport};
pub use pdfium_document::{load_pdfium, PdfiumDocument};
pub use tesseract::{OcrEngine, OcrRequest, TesseractEngine};
pub use test_store::{JsonTestRepository, TestRepository};
