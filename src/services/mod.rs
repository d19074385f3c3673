//! 业务能力层（Services）
//!
//! 每个服务只描述"我能做什么"，只处理单页或单段文字，不关心批次和流程：
//!
//! - `calibration_store` - 记住题目区域和答案区域
//! - `rasterizer` - 渲染页面、裁剪、编码
//! - `text_locator` - 从文本层取出框内文字
//! - `answer_extractor` - 从文字中解析答案字母
//! - `ocr_detector` - OCR 兜底识别

pub mod answer_extractor;
pub mod calibration_store;
pub mod ocr_detector;
pub mod rasterizer;
pub mod text_locator;

pub use calibration_store::{CalibrationStore, FileCalibrationStore, CALIBRATION_KEY};
pub use ocr_detector::OcrAnswerDetector;
pub use rasterizer::PageRasterizer;
pub use text_locator::TextLocator;
