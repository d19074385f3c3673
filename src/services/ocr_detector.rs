//! OCR 答案识别 - 业务能力层
//!
//! 文本层找不到答案时的兜底路径：二值化答案截图 → 受限字符集 OCR → 解析字母。

use std::sync::Arc;

use image::{Rgb, RgbImage};
use tracing::{debug, info, warn};

use crate::error::OcrError;
use crate::infrastructure::tesseract::PSM_SINGLE_BLOCK;
use crate::infrastructure::{OcrEngine, OcrRequest};
use crate::models::AnswerLetter;
use crate::services::answer_extractor;
use crate::services::rasterizer::{encode_jpeg, OCR_JPEG_QUALITY};

/// 二值化阈值
pub const DEFAULT_THRESHOLD: u8 = 140;

/// ITU-R BT.709 亮度
pub fn luminance(pixel: &Rgb<u8>) -> f32 {
    let [r, g, b] = pixel.0;
    0.2126 * r as f32 + 0.7152 * g as f32 + 0.0722 * b as f32
}

/// 灰度化后按阈值转成纯黑 / 纯白
pub fn binarize(image: &RgbImage, threshold: u8) -> RgbImage {
    let mut output = image.clone();
    for pixel in output.pixels_mut() {
        let value = if luminance(pixel) >= threshold as f32 {
            255
        } else {
            0
        };
        *pixel = Rgb([value, value, value]);
    }
    output
}

/// OCR 答案识别器
pub struct OcrAnswerDetector {
    engine: Arc<dyn OcrEngine>,
    threshold: u8,
    request: OcrRequest,
}

impl OcrAnswerDetector {
    pub fn new(engine: Arc<dyn OcrEngine>, threshold: u8) -> Self {
        Self {
            engine,
            threshold,
            request: OcrRequest {
                whitelist: answer_extractor::ocr_whitelist(),
                page_seg_mode: PSM_SINGLE_BLOCK,
            },
        }
    }

    /// 识别答案字母，始终有结果：识别失败时返回第一个选项
    pub async fn detect(&self, answer_crop: &RgbImage) -> AnswerLetter {
        match self.recognize(answer_crop).await {
            Ok(Some(letter)) => {
                debug!("OCR 识别到答案: {}", letter);
                letter
            }
            Ok(None) => {
                info!("OCR 未能识别答案，默认使用 {}", AnswerLetter::FALLBACK);
                AnswerLetter::FALLBACK
            }
            Err(e) => {
                warn!("⚠️ {}，默认使用 {}", e, AnswerLetter::FALLBACK);
                AnswerLetter::FALLBACK
            }
        }
    }

    async fn recognize(&self, answer_crop: &RgbImage) -> Result<Option<AnswerLetter>, OcrError> {
        let binary = binarize(answer_crop, self.threshold);
        let encoded = encode_jpeg(&binary, OCR_JPEG_QUALITY)?;

        let text = self.engine.recognize(&encoded, &self.request).await?;
        debug!("OCR 原始文本: {:?}", text.trim());
        Ok(answer_extractor::extract(&text))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FixedOcr {
        reply: Result<String, ()>,
        seen: Mutex<Vec<OcrRequest>>,
    }

    impl FixedOcr {
        fn new(reply: Result<&str, ()>) -> Self {
            Self {
                reply: reply.map(str::to_string),
                seen: Mutex::new(Vec::new()),
            }
        }
    }

    #[async_trait]
    impl OcrEngine for FixedOcr {
        async fn recognize(&self, image: &[u8], request: &OcrRequest) -> Result<String, OcrError> {
            assert_eq!(&image[..2], &[0xFF, 0xD8], "应传入 JPEG");
            self.seen.lock().unwrap().push(request.clone());
            self.reply.clone().map_err(|_| OcrError::ProcessFailed {
                code: Some(1),
                stderr: "boom".to_string(),
            })
        }
    }

    fn sample_image() -> RgbImage {
        RgbImage::from_fn(40, 30, |x, y| Rgb([(x * 6) as u8, (y * 8) as u8, 90]))
    }

    #[test]
    fn test_binarize_outputs_only_black_and_white() {
        let binary = binarize(&sample_image(), DEFAULT_THRESHOLD);
        assert!(binary.pixels().all(|p| p.0.iter().all(|c| *c == 0 || *c == 255)));
        assert!(binary.pixels().any(|p| p.0[0] == 0));
        assert!(binary.pixels().any(|p| p.0[0] == 255));
    }

    #[test]
    fn test_binarize_is_idempotent() {
        let once = binarize(&sample_image(), DEFAULT_THRESHOLD);
        let twice = binarize(&once, DEFAULT_THRESHOLD);
        assert_eq!(once, twice);
    }

    #[test]
    fn test_luminance_threshold_boundary() {
        let light = RgbImage::from_pixel(1, 1, Rgb([141, 141, 141]));
        let dark = RgbImage::from_pixel(1, 1, Rgb([139, 139, 139]));
        assert_eq!(binarize(&light, 140).get_pixel(0, 0), &Rgb([255, 255, 255]));
        assert_eq!(binarize(&dark, 140).get_pixel(0, 0), &Rgb([0, 0, 0]));
        // 绿色权重最大
        assert!(luminance(&Rgb([0, 255, 0])) > luminance(&Rgb([255, 0, 255])));
    }

    #[tokio::test]
    async fn test_detect_parses_ocr_text() {
        let engine = Arc::new(FixedOcr::new(Ok("الإجابة الصحيحة : ج\n")));
        let detector = OcrAnswerDetector::new(engine.clone(), DEFAULT_THRESHOLD);
        assert_eq!(detector.detect(&sample_image()).await, AnswerLetter::Jeem);

        let seen = engine.seen.lock().unwrap();
        assert_eq!(seen.len(), 1);
        assert_eq!(seen[0].page_seg_mode, PSM_SINGLE_BLOCK);
        assert!(seen[0].whitelist.contains('ج'));
    }

    #[tokio::test]
    async fn test_detect_gibberish_falls_back() {
        let engine = Arc::new(FixedOcr::new(Ok("0o0o0o0o0o0o0o0o")));
        let detector = OcrAnswerDetector::new(engine, DEFAULT_THRESHOLD);
        assert_eq!(detector.detect(&sample_image()).await, AnswerLetter::FALLBACK);
    }

    #[tokio::test]
    async fn test_detect_engine_error_falls_back() {
        let engine = Arc::new(FixedOcr::new(Err(())));
        let detector = OcrAnswerDetector::new(engine, DEFAULT_THRESHOLD);
        assert_eq!(detector.detect(&sample_image()).await, AnswerLetter::Alef);
    }

    #[tokio::test]
    async fn test_unencodable_crop_is_preprocess_error() {
        // JPEG 单边最多 65535 像素
        let wide = RgbImage::from_pixel(65_536, 1, Rgb([255, 255, 255]));
        let engine = Arc::new(FixedOcr::new(Ok("ب")));
        let detector = OcrAnswerDetector::new(engine.clone(), DEFAULT_THRESHOLD);

        let result = detector.recognize(&wide).await;
        assert!(matches!(result, Err(OcrError::Preprocess(_))));
        assert_eq!(detector.detect(&wide).await, AnswerLetter::FALLBACK);
        assert!(engine.seen.lock().unwrap().is_empty());
    }
}
