//! 单页处理流程 - 流程层
//!
//! 核心职责：定义"一页试卷 → 一道题"的完整处理流程
//!
//! 流程顺序：
//! 1. 渲染页面，裁剪题目区域和答案区域
//! 2. 从文本层读取答案区域的文字并解析答案
//! 3. 文本层无结果时走 OCR（兜底，始终给出一个字母）
//!
//! 渲染、裁剪、编码、读取文本层都是 CPU 密集的同步调用，放到阻塞线程池执行。

use std::sync::Arc;

use image::RgbImage;
use tracing::{debug, info, warn};

use crate::config::Config;
use crate::error::PageError;
use crate::infrastructure::{ExamDocument, OcrEngine, TextLayerSource};
use crate::models::{AnswerLetter, BoxKind, CalibratedRegions, CropBox, Question};
use crate::services::answer_extractor;
use crate::services::rasterizer::{self, CROP_JPEG_QUALITY};
use crate::services::{OcrAnswerDetector, PageRasterizer, TextLocator};
use crate::utils::logging::truncate_text;
use crate::workflow::page_ctx::PageCtx;

/// 答案来源
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnswerSource {
    /// 文本层
    TextLayer,
    /// OCR 兜底
    Ocr,
}

impl std::fmt::Display for AnswerSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AnswerSource::TextLayer => write!(f, "文本层"),
            AnswerSource::Ocr => write!(f, "OCR"),
        }
    }
}

/// 阻塞阶段的产物
struct PreparedPage {
    question_image: String,
    verification_image: String,
    answer_crop: RgbImage,
    text_answer: Option<AnswerLetter>,
}

/// 单页处理流程
///
/// - 不持有文档，每次调用由上层传入
/// - 只依赖业务能力（services）
pub struct PageProcessor {
    rasterizer: PageRasterizer,
    locator: TextLocator,
    ocr: OcrAnswerDetector,
}

impl PageProcessor {
    pub fn new(config: &Config, engine: Arc<dyn OcrEngine>) -> Self {
        Self::with_parts(
            PageRasterizer::new(config.render_scale),
            TextLocator::new(config.text_padding, config.row_tolerance),
            OcrAnswerDetector::new(engine, config.binarize_threshold),
        )
    }

    pub fn with_parts(
        rasterizer: PageRasterizer,
        locator: TextLocator,
        ocr: OcrAnswerDetector,
    ) -> Self {
        Self {
            rasterizer,
            locator,
            ocr,
        }
    }

    /// 处理一页；任何失败都只记录日志并返回 `None`，不影响其他页
    pub async fn process(
        &self,
        document: Arc<dyn ExamDocument>,
        ctx: &PageCtx,
        regions: &CalibratedRegions,
    ) -> Option<Question> {
        match self.try_process(document, ctx, regions).await {
            Ok((question, source)) => {
                info!(
                    "{} ✓ 答案 {} (来源: {})",
                    ctx, question.correct_answer, source
                );
                Some(question)
            }
            Err(e) => {
                warn!("{} ⚠️ 跳过该页: {}", ctx, e);
                None
            }
        }
    }

    async fn try_process(
        &self,
        document: Arc<dyn ExamDocument>,
        ctx: &PageCtx,
        regions: &CalibratedRegions,
    ) -> Result<(Question, AnswerSource), PageError> {
        let rasterizer = self.rasterizer;
        let locator = self.locator;
        let regions = *regions;
        let page_number = ctx.page_number;

        let prepared = tokio::task::spawn_blocking(move || {
            prepare_page(document.as_ref(), rasterizer, locator, page_number, &regions)
        })
        .await??;

        let (answer, source) = match prepared.text_answer {
            Some(letter) => (letter, AnswerSource::TextLayer),
            None => {
                debug!("{} 文本层未找到答案，改用 OCR", ctx);
                (self.ocr.detect(&prepared.answer_crop).await, AnswerSource::Ocr)
            }
        };

        let question = Question::new(
            prepared.question_image,
            prepared.verification_image,
            answer,
        );
        Ok((question, source))
    }
}

fn prepare_page(
    document: &dyn ExamDocument,
    rasterizer: PageRasterizer,
    locator: TextLocator,
    page_number: usize,
    regions: &CalibratedRegions,
) -> Result<PreparedPage, PageError> {
    let raster = rasterizer.render(document, page_number)?;

    let question_crop = crop_region(&raster, BoxKind::Question, &regions.question)?;
    let answer_crop = crop_region(&raster, BoxKind::Answer, &regions.answer)?;

    let question_image = rasterizer::to_data_url(&rasterizer::encode_jpeg(
        &question_crop,
        CROP_JPEG_QUALITY,
    )?);
    let verification_image =
        rasterizer::to_data_url(&rasterizer::encode_jpeg(&answer_crop, CROP_JPEG_QUALITY)?);

    let text_answer = text_layer_answer(
        document,
        locator,
        page_number,
        rasterizer.scale(),
        &regions.answer,
    );

    Ok(PreparedPage {
        question_image,
        verification_image,
        answer_crop,
        text_answer,
    })
}

fn crop_region(raster: &RgbImage, kind: BoxKind, crop: &CropBox) -> Result<RgbImage, PageError> {
    rasterizer::crop(raster, crop).ok_or(PageError::CropOutOfBounds {
        kind: kind.label(),
        width: raster.width(),
        height: raster.height(),
    })
}

/// 文本层读取失败不算页面失败，交给 OCR 处理
fn text_layer_answer<D: TextLayerSource + ?Sized>(
    document: &D,
    locator: TextLocator,
    page_number: usize,
    scale: f32,
    answer_box: &CropBox,
) -> Option<AnswerLetter> {
    match document.text_layer(page_number, scale) {
        Ok(layer) => {
            let text = locator.text_in_box(&layer, answer_box);
            debug!(
                "第 {} 页答案区域文本: {:?}",
                page_number,
                truncate_text(&text, 40)
            );
            answer_extractor::extract(&text)
        }
        Err(e) => {
            debug!("第 {} 页文本层不可用: {}", page_number, e);
            None
        }
    }
}
