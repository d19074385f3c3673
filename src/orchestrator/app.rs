//! 应用入口 - 编排层
//!
//! ## 职责
//!
//! 1. **应用初始化**：读取校准
//! 2. **批量加载**：扫描输入目录中的 PDF，绑定 Pdfium，创建 OCR 引擎和试卷存储
//! 3. **资源管理**：唯一创建 `Arc<Pdfium>` 的模块；只修改校准的命令不需要 Pdfium
//! 4. **向下委托**：校准交给 `CalibrationStore`，转换交给 `BatchConverter`

use std::path::Path;
use std::sync::Arc;

use anyhow::{Context, Result};
use pdfium_render::prelude::Pdfium;
use tracing::{info, warn};

use crate::config::Config;
use crate::infrastructure::{
    load_pdfium, ExamDocument, JsonTestRepository, OcrEngine, PdfiumDocument, TesseractEngine,
    TestRepository,
};
use crate::models::{scan_pdf_folder, BoxKind, CalibrationConfig, CropBox, Test};
use crate::orchestrator::batch_converter::{BatchConverter, Progress};
use crate::services::{CalibrationStore, FileCalibrationStore, PageRasterizer};
use crate::utils::logging;
use crate::workflow::PageProcessor;

/// 应用主结构
pub struct App {
    config: Config,
    calibration: FileCalibrationStore,
}

impl App {
    /// 初始化应用
    pub fn initialize(config: Config) -> Result<Self> {
        let calibration = FileCalibrationStore::load(&config.settings_file)
            .with_context(|| format!("无法读取设置文件: {}", config.settings_file.display()))?;

        Ok(Self {
            config,
            calibration,
        })
    }

    /// 运行批量转换
    pub async fn run(&self) -> Result<Vec<Test>> {
        logging::init_log_file(&self.config.output_log_file)?;
        logging::log_startup(self.config.window_size, self.config.render_scale);

        info!("\n📁 正在扫描待处理的 PDF...");
        let paths = scan_pdf_folder(&self.config.input_folder).await?;

        if paths.is_empty() {
            warn!("⚠️ 没有找到待处理的 PDF 文件，程序结束");
            return Ok(Vec::new());
        }

        let pdfium = bind_pdfium()?;
        let documents: Vec<Arc<dyn ExamDocument>> = paths
            .into_iter()
            .map(|path| Arc::new(PdfiumDocument::new(pdfium.clone(), path)) as Arc<dyn ExamDocument>)
            .collect();

        let engine: Arc<dyn OcrEngine> = Arc::new(TesseractEngine::new(
            self.config.tesseract_binary.clone(),
            self.config.tesseract_languages.clone(),
        ));
        let repository: Arc<dyn TestRepository> =
            Arc::new(JsonTestRepository::new(self.config.output_dir.clone()));
        let converter = BatchConverter::new(
            PageProcessor::new(&self.config, engine),
            repository,
            self.config.section.clone(),
            self.config.window_size,
        );

        let report = converter
            .convert(&documents, self.calibration.current(), log_progress)
            .await
            .context("批量转换失败")?;

        info!("\n日志已保存至: {}", self.config.output_log_file);
        Ok(report.tests)
    }

    /// 当前校准
    pub fn calibration(&self) -> CalibrationConfig {
        self.calibration.current()
    }

    /// 定义一个区域；返回是否被接受
    pub fn calibrate(&mut self, kind: BoxKind, crop: CropBox) -> Result<bool> {
        Ok(self.calibration.define(kind, crop)?)
    }

    /// 清空校准
    pub fn reset_calibration(&mut self) -> Result<()> {
        Ok(self.calibration.reset()?)
    }

    /// 把文档的校准参考页渲染为 PNG
    pub fn preview(&self, pdf: &Path, output: &Path) -> Result<usize> {
        let document = PdfiumDocument::new(bind_pdfium()?, pdf);
        let (page_number, png) = PageRasterizer::new(self.config.render_scale)
            .render_reference_png(&document)
            .with_context(|| format!("无法渲染参考页: {}", pdf.display()))?;

        std::fs::write(output, png)
            .with_context(|| format!("无法写入预览图: {}", output.display()))?;
        info!(
            "🖼️ 已渲染 {} 第 {} 页 → {}",
            document.path().display(),
            page_number,
            output.display()
        );
        Ok(page_number)
    }
}

fn bind_pdfium() -> Result<Arc<Pdfium>> {
    let pdfium = load_pdfium().context("无法加载 Pdfium 动态库")?;
    Ok(Arc::new(pdfium))
}

fn log_progress(progress: Progress) {
    info!(
        "⏳ 进度: {}% ({}/{})",
        progress.percent(),
        progress.processed,
        progress.total
    );
}
