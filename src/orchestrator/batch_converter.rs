//! 批量转换器 - 编排层
//!
//! ## 职责
//!
//! 把一组 PDF 文档转换成试卷：每份文档一套 `Test`，文档第 2 页起每页一道题。
//!
//! ## 核心功能
//!
//! 1. **校准快照**：开始前检查并复制两个裁剪框，批次内不再读取校准存储
//! 2. **页数预扫描**：先读取所有文档的页数，得到进度总数；任何文档读取失败立即中止
//! 3. **分组并发**：每组最多 `window_size` 页，组内用 Semaphore + tokio::spawn 并发，
//!    一组全部完成后再开始下一组
//! 4. **保持顺序**：按页码顺序收集题目
//! 5. **进度上报**：每完成 5 页以及最后一页时回调一次
//! 6. **试卷落盘**：文档至少产出一道题才创建试卷

use std::ops::Range;
use std::path::Path;
use std::sync::Arc;

use futures::stream::{FuturesUnordered, StreamExt};
use tokio::sync::Semaphore;
use tracing::{error, info, warn};

use crate::error::{AppError, AppResult, DocumentError};
use crate::infrastructure::{ExamDocument, TestRepository};
use crate::models::{CalibratedRegions, CalibrationConfig, Question, Test};
use crate::utils::logging;
use crate::workflow::{PageCtx, PageProcessor};

/// 进度上报间隔（页）
const PROGRESS_INTERVAL: usize = 5;

/// 进度快照
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Progress {
    pub processed: usize,
    pub total: usize,
}

impl Progress {
    /// 百分比（0-100），没有可处理页时视为已完成
    pub fn percent(&self) -> u32 {
        if self.total == 0 {
            return 100;
        }
        ((self.processed.min(self.total) * 100) / self.total) as u32
    }
}

/// 单次批量转换的统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct BatchSummary {
    /// 生成了试卷的文档
    pub documents_converted: usize,
    /// 没有产出任何题目的文档
    pub documents_skipped: usize,
    /// 成功提取的页
    pub pages_processed: usize,
    /// 处理失败被跳过的页
    pub pages_skipped: usize,
}

/// 批量转换结果
#[derive(Debug, Clone)]
pub struct BatchReport {
    pub tests: Vec<Test>,
    pub summary: BatchSummary,
}

/// 可处理页数：第 1 页为封面
pub fn processable_pages(page_count: usize) -> usize {
    page_count.saturating_sub(1)
}

/// 把第 2..=page_count 页按 `window_size` 分组，返回页码区间
pub fn page_windows(page_count: usize, window_size: usize) -> Vec<Range<usize>> {
    let size = window_size.max(1);
    (2..=page_count)
        .step_by(size)
        .map(|start| start..(start + size).min(page_count + 1))
        .collect()
}

/// 试卷名：文件名（去扩展名）中第一个 `-` 之前的部分
///
/// 前缀为空时使用完整文件名
pub fn test_name_from_filename(filename: &str) -> String {
    let stem = Path::new(filename)
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| filename.to_string());

    let prefix = stem.split('-').next().unwrap_or_default().trim();
    if prefix.is_empty() {
        stem.trim().to_string()
    } else {
        prefix.to_string()
    }
}

/// 批量转换器
pub struct BatchConverter {
    processor: Arc<PageProcessor>,
    repository: Arc<dyn TestRepository>,
    section: String,
    window_size: usize,
}

impl BatchConverter {
    pub fn new(
        processor: PageProcessor,
        repository: Arc<dyn TestRepository>,
        section: impl Into<String>,
        window_size: usize,
    ) -> Self {
        Self {
            processor: Arc::new(processor),
            repository,
            section: section.into(),
            window_size: window_size.max(1),
        }
    }

    /// 转换所有文档，返回生成的试卷
    pub async fn run<F>(
        &self,
        documents: &[Arc<dyn ExamDocument>],
        calibration: CalibrationConfig,
        on_progress: F,
    ) -> AppResult<Vec<Test>>
    where
        F: FnMut(Progress),
    {
        self.convert(documents, calibration, on_progress)
            .await
            .map(|report| report.tests)
    }

    /// 与 `run` 相同，同时返回统计
    pub async fn convert<F>(
        &self,
        documents: &[Arc<dyn ExamDocument>],
        calibration: CalibrationConfig,
        mut on_progress: F,
    ) -> AppResult<BatchReport>
    where
        F: FnMut(Progress),
    {
        let regions = calibration.require()?;

        let page_counts = scan_page_counts(documents)?;
        let total = page_counts.iter().copied().map(processable_pages).sum();
        logging::log_documents_loaded(documents.len(), total);

        let mut progress = Progress {
            processed: 0,
            total,
        };
        let mut summary = BatchSummary::default();
        let mut tests = Vec::new();

        for (idx, (document, page_count)) in documents.iter().zip(page_counts).enumerate() {
            let document_index = idx + 1;
            logging::log_document_start(document_index, documents.len(), document.name(), page_count);

            let questions = self
                .convert_document(
                    document,
                    document_index,
                    page_count,
                    &regions,
                    &mut progress,
                    &mut on_progress,
                )
                .await?;

            let pages = processable_pages(page_count);
            summary.pages_processed += questions.len();
            summary.pages_skipped += pages - questions.len();
            logging::log_document_complete(document_index, questions.len(), pages);

            if questions.is_empty() {
                warn!("[文档 {}] ⚠️ 没有提取到任何题目，不创建试卷", document_index);
                summary.documents_skipped += 1;
                continue;
            }

            let test = self.save_test(document.name(), questions).await?;
            info!(
                "[文档 {}] ✅ 试卷已保存: {}",
                document_index, test
            );
            summary.documents_converted += 1;
            tests.push(test);
        }

        logging::print_final_stats(
            summary.documents_converted,
            summary.documents_skipped,
            summary.pages_processed,
            summary.pages_skipped,
        );

        Ok(BatchReport { tests, summary })
    }

    /// 处理单份文档的所有可处理页，按页码顺序返回题目
    async fn convert_document<F>(
        &self,
        document: &Arc<dyn ExamDocument>,
        document_index: usize,
        page_count: usize,
        regions: &CalibratedRegions,
        progress: &mut Progress,
        on_progress: &mut F,
    ) -> AppResult<Vec<Question>>
    where
        F: FnMut(Progress),
    {
        let windows = page_windows(page_count, self.window_size);
        let semaphore = Arc::new(Semaphore::new(self.window_size));
        let mut questions = Vec::new();

        for (window_idx, window) in windows.iter().enumerate() {
            let window_num = window_idx + 1;
            logging::log_window_start(
                document_index,
                window_num,
                windows.len(),
                window.start,
                window.end - 1,
            );

            let mut slots: Vec<Option<Question>> = vec![None; window.len()];
            let mut pending = FuturesUnordered::new();

            for (slot, page_number) in window.clone().enumerate() {
                let permit = semaphore
                    .clone()
                    .acquire_owned()
                    .await
                    .map_err(|e| AppError::Other(e.to_string()))?;

                let processor = self.processor.clone();
                let document = document.clone();
                let regions = *regions;
                let ctx = PageCtx::new(document_index, document.name(), page_number, page_count);

                let handle = tokio::spawn(async move {
                    let _permit = permit;
                    processor.process(document, &ctx, &regions).await
                });
                pending.push(async move { (slot, page_number, handle.await) });
            }

            // 完成顺序不定，按槽位写回以保持页码顺序
            while let Some((slot, page_number, joined)) = pending.next().await {
                match joined {
                    Ok(question) => slots[slot] = question,
                    Err(e) => error!(
                        "[文档 {}] 第 {} 页任务执行失败: {}",
                        document_index, page_number, e
                    ),
                }

                progress.processed += 1;
                if progress.processed % PROGRESS_INTERVAL == 0 || progress.processed == progress.total
                {
                    on_progress(*progress);
                }
            }

            let produced: Vec<Question> = slots.into_iter().flatten().collect();
            logging::log_window_complete(document_index, window_num, produced.len(), window.len());
            questions.extend(produced);
        }

        Ok(questions)
    }

    /// 创建试卷并追加题目；追加失败时删除空试卷
    async fn save_test(&self, filename: &str, questions: Vec<Question>) -> AppResult<Test> {
        let name = test_name_from_filename(filename);
        let test_id = self
            .repository
            .create_test(&self.section, &name, filename)
            .await?;

        if let Err(e) = self
            .repository
            .add_questions(&self.section, &test_id, questions.clone())
            .await
        {
            if let Err(cleanup) = self.repository.delete_test(&self.section, &test_id).await {
                warn!("⚠️ 删除未完成的试卷 {} 失败: {}", test_id, cleanup);
            }
            return Err(e);
        }

        Ok(Test {
            id: test_id,
            name,
            questions,
            source_text: Some(filename.to_string()),
        })
    }
}

/// 预先读取所有文档页数
fn scan_page_counts(documents: &[Arc<dyn ExamDocument>]) -> Result<Vec<usize>, DocumentError> {
    documents
        .iter()
        .map(|document| {
            document.page_count().inspect_err(|e| {
                error!("❌ 无法读取文档 {}: {}", document.name(), e);
            })
        })
        .collect()
}
