//! # Exam PDF Import
//!
//! 把扫描或排版好的试卷 PDF 批量转换为选择题试卷
//!
//! ## 架构设计
//!
//! 本系统采用严格的四层架构：
//!
//! ### ① 基础设施层（Infrastructure）
//! - `infrastructure/` - 持有稀缺资源（Pdfium、tesseract 进程、磁盘），只暴露能力
//! - `ExamDocument` - 按页渲染 + 读取文本层
//! - `OcrEngine` / `TestRepository` - OCR 与试卷存储接口
//!
//! ### ② 业务能力层（Services）
//! - `services/` - 描述"我能做什么"，只处理单页或单段文字
//! - `CalibrationStore` - 记住题目区域和答案区域
//! - `PageRasterizer` / `TextLocator` - 渲染裁剪、文本层定位
//! - `answer_extractor` / `OcrAnswerDetector` - 答案解析与 OCR 兜底
//!
//! ### ③ 流程层（Workflow）
//! - `workflow/` - 定义"一页"的完整处理流程
//! - `PageCtx` - 上下文封装（文档编号 + 页码）
//! - `PageProcessor` - 流程编排（渲染 → 文本层 → OCR → 组装题目）
//!
//! ### ④ 编排层（Orchestration）
//! - `orchestrator/app` - 应用入口，管理资源
//! - `orchestrator/batch_converter` - 批量转换，分组并发与进度
//!
//! ## 模块结构

pub mod config;
pub mod error;
pub mod infrastructure;

pub mod models;
pub mod orchestrator;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use config::Config;
pub use error::{AppError, AppResult};
pub use infrastructure::{ExamDocument, OcrEngine, TestRepository};
pub use models::{AnswerLetter, BoxKind, CalibrationConfig, CropBox, Question, Test};
pub use orchestrator::{App, BatchConverter, BatchSummary, Progress};
pub use workflow::{PageCtx, PageProcessor};
