//! 编排层（Orchestration Layer）
//!
//! ## 职责
//!
//! 本层负责批量处理和流程调度，是整个系统的"指挥中心"。
//!
//! ## 模块划分
//!
//! ### `app` - 应用入口
//! - 管理应用生命周期（初始化、运行）
//! - 持有 Pdfium 运行时和校准存储
//! - 扫描输入目录，组装 `BatchConverter`
//!
//! ### `batch_converter` - 批量转换器
//! - 校准快照与页数预扫描
//! - 按组并发处理每份文档的页面（Semaphore）
//! - 汇总题目、创建试卷、上报进度
//!
//! ## 层次关系
//!
//! ```text
//! app (处理输入目录)
//!     ↓
//! batch_converter (处理 Vec<文档>)
//!     ↓
//! workflow::PageProcessor (处理单页)
//!     ↓
//! services (能力层：渲染 / 文本层 / 答案解析 / OCR)
//!     ↓
//! infrastructure (基础设施：Pdfium / tesseract / 试卷存储)
//! ```
//!
//! ## 设计原则
//!
//! 1. **单一职责**：app 管资源，batch_converter 管批量
//! 2. **资源隔离**：只有编排层持有 Pdfium
//! 3. **向下依赖**：编排层 → workflow → services → infrastructure
//! 4. **无业务逻辑**：只做调度和统计，不做具体业务判断

pub mod app;
pub mod batch_converter;

// 重新导出主要类型
pub use app::App;
pub use batch_converter::{
    page_windows, processable_pages, test_name_from_filename, BatchConverter, BatchReport,
    BatchSummary, Progress,
};
