/// 日志工具模块
///
/// 提供日志初始化、格式化和输出的辅助函数
use std::fs;

use anyhow::{Context, Result};
use tracing::info;
use tracing_subscriber::EnvFilter;

/// 初始化 tracing 订阅者，`RUST_LOG` 优先
///
/// # 参数
/// - `verbose`: 未设置 `RUST_LOG` 时是否输出 debug 日志
pub fn init(verbose: bool) {
    let default_level = if verbose {
        "exam_pdf_import=debug,info"
    } else {
        "info"
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| default_level.into()),
        )
        .try_init();
}

/// 初始化日志文件
///
/// # 参数
/// - `log_file_path`: 日志文件路径
pub fn init_log_file(log_file_path: &str) -> Result<()> {
    let log_header = format!(
        "{}\n试卷导入日志 - {}\n{}\n\n",
        "=".repeat(60),
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S"),
        "=".repeat(60)
    );
    fs::write(log_file_path, log_header)
        .with_context(|| format!("无法写入日志文件: {}", log_file_path))?;
    Ok(())
}

/// 记录程序启动信息
pub fn log_startup(window_size: usize, render_scale: f32) {
    info!("{}", "=".repeat(60));
    info!("🚀 程序启动 - PDF 试卷批量导入");
    info!("📊 每份文档并发页数: {}", window_size);
    info!("🖼️ 渲染倍率: {}", render_scale);
    info!("{}", "=".repeat(60));
}

/// 记录文档加载信息
///
/// # 参数
/// - `documents`: 文档数
/// - `total_pages`: 待处理页数（不含封面）
pub fn log_documents_loaded(documents: usize, total_pages: usize) {
    info!("✓ 找到 {} 个待处理的文档", documents);
    info!("📋 共 {} 页待处理（每份文档第 1 页为封面，跳过）\n", total_pages);
}

/// 记录文档开始信息
pub fn log_document_start(document_index: usize, total: usize, name: &str, page_count: usize) {
    info!("\n{}", "=".repeat(60));
    info!("[文档 {}] 📄 开始处理 {}/{}: {}", document_index, document_index, total, name);
    info!("[文档 {}] 总页数: {}", document_index, page_count);
    info!("{}", "=".repeat(60));
}

/// 记录窗口开始信息
///
/// # 参数
/// - `document_index`: 文档编号
/// - `window_num`: 窗口编号
/// - `total_windows`: 窗口总数
/// - `first_page`: 起始页码
/// - `last_page`: 结束页码
pub fn log_window_start(
    document_index: usize,
    window_num: usize,
    total_windows: usize,
    first_page: usize,
    last_page: usize,
) {
    info!(
        "[文档 {}] 📦 第 {}/{} 组: 第 {}-{} 页",
        document_index, window_num, total_windows, first_page, last_page
    );
}

/// 记录窗口完成信息
pub fn log_window_complete(document_index: usize, window_num: usize, success: usize, total: usize) {
    info!(
        "[文档 {}] ✓ 第 {} 组完成: 成功 {}/{}",
        document_index, window_num, success, total
    );
}

/// 记录文档完成信息
pub fn log_document_complete(document_index: usize, questions: usize, pages: usize) {
    info!("\n{}", "─".repeat(60));
    info!(
        "[文档 {}] 题目统计: 成功 {}, 跳过 {}, 总计 {}",
        document_index,
        questions,
        pages - questions.min(pages),
        pages
    );
    info!("{}", "─".repeat(60));
}

/// 打印最终统计信息
///
/// # 参数
/// - `converted`: 生成试卷的文档数
/// - `skipped`: 没有产出题目的文档数
/// - `pages_processed`: 成功的页数
/// - `pages_skipped`: 失败的页数
pub fn print_final_stats(
    converted: usize,
    skipped: usize,
    pages_processed: usize,
    pages_skipped: usize,
) {
    info!("\n{}", "=".repeat(60));
    info!("📊 全部处理完成统计");
    info!(
        "完成时间: {}",
        chrono::Local::now().format("%Y-%m-%d %H:%M:%S")
    );
    info!("{}", "=".repeat(60));
    info!("✅ 生成试卷: {}/{}", converted, converted + skipped);
    info!("📝 题目: {} 道", pages_processed);
    info!("❌ 跳过页面: {}", pages_skipped);
    info!("{}", "=".repeat(60));
}

/// 截断长文本用于日志显示
///
/// # 参数
/// - `text`: 原始文本
/// - `max_len`: 最大长度
///
/// # 返回
/// 返回截断后的文本
pub fn truncate_text(text: &str, max_len: usize) -> String {
    if text.chars().count() > max_len {
        text.chars().take(max_len).collect::<String>() + "..."
    } else {
        text.to_string()
    }
}
