use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tokio::fs;

/// 扫描文件夹中所有待转换的 PDF 文件，按文件名排序
pub async fn scan_pdf_folder(folder_path: &Path) -> Result<Vec<PathBuf>> {
    if !folder_path.exists() {
        anyhow::bail!("文件夹不存在: {}", folder_path.display());
    }

    let mut pdf_files = Vec::new();
    let mut entries = fs::read_dir(folder_path)
        .await
        .with_context(|| format!("无法读取文件夹: {}", folder_path.display()))?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if is_pdf(&path) {
            tracing::info!(
                "发现文档: {}",
                path.file_name().unwrap_or_default().to_string_lossy()
            );
            pdf_files.push(path);
        }
    }

    if pdf_files.is_empty() {
        tracing::warn!("在文件夹 {} 中没有找到 PDF 文件", folder_path.display());
    }

    pdf_files.sort();
    Ok(pdf_files)
}

fn is_pdf(path: &Path) -> bool {
    path.is_file()
        && path
            .extension()
            .and_then(|s| s.to_str())
            .map(|ext| ext.eq_ignore_ascii_case("pdf"))
            .unwrap_or(false)
}
