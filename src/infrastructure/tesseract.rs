//! OCR 引擎 - 基础设施层
//!
//! 只负责"把一张图片变成文字"，不关心答案字母的含义。

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::error::OcrError;

/// 单块文本的页面分割模式（适合短小的答案标注截图）
pub const PSM_SINGLE_BLOCK: u32 = 6;

/// 一次识别请求的约束
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OcrRequest {
    /// 允许识别出的字符集合
    pub whitelist: String,
    /// 页面分割模式
    pub page_seg_mode: u32,
}

/// OCR 能力
#[async_trait]
pub trait OcrEngine: Send + Sync {
    /// 识别已编码的图片（JPEG / PNG 字节）
    async fn recognize(&self, image: &[u8], request: &OcrRequest) -> Result<String, OcrError>;
}

/// 调用本地 `tesseract` 命令行，图片通过 stdin 传入
#[derive(Debug, Clone)]
pub struct TesseractEngine {
    binary: String,
    languages: String,
}

impl TesseractEngine {
    pub fn new(binary: impl Into<String>, languages: impl Into<String>) -> Self {
        Self {
            binary: binary.into(),
            languages: languages.into(),
        }
    }

    fn command(&self, request: &OcrRequest) -> Command {
        let mut command = Command::new(&self.binary);
        command
            .arg("stdin")
            .arg("stdout")
            .arg("-l")
            .arg(&self.languages)
            .arg("--psm")
            .arg(request.page_seg_mode.to_string())
            .arg("-c")
            .arg(format!("tessedit_char_whitelist={}", request.whitelist))
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        command
    }
}

impl Default for TesseractEngine {
    fn default() -> Self {
        Self::new("tesseract", "ara+eng")
    }
}

#[async_trait]
impl OcrEngine for TesseractEngine {
    async fn recognize(&self, image: &[u8], request: &OcrRequest) -> Result<String, OcrError> {
        let spawn_failed = |source| OcrError::SpawnFailed {
            binary: self.binary.clone(),
            source,
        };

        let mut child = self.command(request).spawn().map_err(spawn_failed)?;
        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(image).await.map_err(spawn_failed)?;
        }

        let output = child.wait_with_output().await.map_err(spawn_failed)?;
        if !output.status.success() {
            return Err(OcrError::ProcessFailed {
                code: output.status.code(),
                stderr: String::from_utf8_lossy(&output.stderr).trim().to_string(),
            });
        }

        let text = String::from_utf8_lossy(&output.stdout).to_string();
        debug!("tesseract 输出 {} 个字符", text.chars().count());
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_missing_binary_reports_spawn_failure() {
        let engine = TesseractEngine::new("tesseract-binary-that-does-not-exist", "eng");
        let request = OcrRequest {
            whitelist: "AB".to_string(),
            page_seg_mode: PSM_SINGLE_BLOCK,
        };
        let err = engine.recognize(&[0u8; 4], &request).await.unwrap_err();
        assert!(matches!(err, OcrError::SpawnFailed { .. }));
    }
}
