use thiserror::Error;

use crate::models::BoxKind;

/// 应用程序错误类型
#[derive(Debug, Error)]
pub enum AppError {
    /// 校准相关错误
    #[error("校准错误: {0}")]
    Calibration(#[from] CalibrationError),
    /// 文档读取错误
    #[error("文档错误: {0}")]
    Document(#[from] DocumentError),
    /// 单页处理错误
    #[error("页面错误: {0}")]
    Page(#[from] PageError),
    /// 题库存储错误
    #[error("存储错误: {0}")]
    Storage(#[from] StorageError),
    /// 配置错误
    #[error("配置错误: {0}")]
    Config(#[from] ConfigError),
    /// 其他错误
    #[error("错误: {0}")]
    Other(String),
}

/// 校准错误
#[derive(Debug, Error)]
pub enum CalibrationError {
    /// 批量转换前未完成校准
    #[error("尚未完成校准: 缺少{}", missing_label(.missing))]
    Missing { missing: Vec<BoxKind> },
    /// 读取校准文件失败
    #[error("读取校准文件失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 写入校准文件失败
    #[error("写入校准文件失败 ({path}): {source}")]
    WriteFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 校准文件格式错误
    #[error("校准文件解析失败 ({path}): {source}")]
    ParseFailed {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

fn missing_label(missing: &[BoxKind]) -> String {
    missing
        .iter()
        .map(|kind| kind.label())
        .collect::<Vec<_>>()
        .join("、")
}

/// 文档级错误，会中止整个批次
#[derive(Debug, Error)]
pub enum DocumentError {
    /// 无法打开文档
    #[error("无法打开文档 {name}: {reason}")]
    OpenFailed { name: String, reason: String },
    /// 无法读取页数
    #[error("无法读取文档页数 {name}: {reason}")]
    PageCountFailed { name: String, reason: String },
    /// 渲染页面失败
    #[error("渲染第 {page} 页失败: {reason}")]
    RenderFailed { page: usize, reason: String },
    /// 读取文本层失败
    #[error("读取第 {page} 页文本层失败: {reason}")]
    TextLayerFailed { page: usize, reason: String },
    /// 页码超出范围
    #[error("页码 {page} 超出范围 [1, {page_count}]")]
    PageOutOfRange { page: usize, page_count: usize },
}

/// 单页处理错误，只跳过当前页
#[derive(Debug, Error)]
pub enum PageError {
    /// 渲染失败
    #[error(transparent)]
    Render(#[from] DocumentError),
    /// 裁剪区域完全落在页面之外
    #[error("裁剪区域 {kind} 超出页面范围 (页面尺寸 {width}x{height})")]
    CropOutOfBounds {
        kind: &'static str,
        width: u32,
        height: u32,
    },
    /// 图片编码失败
    #[error("图片编码失败: {0}")]
    Encode(#[from] image::ImageError),
    /// 后台任务异常退出
    #[error("页面任务执行失败: {0}")]
    TaskJoin(#[from] tokio::task::JoinError),
}

/// OCR 错误
#[derive(Debug, Error)]
pub enum OcrError {
    /// 无法启动 OCR 进程
    #[error("无法启动 OCR 程序 {binary}: {source}")]
    SpawnFailed {
        binary: String,
        #[source]
        source: std::io::Error,
    },
    /// OCR 进程返回错误
    #[error("OCR 程序执行失败 (退出码 {code:?}): {stderr}")]
    ProcessFailed { code: Option<i32>, stderr: String },
    /// 图片预处理失败
    #[error("OCR 图片预处理失败: {0}")]
    Preprocess(#[from] image::ImageError),
}

/// 题库存储错误
#[derive(Debug, Error)]
pub enum StorageError {
    /// 试卷不存在
    #[error("试卷不存在: {section}/{test_id}")]
    TestNotFound { section: String, test_id: String },
    /// 文件读写失败
    #[error("文件读写失败 ({path}): {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 序列化失败
    #[error("试卷序列化失败 ({path}): {source}")]
    Serialize {
        path: String,
        #[source]
        source: serde_json::Error,
    },
}

/// 配置错误
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 配置文件读取失败
    #[error("配置文件读取失败 ({path}): {source}")]
    ReadFailed {
        path: String,
        #[source]
        source: std::io::Error,
    },
    /// 配置文件解析失败
    #[error("配置文件解析失败 ({path}): {source}")]
    TomlParseFailed {
        path: String,
        #[source]
        source: toml::de::Error,
    },
    /// 环境变量解析失败
    #[error("环境变量 {var_name} 解析失败: 值 '{value}' 无法转换为 {expected_type}")]
    EnvVarParseFailed {
        var_name: String,
        value: String,
        expected_type: String,
    },
}

// ========== 便捷构造函数 ==========

impl AppError {
    /// 创建校准缺失错误
    pub fn calibration_missing(missing: Vec<BoxKind>) -> Self {
        AppError::Calibration(CalibrationError::Missing { missing })
    }

    /// 创建存储 IO 错误
    pub fn storage_io(path: impl Into<String>, source: std::io::Error) -> Self {
        AppError::Storage(StorageError::Io {
            path: path.into(),
            source,
        })
    }

    /// 是否为校准缺失（需要操作员先完成校准，重试无意义）
    pub fn is_calibration_missing(&self) -> bool {
        matches!(self, AppError::Calibration(CalibrationError::Missing { .. }))
    }
}

// ========== Result 类型别名 ==========

/// 应用程序结果类型
pub type AppResult<T> = Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_calibration_missing_message_lists_regions() {
        let err = AppError::calibration_missing(vec![BoxKind::Question, BoxKind::Answer]);
        assert!(err.is_calibration_missing());
        let msg = err.to_string();
        assert!(msg.contains("题目区域"));
        assert!(msg.contains("答案区域"));
    }

    #[test]
    fn test_document_error_is_not_calibration_missing() {
        let err = AppError::from(DocumentError::PageCountFailed {
            name: "a.pdf".to_string(),
            reason: "损坏".to_string(),
        });
        assert!(!err.is_calibration_missing());
        assert!(err.to_string().contains("a.pdf"));
    }
}
