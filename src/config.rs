use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{AppResult, ConfigError};

/// 配置文件路径的环境变量
pub const CONFIG_PATH_ENV: &str = "EXAM_IMPORT_CONFIG";

/// 程序配置
#[derive(Clone, Debug, Deserialize)]
#[serde(default)]
pub struct Config {
    /// 待转换 PDF 所在目录
    pub input_folder: PathBuf,
    /// 试卷输出目录
    pub output_dir: PathBuf,
    /// 试卷所属分区
    pub section: String,
    /// 设置文件（保存校准）
    pub settings_file: PathBuf,
    /// 渲染倍率，校准和提取必须一致
    pub render_scale: f32,
    /// 同一文档同时处理的页数
    pub window_size: usize,
    /// 文本层定位时裁剪框的扩展像素
    pub text_padding: f32,
    /// 文本层同行判定的纵向容差
    pub row_tolerance: f32,
    /// OCR 二值化阈值
    pub binarize_threshold: u8,
    /// tesseract 可执行文件
    pub tesseract_binary: String,
    /// tesseract 语言
    pub tesseract_languages: String,
    /// 是否显示详细日志
    pub verbose_logging: bool,
    /// 输出日志文件
    pub output_log_file: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            input_folder: PathBuf::from("input_pdf"),
            output_dir: PathBuf::from("output_tests"),
            section: "default".to_string(),
            settings_file: PathBuf::from("settings.json"),
            render_scale: 2.0,
            window_size: 5,
            text_padding: 15.0,
            row_tolerance: 5.0,
            binarize_threshold: 140,
            tesseract_binary: "tesseract".to_string(),
            tesseract_languages: "ara+eng".to_string(),
            verbose_logging: false,
            output_log_file: "output.txt".to_string(),
        }
    }
}

impl Config {
    /// 读取配置文件（若存在），再用环境变量覆盖
    pub fn load() -> AppResult<Self> {
        let path = std::env::var(CONFIG_PATH_ENV).unwrap_or_else(|_| "exam_import.toml".into());
        let base = Self::from_file(Path::new(&path))?.unwrap_or_default();
        base.with_env()
    }

    /// 只使用默认值和环境变量
    pub fn from_env() -> AppResult<Self> {
        Self::default().with_env()
    }

    /// 读取 TOML 配置文件，文件不存在时返回 `None`
    pub fn from_file(path: &Path) -> AppResult<Option<Self>> {
        if !path.exists() {
            return Ok(None);
        }

        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::ReadFailed {
            path: path.display().to_string(),
            source,
        })?;
        let config = toml::from_str(&content).map_err(|source| ConfigError::TomlParseFailed {
            path: path.display().to_string(),
            source,
        })?;
        Ok(Some(config))
    }

    fn with_env(self) -> AppResult<Self> {
        Ok(Self {
            input_folder: env_or("INPUT_FOLDER", self.input_folder),
            output_dir: env_or("OUTPUT_DIR", self.output_dir),
            section: env_or("SECTION", self.section),
            settings_file: env_or("SETTINGS_FILE", self.settings_file),
            render_scale: parse_env("RENDER_SCALE", "f32", self.render_scale)?,
            window_size: parse_env("WINDOW_SIZE", "usize", self.window_size)?.max(1),
            text_padding: parse_env("TEXT_PADDING", "f32", self.text_padding)?,
            row_tolerance: parse_env("ROW_TOLERANCE", "f32", self.row_tolerance)?,
            binarize_threshold: parse_env("BINARIZE_THRESHOLD", "u8", self.binarize_threshold)?,
            tesseract_binary: env_or("TESSERACT_BINARY", self.tesseract_binary),
            tesseract_languages: env_or("TESSERACT_LANGUAGES", self.tesseract_languages),
            verbose_logging: parse_env("VERBOSE_LOGGING", "bool", self.verbose_logging)?,
            output_log_file: env_or("OUTPUT_LOG_FILE", self.output_log_file),
        })
    }
}

fn env_or<T: From<String>>(var_name: &str, default: T) -> T {
    std::env::var(var_name).map(T::from).unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(var_name: &str, expected_type: &str, default: T) -> AppResult<T> {
    match std::env::var(var_name) {
        Ok(value) => value.trim().parse().map_err(|_| {
            ConfigError::EnvVarParseFailed {
                var_name: var_name.to_string(),
                value,
                expected_type: expected_type.to_string(),
            }
            .into()
        }),
        Err(_) => Ok(default),
    }
}
