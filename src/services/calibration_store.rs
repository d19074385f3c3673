//! 校准存储 - 业务能力层
//!
//! 只负责"记住两个裁剪框"，与任何绘制界面解耦。
//! 设置文件是一个 JSON 对象，校准数据保存在固定键 `crop_calibration` 下，
//! 文件中的其他键在重写时原样保留。

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value as JsonValue};
use tracing::{debug, info};

use crate::error::{AppResult, CalibrationError};
use crate::models::{BoxKind, CalibrationConfig, CropBox};

/// 设置文件中保存校准数据的键
pub const CALIBRATION_KEY: &str = "crop_calibration";

/// 校准存储能力
pub trait CalibrationStore {
    /// 当前校准配置
    fn current(&self) -> CalibrationConfig;

    /// 定义一个区域；过小的矩形被静默丢弃并返回 `Ok(false)`
    fn define(&mut self, kind: BoxKind, crop: CropBox) -> AppResult<bool>;
}

/// 基于设置文件的校准存储
#[derive(Debug, Clone)]
pub struct FileCalibrationStore {
    path: PathBuf,
    config: CalibrationConfig,
}

impl FileCalibrationStore {
    /// 读取设置文件；文件不存在时以空配置开始
    pub fn load(path: impl Into<PathBuf>) -> AppResult<Self> {
        let path = path.into();
        let config = match read_settings(&path)? {
            Some(settings) => match settings.get(CALIBRATION_KEY) {
                Some(value) => serde_json::from_value::<CalibrationConfig>(value.clone())
                    .map_err(|source| CalibrationError::ParseFailed {
                        path: path.display().to_string(),
                        source,
                    })?,
                None => CalibrationConfig::default(),
            },
            None => CalibrationConfig::default(),
        };

        debug!(
            "已加载校准: 题目区域 {}, 答案区域 {}",
            config.question_box.is_some(),
            config.answer_box.is_some()
        );
        Ok(Self { path, config })
    }

    /// 清空两个区域并保存
    pub fn reset(&mut self) -> AppResult<()> {
        let cleared = CalibrationConfig::default();
        self.save(&cleared)?;
        self.config = cleared;
        info!("🧹 校准已清空");
        Ok(())
    }

    /// 写入成功后调用方才更新内存中的配置
    fn save(&self, config: &CalibrationConfig) -> AppResult<()> {
        let mut settings = read_settings(&self.path)?.unwrap_or_default();
        let value = serde_json::to_value(config).map_err(|source| {
            CalibrationError::ParseFailed {
                path: self.path.display().to_string(),
                source,
            }
        })?;
        settings.insert(CALIBRATION_KEY.to_string(), value);

        let write_failed = |source| CalibrationError::WriteFailed {
            path: self.path.display().to_string(),
            source,
        };
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(write_failed)?;
        }
        let content = serde_json::to_string_pretty(&JsonValue::Object(settings)).map_err(
            |source| CalibrationError::ParseFailed {
                path: self.path.display().to_string(),
                source,
            },
        )?;
        fs::write(&self.path, content).map_err(write_failed)?;
        Ok(())
    }
}

impl CalibrationStore for FileCalibrationStore {
    fn current(&self) -> CalibrationConfig {
        self.config
    }

    fn define(&mut self, kind: BoxKind, crop: CropBox) -> AppResult<bool> {
        if !crop.is_accepted() {
            debug!(
                "忽略过小的{}: {:.0}x{:.0}",
                kind.label(),
                crop.width,
                crop.height
            );
            return Ok(false);
        }

        let mut next = self.config;
        next.set(kind, crop);
        self.save(&next)?;
        self.config = next;
        info!(
            "✓ {}已保存: x={:.0} y={:.0} w={:.0} h={:.0}",
            kind.label(),
            crop.x,
            crop.y,
            crop.width,
            crop.height
        );
        Ok(true)
    }
}

fn read_settings(path: &Path) -> AppResult<Option<Map<String, JsonValue>>> {
    if !path.exists() {
        return Ok(None);
    }

    let content = fs::read_to_string(path).map_err(|source| CalibrationError::ReadFailed {
        path: path.display().to_string(),
        source,
    })?;
    if content.trim().is_empty() {
        return Ok(None);
    }

    let settings = serde_json::from_str(&content).map_err(|source| {
        CalibrationError::ParseFailed {
            path: path.display().to_string(),
            source,
        }
    })?;
    Ok(Some(settings))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_missing_file_starts_empty() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileCalibrationStore::load(dir.path().join("settings.json")).unwrap();
        assert_eq!(store.current(), CalibrationConfig::default());
    }

    #[test]
    fn test_define_persists_and_reloads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("settings.json");

        let mut store = FileCalibrationStore::load(&path).unwrap();
        assert!(store
            .define(BoxKind::Question, CropBox::new(40.0, 60.0, 500.0, 300.0))
            .unwrap());
        assert!(store
            .define(BoxKind::Answer, CropBox::new(40.0, 900.0, 300.0, 60.0))
            .unwrap());

        let reloaded = FileCalibrationStore::load(&path).unwrap();
        let regions = reloaded.current().require().unwrap();
        assert_eq!(regions.question, CropBox::new(40.0, 60.0, 500.0, 300.0));
        assert_eq!(regions.answer.height, 60.0);
    }

    #[test]
    fn test_small_box_is_discarded() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = FileCalibrationStore::load(&path).unwrap();

        assert!(!store
            .define(BoxKind::Answer, CropBox::new(10.0, 10.0, 20.0, 200.0))
            .unwrap());
        assert!(store.current().answer_box.is_none());
        assert!(!path.exists());
    }

    #[test]
    fn test_other_settings_are_preserved() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, r#"{"theme": "dark"}"#).unwrap();

        let mut store = FileCalibrationStore::load(&path).unwrap();
        store
            .define(BoxKind::Question, CropBox::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();

        let saved: JsonValue = serde_json::from_str(&fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(saved["theme"], "dark");
        assert_eq!(saved[CALIBRATION_KEY]["questionBox"]["width"], 100.0);
        assert!(saved[CALIBRATION_KEY]["answerBox"].is_null());
    }

    #[test]
    fn test_reset_clears_both_boxes() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = FileCalibrationStore::load(&path).unwrap();
        store
            .define(BoxKind::Question, CropBox::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();
        store.reset().unwrap();

        let reloaded = FileCalibrationStore::load(&path).unwrap();
        assert!(!reloaded.current().is_complete());
        assert!(reloaded.current().question_box.is_none());
    }

    #[test]
    fn test_failed_write_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let blocker = dir.path().join("blocker");
        fs::write(&blocker, "").unwrap();

        // 父目录是普通文件，无法写入
        let mut store = FileCalibrationStore::load(blocker.join("settings.json")).unwrap();
        assert!(store
            .define(BoxKind::Question, CropBox::new(0.0, 0.0, 100.0, 100.0))
            .is_err());
        assert_eq!(store.current(), CalibrationConfig::default());
    }

    #[test]
    fn test_failed_reset_keeps_previous_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        let mut store = FileCalibrationStore::load(&path).unwrap();
        store
            .define(BoxKind::Question, CropBox::new(0.0, 0.0, 100.0, 100.0))
            .unwrap();

        fs::remove_file(&path).unwrap();
        fs::create_dir(&path).unwrap();
        assert!(store.reset().is_err());
        assert!(store.current().question_box.is_some());
    }

    #[test]
    fn test_corrupt_file_is_parse_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("settings.json");
        fs::write(&path, "{not json").unwrap();
        assert!(FileCalibrationStore::load(&path).is_err());
    }
}
