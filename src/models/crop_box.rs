//! 裁剪区域与校准配置
//!
//! 所有坐标都位于"页面按固定倍率渲染后"的像素空间中。

use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

/// 校准时和提取时共用的渲染倍率
pub const RENDER_SCALE: f32 = 2.0;

/// 框选区域的最小边长（像素），不大于该值的矩形视为误触并丢弃
pub const MIN_BOX_SIDE: f32 = 20.0;

/// 区域类型
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum BoxKind {
    /// 题目区域
    Question,
    /// 答案区域
    Answer,
}

impl BoxKind {
    /// 日志中显示的名称
    pub fn label(self) -> &'static str {
        match self {
            BoxKind::Question => "题目区域",
            BoxKind::Answer => "答案区域",
        }
    }
}

/// 从命令行参数解析
impl FromStr for BoxKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "question" | "q" => Ok(BoxKind::Question),
            "answer" | "a" => Ok(BoxKind::Answer),
            _ => Err(format!("未知区域: {}", value)),
        }
    }
}

/// 像素空间中的矩形
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct CropBox {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl CropBox {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// 由拖拽的起点和终点生成矩形，拖拽方向任意
    pub fn from_drag(start: (f32, f32), end: (f32, f32)) -> Self {
        Self {
            x: start.0.min(end.0).max(0.0),
            y: start.1.min(end.1).max(0.0),
            width: (end.0 - start.0).abs(),
            height: (end.1 - start.1).abs(),
        }
    }

    /// 是否足够大，可以作为校准区域
    pub fn is_accepted(&self) -> bool {
        self.x >= 0.0 && self.y >= 0.0 && self.width > MIN_BOX_SIDE && self.height > MIN_BOX_SIDE
    }

    pub fn right(&self) -> f32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> f32 {
        self.y + self.height
    }

    /// 判断点是否落在向外扩展 `padding` 后的矩形内（含边界）
    pub fn contains_padded(&self, px: f32, py: f32, padding: f32) -> bool {
        px >= self.x - padding
            && px <= self.right() + padding
            && py >= self.y - padding
            && py <= self.bottom() + padding
    }
}

/// 持久化的校准配置
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CalibrationConfig {
    pub question_box: Option<CropBox>,
    pub answer_box: Option<CropBox>,
}

impl CalibrationConfig {
    pub fn get(&self, kind: BoxKind) -> Option<CropBox> {
        match kind {
            BoxKind::Question => self.question_box,
            BoxKind::Answer => self.answer_box,
        }
    }

    pub fn set(&mut self, kind: BoxKind, crop: CropBox) {
        match kind {
            BoxKind::Question => self.question_box = Some(crop),
            BoxKind::Answer => self.answer_box = Some(crop),
        }
    }

    pub fn is_complete(&self) -> bool {
        self.question_box.is_some() && self.answer_box.is_some()
    }

    /// 取出批量转换所需的两个区域，缺任何一个都返回校准缺失
    pub fn require(&self) -> AppResult<CalibratedRegions> {
        match (self.question_box, self.answer_box) {
            (Some(question), Some(answer)) => Ok(CalibratedRegions { question, answer }),
            _ => {
                let missing = [BoxKind::Question, BoxKind::Answer]
                    .into_iter()
                    .filter(|kind| self.get(*kind).is_none())
                    .collect();
                Err(AppError::calibration_missing(missing))
            }
        }
    }
}

/// 批次开始时的校准快照，批次运行期间不再变化
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CalibratedRegions {
    pub question: CropBox,
    pub answer: CropBox,
}

/// 校准参考页：多于一页时取第 2 页（第 1 页是封面），否则取第 1 页
pub fn reference_page_number(page_count: usize) -> usize {
    if page_count > 1 {
        2
    } else {
        1
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_box_kind_parses_cli_names() {
        assert_eq!("question".parse::<BoxKind>(), Ok(BoxKind::Question));
        assert_eq!(" A ".parse::<BoxKind>(), Ok(BoxKind::Answer));
        assert!("header".parse::<BoxKind>().is_err());
    }

    #[test]
    fn test_from_drag_normalizes_direction() {
        let crop = CropBox::from_drag((120.0, 80.0), (20.0, 30.0));
        assert_eq!(crop, CropBox::new(20.0, 30.0, 100.0, 50.0));
    }

    #[test]
    fn test_is_accepted_requires_both_sides_above_minimum() {
        assert!(CropBox::new(0.0, 0.0, 21.0, 21.0).is_accepted());
        assert!(!CropBox::new(0.0, 0.0, 20.0, 100.0).is_accepted());
        assert!(!CropBox::new(0.0, 0.0, 100.0, 5.0).is_accepted());
        assert!(!CropBox::new(-1.0, 0.0, 100.0, 100.0).is_accepted());
    }

    #[test]
    fn test_contains_padded_includes_edges() {
        let crop = CropBox::new(100.0, 100.0, 50.0, 50.0);
        assert!(crop.contains_padded(85.0, 85.0, 15.0));
        assert!(crop.contains_padded(165.0, 165.0, 15.0));
        assert!(!crop.contains_padded(84.9, 120.0, 15.0));
        assert!(!crop.contains_padded(120.0, 165.1, 15.0));
    }

    #[test]
    fn test_require_reports_missing_regions() {
        let mut config = CalibrationConfig::default();
        let err = config.require().unwrap_err();
        assert!(err.is_calibration_missing());

        config.set(BoxKind::Question, CropBox::new(0.0, 0.0, 100.0, 100.0));
        assert!(!config.is_complete());
        let err = config.require().unwrap_err();
        assert!(err.to_string().contains("答案区域"));
        assert!(!err.to_string().contains("题目区域"));

        config.set(BoxKind::Answer, CropBox::new(0.0, 200.0, 100.0, 40.0));
        let regions = config.require().unwrap();
        assert_eq!(regions.answer.y, 200.0);
    }

    #[test]
    fn test_reference_page_skips_cover() {
        assert_eq!(reference_page_number(1), 1);
        assert_eq!(reference_page_number(2), 2);
        assert_eq!(reference_page_number(30), 2);
    }

    #[test]
    fn test_calibration_config_serializes_camel_case() {
        let mut config = CalibrationConfig::default();
        config.set(BoxKind::Answer, CropBox::new(1.0, 2.0, 30.0, 40.0));
        let json = serde_json::to_value(config).unwrap();
        assert!(json["questionBox"].is_null());
        assert_eq!(json["answerBox"]["width"], 30.0);
    }
}
