//! 文本层定位 - 业务能力层
//!
//! 把页面文本层中的片段映射到渲染像素空间，取出落在裁剪框内的片段，
//! 并按"先行后列"的顺序拼接。只适用于简短的答案标注，不是通用排版引擎。

use crate::infrastructure::TextLayer;
use crate::models::CropBox;

/// 裁剪框向外扩展的像素
pub const DEFAULT_PADDING: f32 = 15.0;

/// 纵坐标差不超过该值的片段视为同一行
pub const DEFAULT_ROW_TOLERANCE: f32 = 5.0;

/// 已映射到像素空间的片段
#[derive(Debug, Clone, PartialEq)]
pub struct LocatedFragment {
    pub text: String,
    pub x: f32,
    pub y: f32,
}

/// 文本层定位器
#[derive(Debug, Clone, Copy)]
pub struct TextLocator {
    padding: f32,
    row_tolerance: f32,
}

impl TextLocator {
    pub fn new(padding: f32, row_tolerance: f32) -> Self {
        Self {
            padding,
            row_tolerance,
        }
    }

    /// 取出落在 `crop`（含 padding）内的片段，按阅读顺序排列
    pub fn find_in_box(&self, layer: &TextLayer, crop: &CropBox) -> Vec<LocatedFragment> {
        let mut inside: Vec<LocatedFragment> = layer
            .tokens
            .iter()
            .filter_map(|token| {
                let (x, y) = layer.viewport.to_pixel(token.x, token.y);
                crop.contains_padded(x, y, self.padding)
                    .then(|| LocatedFragment {
                        text: token.text.clone(),
                        x,
                        y,
                    })
            })
            .collect();

        inside.sort_by(|a, b| a.y.total_cmp(&b.y));
        self.order_rows(inside)
    }

    /// 拼接框内所有片段，不插入分隔符
    pub fn text_in_box(&self, layer: &TextLayer, crop: &CropBox) -> String {
        self.find_in_box(layer, crop)
            .into_iter()
            .map(|fragment| fragment.text)
            .collect()
    }

    /// 输入已按 y 升序；与行首片段纵向相差不超过容差的归为同一行，行内按 x 升序
    fn order_rows(&self, sorted_by_y: Vec<LocatedFragment>) -> Vec<LocatedFragment> {
        let mut rows: Vec<Vec<LocatedFragment>> = Vec::new();

        for fragment in sorted_by_y {
            match rows.last_mut() {
                Some(row) if (fragment.y - row[0].y).abs() <= self.row_tolerance => {
                    row.push(fragment)
                }
                _ => rows.push(vec![fragment]),
            }
        }

        rows.into_iter()
            .flat_map(|mut row| {
                row.sort_by(|a, b| a.x.total_cmp(&b.x));
                row
            })
            .collect()
    }
}

impl Default for TextLocator {
    fn default() -> Self {
        Self::new(DEFAULT_PADDING, DEFAULT_ROW_TOLERANCE)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::infrastructure::{TextToken, Viewport};

    /// A4 页面，2 倍渲染
    fn layer(tokens: Vec<TextToken>) -> TextLayer {
        TextLayer {
            viewport: Viewport::new(595.0, 842.0, 2.0),
            tokens,
        }
    }

    /// 由像素坐标反推原生坐标，便于书写用例
    fn token_at_pixel(text: &str, px: f32, py: f32) -> TextToken {
        TextToken::new(text, px / 2.0, 842.0 - py / 2.0)
    }

    #[test]
    fn test_keeps_tokens_inside_padded_box() {
        let crop = CropBox::new(100.0, 100.0, 200.0, 50.0);
        let layer = layer(vec![
            token_at_pixel("in", 150.0, 120.0),
            token_at_pixel("pad", 90.0, 90.0),
            token_at_pixel("out", 400.0, 120.0),
            token_at_pixel("below", 150.0, 170.0),
        ]);

        let texts: Vec<_> = TextLocator::default()
            .find_in_box(&layer, &crop)
            .into_iter()
            .map(|f| f.text)
            .collect();
        assert_eq!(texts, vec!["pad", "in"]);
    }

    #[test]
    fn test_same_row_orders_by_x() {
        let crop = CropBox::new(0.0, 0.0, 1000.0, 1000.0);
        let layer = layer(vec![
            token_at_pixel("C", 300.0, 102.0),
            token_at_pixel("A", 100.0, 104.0),
            token_at_pixel("B", 200.0, 100.0),
        ]);
        assert_eq!(TextLocator::default().text_in_box(&layer, &crop), "ABC");
    }

    #[test]
    fn test_rows_order_top_to_bottom() {
        let crop = CropBox::new(0.0, 0.0, 1000.0, 1000.0);
        let layer = layer(vec![
            token_at_pixel("2", 100.0, 200.0),
            token_at_pixel("1", 500.0, 100.0),
            token_at_pixel("3", 50.0, 204.0),
        ]);
        assert_eq!(TextLocator::default().text_in_box(&layer, &crop), "132");
    }

    #[test]
    fn test_rows_beyond_tolerance_split() {
        let crop = CropBox::new(0.0, 0.0, 1000.0, 1000.0);
        let layer = layer(vec![
            token_at_pixel("low", 10.0, 106.0),
            token_at_pixel("top", 500.0, 100.0),
        ]);
        assert_eq!(TextLocator::default().text_in_box(&layer, &crop), "toplow");
    }

    #[test]
    fn test_empty_box_yields_empty_string() {
        let crop = CropBox::new(0.0, 0.0, 30.0, 30.0);
        let layer = layer(vec![token_at_pixel("far", 900.0, 900.0)]);
        assert_eq!(TextLocator::default().text_in_box(&layer, &crop), "");
    }
}
