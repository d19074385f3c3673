//! 页面处理上下文
//!
//! 封装"我正在处理哪份文档的第几页"这一信息

use std::fmt::Display;

/// 页面处理上下文
#[derive(Debug, Clone)]
pub struct PageCtx {
    /// 文档索引（从1开始，仅用于日志显示）
    pub document_index: usize,

    /// 文档名
    pub document_name: String,

    /// 页码（从1开始）
    pub page_number: usize,

    /// 文档总页数
    pub page_total: usize,
}

impl PageCtx {
    pub fn new(
        document_index: usize,
        document_name: impl Into<String>,
        page_number: usize,
        page_total: usize,
    ) -> Self {
        Self {
            document_index,
            document_name: document_name.into(),
            page_number,
            page_total,
        }
    }
}

impl Display for PageCtx {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "[文档 {} 页 {}/{}]",
            self.document_index, self.page_number, self.page_total
        )
    }
}
