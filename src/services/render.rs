//! 视图模型渲染
//!
//! 纯函数：把会话状态映射为可直接展示的结构。
//! 所有用户内容只在这里经过 `escape_terminal`，调用方拿到的文本可以直接打印。
//! 题目中的 `<`、`&` 等字符原样保留，只处理会破坏终端显示的控制字符。

use crate::cart::Cart;
use crate::models::{CartItem, ExportRecord, ParsedQuestion, Question};
use crate::utils::truncate_text;
use regex::Regex;
use std::sync::OnceLock;

/// 预览文字的最大字符数
pub const PREVIEW_CHARS: usize = 80;

fn img_src() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r#"<img\s+[^>]*src="([^"]+)""#).expect("图片正则有效"))
}

/// 终端转义：换行和制表符折叠为空格，其他控制字符（如 ANSI 转义序列的 ESC）替换为 U+FFFD
pub fn escape_terminal(text: &str) -> String {
    text.chars()
        .map(|c| match c {
            '\n' | '\r' | '\t' => ' ',
            c if c.is_control() => char::REPLACEMENT_CHARACTER,
            c => c,
        })
        .collect()
}

/// 提取题目内容中内嵌图片的地址
pub fn extract_img_urls(html: &str) -> Vec<String> {
    img_src()
        .captures_iter(html)
        .filter_map(|cap| cap.get(1).map(|m| m.as_str().to_string()))
        .collect()
}

/// 试卷篮中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartRow {
    /// 从 1 开始的题号
    pub number: usize,
    pub id: String,
    pub preview: String,
    pub tags: Vec<String>,
    pub synthesized: bool,
    pub image_count: usize,
    pub can_move_up: bool,
    pub can_move_down: bool,
}

/// 试卷篮视图
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CartView {
    /// 角标数字
    pub badge: usize,
    pub rows: Vec<CartRow>,
}

impl CartView {
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

fn preview(content: &str) -> String {
    escape_terminal(&truncate_text(content.trim(), PREVIEW_CHARS))
}

fn render_row(index: usize, len: usize, item: &CartItem) -> CartRow {
    CartRow {
        number: index + 1,
        id: escape_terminal(&item.id.to_string()),
        preview: preview(&item.latex_content),
        tags: item.tags.iter().map(|t| escape_terminal(t)).collect(),
        synthesized: item.is_synthesized(),
        image_count: item.images.len() + extract_img_urls(&item.latex_content).len(),
        can_move_up: index > 0,
        can_move_down: index + 1 < len,
    }
}

/// 渲染试卷篮
pub fn render_cart(cart: &Cart) -> CartView {
    let len = cart.len();
    CartView {
        badge: len,
        rows: cart
            .items()
            .iter()
            .enumerate()
            .map(|(i, item)| render_row(i, len, item))
            .collect(),
    }
}

/// 搜索结果中的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionRow {
    pub id: i64,
    pub preview: String,
    pub tags: Vec<String>,
    pub in_cart: bool,
}

/// 渲染题目列表，并标记已在试卷中的题目
pub fn render_questions(questions: &[Question], cart: &Cart) -> Vec<QuestionRow> {
    questions
        .iter()
        .map(|q| QuestionRow {
            id: q.id,
            preview: preview(&q.latex_content),
            tags: q.tags.iter().map(|t| escape_terminal(t)).collect(),
            in_cart: cart.contains_persisted(q.id),
        })
        .collect()
}

/// 题目详情，正文和解答按行保留
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QuestionDetail {
    pub id: i64,
    pub content: Vec<String>,
    pub tags: Vec<String>,
    pub answer: Option<Vec<String>>,
    pub source: Option<String>,
}

fn block(text: &str) -> Vec<String> {
    text.trim().lines().map(escape_terminal).collect()
}

/// 渲染题目详情
pub fn render_detail(question: &Question) -> QuestionDetail {
    QuestionDetail {
        id: question.id,
        content: block(&question.latex_content),
        tags: question.tags.iter().map(|t| escape_terminal(t)).collect(),
        answer: question.reference_answer.as_deref().map(block),
        source: question.source.as_deref().map(escape_terminal),
    }
}

/// 渲染单独查看的参考解答
pub fn render_answer(answer: &str) -> Vec<String> {
    block(answer)
}

/// 渲染 OCR 解析结果
pub fn render_parsed(parsed: &[ParsedQuestion]) -> Vec<String> {
    parsed
        .iter()
        .enumerate()
        .map(|(i, q)| {
            let mut line = format!("题目 {}: {}", i + 1, preview(&q.question));
            if !q.tags.is_empty() {
                let tags: Vec<String> = q.tags.iter().map(|t| escape_terminal(t)).collect();
                line.push_str(&format!(" [标签: {}]", tags.join(", ")));
            }
            if q.answer.is_some() {
                line.push_str(" [含解答]");
            }
            line
        })
        .collect()
}

/// 导出记录的一行
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HistoryRow {
    pub id: i64,
    pub title: String,
    pub format: String,
    pub mode: &'static str,
    pub created_at: String,
    pub question_count: usize,
}

/// 渲染导出记录
pub fn render_history(records: &[ExportRecord]) -> Vec<HistoryRow> {
    records
        .iter()
        .map(|r| HistoryRow {
            id: r.id,
            title: escape_terminal(&r.title),
            format: r.export_format.extension().to_ascii_uppercase(),
            mode: r.export_mode.label(),
            created_at: format_date(r.created_at.as_deref()),
            question_count: r.question_ids.len(),
        })
        .collect()
}

/// 格式化后端返回的时间，无法解析时原样返回
pub fn format_date(raw: Option<&str>) -> String {
    let Some(raw) = raw.map(str::trim).filter(|s| !s.is_empty()) else {
        return "-".to_string();
    };
    if let Ok(dt) = chrono::DateTime::parse_from_rfc3339(raw) {
        return dt.format("%Y/%m/%d %H:%M").to_string();
    }
    for pattern in ["%Y-%m-%d %H:%M:%S", "%Y-%m-%dT%H:%M:%S", "%Y-%m-%dT%H:%M:%S%.f"] {
        if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(raw, pattern) {
            return dt.format("%Y/%m/%d %H:%M").to_string();
        }
    }
    escape_terminal(raw)
}
