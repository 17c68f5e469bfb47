//! 终端视图层
//!
//! 把命令分发给 `Session`，再把渲染结果和消息打印出来。

pub mod command;

pub use command::{Command, CommandError, HELP};

use crate::cart::Direction;
use crate::clients::QuestionBankApi;
use crate::models::QuestionDraft;
use crate::services::render::{self, render_cart, CartView};
use crate::workflow::{Confirm, Session};
use std::path::Path;

/// 命令执行后是否继续
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flow {
    Continue,
    Quit,
}

/// 把试卷篮渲染为多行文本
pub fn format_cart(view: &CartView) -> String {
    if view.is_empty() {
        return "🧺 试卷为空".to_string();
    }
    let mut out = format!("🧺 试卷 ({} 题)", view.badge);
    for row in &view.rows {
        let marker = if row.synthesized { "[未入库]" } else { "" };
        out.push_str(&format!("\n  {:>2}. #{}{} {}", row.number, row.id, marker, row.preview));
        if !row.tags.is_empty() {
            out.push_str(&format!(" [{}]", row.tags.join(", ")));
        }
    }
    out
}

/// 执行一条命令，返回值中的错误已经写入消息栏
pub async fn run_command<A, C>(session: &mut Session<A, C>, command: Command) -> Flow
where
    A: QuestionBankApi,
    C: Confirm,
{
    // 失败信息已写入消息栏，这里只负责打印成功时的结果
    match command {
        Command::Help => println!("{}", HELP),
        Command::Quit => return Flow::Quit,
        Command::Tags => {
            if let Ok(tags) = session.load_tags().await {
                println!("🏷️ {}", tags.join(" / "));
            }
        }
        Command::Search(query) => {
            if session.search(&query).await.is_ok() {
                let rows = render::render_questions(&session.search_results().questions, session.cart());
                println!("🔍 共 {} 条", session.search_results().total);
                for row in rows {
                    let mark = if row.in_cart { "✓" } else { " " };
                    println!("  {} #{} {} [{}]", mark, row.id, row.preview, row.tags.join(", "));
                }
            }
        }
        Command::New { content } => {
            let draft = QuestionDraft {
                latex_content: content,
                ..QuestionDraft::default()
            };
            if let Ok(id) = session.submit_question(draft).await {
                println!("🆔 新题目 #{}", id);
            }
        }
        Command::AutoTag { content } => {
            if let Ok(result) = session.auto_tag(&content, "").await {
                println!("🏷️ {}", result.tags.join(", "));
                println!("📝 {}", result.answer);
            }
        }
        Command::Upload(path) => {
            let _ = session.upload_image(Path::new(&path)).await;
        }
        Command::Delete(id) => {
            let _ = session.delete_question(id).await;
        }
        Command::Show(id) => {
            if let Ok(question) = session.view_question(id).await {
                let detail = render::render_detail(&question);
                println!("📖 题目 #{}", detail.id);
                for line in &detail.content {
                    println!("  {}", line);
                }
                if !detail.tags.is_empty() {
                    println!("🏷️ {}", detail.tags.join(", "));
                }
                if let Some(source) = &detail.source {
                    println!("📚 {}", source);
                }
                if let Some(answer) = &detail.answer {
                    println!("📝 参考解答");
                    for line in answer {
                        println!("  {}", line);
                    }
                }
            }
        }
        Command::Answer(id) => {
            if let Ok(answer) = session.view_answer(id).await {
                println!("📝 参考解答");
                for line in render::render_answer(&answer) {
                    println!("  {}", line);
                }
            }
        }
        Command::Add(id) => {
            let _ = session.add_to_cart(id).await;
        }
        Command::Ocr(path) => {
            if let Ok(parsed) = session.parse_exam(Path::new(&path)).await {
                for line in render::render_parsed(parsed) {
                    println!("  {}", line);
                }
            }
        }
        Command::Parsed => {
            for line in render::render_parsed(session.parsed()) {
                println!("  {}", line);
            }
        }
        Command::AddParsed(Some(index)) => {
            let _ = session.add_parsed_to_cart(index);
        }
        Command::AddParsed(None) => {
            let _ = session.add_all_parsed_to_cart();
        }
        Command::SaveParsed => {
            let _ = session.batch_save_parsed().await;
        }
        Command::Cart => println!("{}", format_cart(&render_cart(session.cart()))),
        Command::Up(index) => {
            if session.move_item(index, Direction::Up) {
                println!("{}", format_cart(&render_cart(session.cart())));
            }
        }
        Command::Down(index) => {
            if session.move_item(index, Direction::Down) {
                println!("{}", format_cart(&render_cart(session.cart())));
            }
        }
        Command::Remove(index) => {
            if session.remove(index).is_some() {
                println!("{}", format_cart(&render_cart(session.cart())));
            }
        }
        Command::Clear => {
            session.clear_cart();
        }
        Command::Export {
            format,
            mode,
            title,
        } => {
            if let Ok(path) = session.export(title.as_deref(), mode, format).await {
                println!("📄 {}", path.display());
            }
        }
        Command::History => {
            if let Ok(records) = session.load_export_history().await {
                if records.is_empty() {
                    println!("暂无导出记录");
                }
                for row in render::render_history(records) {
                    println!(
                        "  #{} {} | {} | {} | {} | {} 道题目",
                        row.id, row.title, row.format, row.mode, row.created_at, row.question_count
                    );
                }
            }
        }
        Command::ReExport {
            export_id,
            format,
            mode,
            title,
        } => {
            if session.open_re_export(export_id).await.is_ok() {
                if let Ok(path) = session.re_export(title.as_deref(), mode, format).await {
                    println!("📄 {}", path.display());
                }
            }
        }
    }

    for notice in session.notices_mut().drain() {
        println!("{}", notice);
    }
    Flow::Continue
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cart::Cart;
    use crate::models::Question;

    #[test]
    fn test_format_cart_prints_math_as_written() {
        let mut cart = Cart::new();
        cart.add_question(Question {
            id: 1,
            latex_content: "若 $a<b$ 且 $x>0$".to_string(),
            tags: vec!["A&B".to_string()],
            reference_answer: None,
            source: None,
            image: vec![],
            created_at: None,
        });

        let out = format_cart(&render_cart(&cart));
        assert!(out.contains("#1 若 $a<b$ 且 $x>0$ [A&B]"));
        assert!(!out.contains("&lt;"));
    }

    #[test]
    fn test_format_empty_cart() {
        assert_eq!(format_cart(&render_cart(&Cart::new())), "🧺 试卷为空");
    }
}
