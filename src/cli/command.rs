//! 终端命令解析
//!
//! 每条命令对应网页上的一个按钮或表单提交。题号对用户从 1 开始计。

use crate::models::{ExportFormat, ExportMode, SearchQuery};
use thiserror::Error;

/// 命令解析错误
#[derive(Debug, Error, PartialEq, Eq)]
pub enum CommandError {
    #[error("未知命令: {0}，输入 help 查看帮助")]
    Unknown(String),
    #[error("用法: {0}")]
    Usage(&'static str),
    #[error("{0}")]
    Invalid(String),
}

/// 用户命令
#[derive(Debug, Clone, PartialEq)]
pub enum Command {
    Help,
    Tags,
    Search(SearchQuery),
    New { content: String },
    AutoTag { content: String },
    Upload(String),
    Delete(i64),
    Show(i64),
    Answer(i64),
    Add(i64),
    Ocr(String),
    Parsed,
    AddParsed(Option<usize>),
    SaveParsed,
    Cart,
    Up(usize),
    Down(usize),
    Remove(usize),
    Clear,
    Export {
        format: ExportFormat,
        mode: ExportMode,
        title: Option<String>,
    },
    History,
    ReExport {
        export_id: i64,
        format: Option<ExportFormat>,
        mode: Option<ExportMode>,
        title: Option<String>,
    },
    Quit,
}

pub const HELP: &str = "\
命令:
  tags                              加载标签
  search [关键词] [#标签..] [page:N] 搜索题目
  new <题目内容>                     录入题目（附带已上传图片）
  autotag <题目内容>                 自动打标
  upload <图片路径>                  上传题目图片
  delete <ID>                       删除题目
  show <ID>                         查看题目详情
  answer <ID>                       查看参考解答
  add <ID>                          加入试卷
  ocr <试卷图片路径>                  OCR 解析试卷
  parsed                            查看解析结果
  add-parsed <题号|all>              把解析结果加入试卷
  save-parsed                       批量保存解析结果
  cart                              查看试卷
  up <题号> / down <题号>            上移 / 下移
  rm <题号>                          移除
  clear                             清空试卷
  export [pdf|docx|tex] [questions|with-answers] [标题]
  history                           导出记录
  reexport <记录ID> [格式] [模式] [标题]
  quit                              退出";

fn position(arg: Option<&str>, usage: &'static str) -> Result<usize, CommandError> {
    let raw = arg.ok_or(CommandError::Usage(usage))?;
    match raw.parse::<usize>() {
        Ok(n) if n >= 1 => Ok(n - 1),
        _ => Err(CommandError::Invalid(format!("题号必须是正整数: {}", raw))),
    }
}

fn id(arg: Option<&str>, usage: &'static str) -> Result<i64, CommandError> {
    let raw = arg.ok_or(CommandError::Usage(usage))?;
    raw.parse()
        .map_err(|_| CommandError::Invalid(format!("ID必须是整数: {}", raw)))
}

fn rest(args: &[&str]) -> Option<String> {
    let joined = args.join(" ");
    let trimmed = joined.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

fn parse_search(args: &[&str]) -> Result<SearchQuery, CommandError> {
    let mut query = SearchQuery::default();
    let mut words = Vec::new();
    for arg in args {
        if let Some(tag) = arg.strip_prefix('#').filter(|t| !t.is_empty()) {
            query.tags.push(tag.to_string());
        } else if let Some(page) = arg.strip_prefix("page:") {
            query.page = page
                .parse()
                .ok()
                .filter(|p| *p >= 1)
                .ok_or_else(|| CommandError::Invalid(format!("页码无效: {}", page)))?;
        } else {
            words.push(*arg);
        }
    }
    query.keyword = rest(&words);
    Ok(query)
}

/// 解析 `[格式] [模式] [标题...]`，格式和模式可以任意顺序出现在标题之前
fn parse_export_args(
    args: &[&str],
) -> (Option<ExportFormat>, Option<ExportMode>, Option<String>) {
    let mut format = None;
    let mut mode = None;
    let mut consumed = 0;
    for arg in args.iter().take(2) {
        if format.is_none() {
            if let Ok(f) = arg.parse::<ExportFormat>() {
                format = Some(f);
                consumed += 1;
                continue;
            }
        }
        if mode.is_none() {
            if let Ok(m) = arg.parse::<ExportMode>() {
                mode = Some(m);
                consumed += 1;
                continue;
            }
        }
        break;
    }
    (format, mode, rest(&args[consumed..]))
}

impl Command {
    /// 解析一行输入，空行返回 `None`
    pub fn parse(line: &str) -> Result<Option<Self>, CommandError> {
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some((&name, args)) = tokens.split_first() else {
            return Ok(None);
        };
        let first = args.first().copied();

        let command = match name.to_ascii_lowercase().as_str() {
            "help" | "?" => Command::Help,
            "tags" => Command::Tags,
            "search" => Command::Search(parse_search(args)?),
            "new" => Command::New {
                content: rest(args).ok_or(CommandError::Usage("new <题目内容>"))?,
            },
            "autotag" => Command::AutoTag {
                content: rest(args).ok_or(CommandError::Usage("autotag <题目内容>"))?,
            },
            "upload" => Command::Upload(rest(args).ok_or(CommandError::Usage("upload <图片路径>"))?),
            "delete" => Command::Delete(id(first, "delete <ID>")?),
            "show" => Command::Show(id(first, "show <ID>")?),
            "answer" => Command::Answer(id(first, "answer <ID>")?),
            "add" => Command::Add(id(first, "add <ID>")?),
            "ocr" => Command::Ocr(rest(args).ok_or(CommandError::Usage("ocr <试卷图片路径>"))?),
            "parsed" => Command::Parsed,
            "add-parsed" => match first {
                Some("all") => Command::AddParsed(None),
                other => Command::AddParsed(Some(position(other, "add-parsed <题号|all>")?)),
            },
            "save-parsed" => Command::SaveParsed,
            "cart" | "ls" => Command::Cart,
            "up" => Command::Up(position(first, "up <题号>")?),
            "down" => Command::Down(position(first, "down <题号>")?),
            "rm" | "remove" => Command::Remove(position(first, "rm <题号>")?),
            "clear" => Command::Clear,
            "export" => {
                let (format, mode, title) = parse_export_args(args);
                Command::Export {
                    format: format.unwrap_or_default(),
                    mode: mode.unwrap_or_default(),
                    title,
                }
            }
            "history" => Command::History,
            "reexport" => {
                let export_id = id(first, "reexport <记录ID> [格式] [模式] [标题]")?;
                let (format, mode, title) = parse_export_args(&args[1..]);
                Command::ReExport {
                    export_id,
                    format,
                    mode,
                    title,
                }
            }
            "quit" | "exit" | "q" => Command::Quit,
            other => return Err(CommandError::Unknown(other.to_string())),
        };
        Ok(Some(command))
    }
}
