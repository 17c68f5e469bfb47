//! # Paper Cart
//!
//! 题库组卷客户端：录入、打标、搜索、OCR 解析试卷，以及像购物车一样挑选题目并导出试卷。
//!
//! ## 架构设计
//!
//! ### ① 数据层（Models）
//! - `models/` - 后端接口的请求/响应结构，在边界处完成校验
//! - `QuestionRef` - 区分题库题目与未入库的 OCR 题目
//!
//! ### ② 核心状态（Cart）
//! - `cart/` - 试卷篮：去重、删除、相邻交换、清空，不做任何 IO
//!
//! ### ③ 能力层（Clients / Services）
//! - `clients/` - `QuestionBankApi` 及其 HTTP 实现
//! - `services/` - 消息栏、下载保存、视图模型渲染
//!
//! ### ④ 流程层（Workflow）
//! - `workflow/` - `Session` 持有会话内全部状态，每个用户操作一个方法
//!
//! ### ⑤ 视图层（CLI）
//! - `cli/` - 终端命令解析与输出

pub mod cart;
pub mod cli;
pub mod clients;
pub mod config;
pub mod error;
pub mod models;
pub mod services;
pub mod utils;
pub mod workflow;

// 重新导出常用类型
pub use cart::{AddOutcome, Cart, Direction};
pub use clients::{QuestionBankApi, QuestionBankClient};
pub use config::Config;
pub use error::{AppError, AppResult};
pub use models::{CartItem, ExportFormat, ExportMode, ExportRequest, QuestionRef};
pub use workflow::{Confirm, Session};
