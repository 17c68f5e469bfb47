//! 试卷篮 - 组卷的核心状态
//!
//! 保存按用户顺序排列的题目，负责去重、删除、相邻交换和清空。
//! 不做任何网络调用，也不产生提示消息，由 `workflow::Session` 决定如何反馈给用户。

use crate::models::{CartItem, ParsedQuestion, Question, QuestionRef, SyntheticId};

/// 添加题目的结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    /// 已追加到末尾
    Added(QuestionRef),
    /// 同一题库ID已存在，未做修改
    Duplicate(i64),
}

/// 移动方向
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    Up,
    Down,
}

impl Direction {
    pub fn offset(self) -> isize {
        match self {
            Direction::Up => -1,
            Direction::Down => 1,
        }
    }
}

/// 试卷篮
#[derive(Debug, Default)]
pub struct Cart {
    items: Vec<CartItem>,
    next_seq: u64,
}

impl Cart {
    pub fn new() -> Self {
        Self::default()
    }

    /// 加入题库中的题目，相同ID只保留第一次
    pub fn add_question(&mut self, question: Question) -> AddOutcome {
        if self.contains_persisted(question.id) {
            return AddOutcome::Duplicate(question.id);
        }
        let item = CartItem::from_question(question);
        let id = item.id;
        self.items.push(item);
        AddOutcome::Added(id)
    }

    /// 加入 OCR 解析出的题目，每次都生成新的标识，不做去重
    ///
    /// `batch_index` 是题目在本次解析结果中的位置，`now_millis` 是当前时间戳。
    pub fn add_parsed(
        &mut self,
        parsed: &ParsedQuestion,
        batch_index: usize,
        now_millis: i64,
    ) -> AddOutcome {
        let id = self.synthesize_id(batch_index, now_millis);
        self.items.push(CartItem::from_parsed(parsed, id));
        AddOutcome::Added(QuestionRef::Synthesized(id))
    }

    /// 删除指定位置的题目，越界时不做任何事
    pub fn remove(&mut self, index: usize) -> Option<CartItem> {
        if index < self.items.len() {
            Some(self.items.remove(index))
        } else {
            None
        }
    }

    /// 与相邻题目交换位置，返回是否发生了移动
    pub fn move_item(&mut self, index: usize, direction: Direction) -> bool {
        if index >= self.items.len() {
            return false;
        }
        let target = match index.checked_add_signed(direction.offset()) {
            Some(target) if target < self.items.len() => target,
            _ => return false,
        };
        self.items.swap(index, target);
        true
    }

    /// 清空试卷篮
    pub fn clear(&mut self) {
        self.items.clear();
    }

    /// 当前题目数，即角标数字
    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn items(&self) -> &[CartItem] {
        &self.items
    }

    /// 当前顺序的快照，用于导出
    pub fn snapshot(&self) -> Vec<CartItem> {
        self.items.clone()
    }

    pub fn contains_persisted(&self, id: i64) -> bool {
        self.items
            .iter()
            .any(|item| item.id == QuestionRef::Persisted(id))
    }

    fn synthesize_id(&mut self, batch_index: usize, now_millis: i64) -> SyntheticId {
        let seq = self.next_seq;
        self.next_seq += 1;
        SyntheticId {
            batch_index,
            created_millis: now_millis,
            seq,
        }
    }
}
