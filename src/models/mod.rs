pub mod cart_item;
pub mod export;
pub mod question;

pub use cart_item::{CartItem, QuestionRef, SyntheticId};
pub use export::{ExportFormat, ExportMode, ExportRecord, ExportRequest, ExportedFile, ReExport};
pub use question::{
    AutoTagResult, ParsedQuestion, Question, QuestionDraft, SearchPage, SearchQuery, UploadedImage,
};
