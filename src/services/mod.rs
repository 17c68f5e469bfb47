pub mod download;
pub mod notice;
pub mod render;

pub use download::DownloadWriter;
pub use notice::{Notice, NoticeBoard, NoticeLevel};
pub use render::{render_cart, CartView};
