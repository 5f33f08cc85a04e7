//! Core types for the thread scraper: canonical thread model, export formats,
//! Jalali calendar helpers and the pure run state machine.
mod format;
pub mod jalali;
mod markup;
mod model;
mod msg;
mod reply;
mod state;
mod update;

pub use format::{ExportDocument, ExportFormat, UnknownFormat};
pub use jalali::JalaliDate;
pub use markup::{Markup, Node};
pub use model::{Post, Thread, ThreadMeta};
pub use msg::Msg;
pub use reply::{reply_order, reply_order_of, ReplyEntry};
pub use state::{PageWarning, RunFailureInfo, RunStage, RunState};
pub use update::update;
