//! ファイルに永続化する実装

pub mod message_log;

pub use message_log::FileMessageLog;
