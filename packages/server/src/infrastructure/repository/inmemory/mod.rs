//! HashMap / BTreeMap をストレージとして使うインメモリ実装

pub mod connection;
pub mod message_log;
pub mod room;

pub use connection::InMemoryConnectionRegistry;
pub use message_log::InMemoryMessageLog;
pub use room::InMemoryRoomRepository;
