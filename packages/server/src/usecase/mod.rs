//! UseCase 層
//!
//! Room Session Coordinator の各操作を 1 ユースケース 1 構造体で表します。
//! UI 層の接続ハンドラはイベントを受け取り、対応するユースケースを呼び出すだけです。

pub mod connect_user;
pub mod disconnect_user;
pub mod error;
pub mod get_rooms;
pub mod history;
pub mod join_room;
pub mod leave_room;
pub mod load_more_messages;
pub mod send_message;
pub mod sequencer;
pub mod typing;

#[cfg(test)]
pub(crate) mod test_support;

pub use connect_user::ConnectUserUseCase;
pub use disconnect_user::{DisconnectOutcome, DisconnectUserUseCase};
pub use error::{GetRoomsError, HistoryError, SendMessageError};
pub use get_rooms::GetRoomsUseCase;
pub use history::{DEFAULT_INITIAL_LIMIT, DEFAULT_SCROLLBACK_LIMIT, HistoryPaginator};
pub use join_room::JoinRoomUseCase;
pub use leave_room::LeaveRoomUseCase;
pub use load_more_messages::LoadMoreMessagesUseCase;
pub use send_message::SendMessageUseCase;
pub use sequencer::RoomEventSequencer;
pub use typing::TypingUseCase;
