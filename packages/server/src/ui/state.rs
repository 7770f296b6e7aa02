//! Server state and dependency wiring.

use std::sync::Arc;

use irori_shared::time::Clock;

use crate::{
    domain::{ConnectionRegistry, MessageLog, MessagePusher, RoomRepository, TokenVerifier},
    usecase::{
        ConnectUserUseCase, DisconnectUserUseCase, GetRoomsUseCase, HistoryPaginator,
        JoinRoomUseCase, LeaveRoomUseCase, LoadMoreMessagesUseCase, RoomEventSequencer,
        SendMessageUseCase, TypingUseCase,
    },
};

/// Stores and collaborators the coordinator is built from
pub struct Dependencies {
    pub rooms: Arc<dyn RoomRepository>,
    pub registry: Arc<dyn ConnectionRegistry>,
    pub message_log: Arc<dyn MessageLog>,
    pub message_pusher: Arc<dyn MessagePusher>,
    pub token_verifier: Arc<dyn TokenVerifier>,
    pub clock: Arc<dyn Clock>,
    /// Messages delivered on join
    pub initial_limit: usize,
    /// Messages per `load_more_messages`
    pub scrollback_limit: usize,
}

/// Shared application state
pub struct AppState {
    /// ConnectUserUseCase（接続・オンライン登録のユースケース）
    pub connect_user_usecase: Arc<ConnectUserUseCase>,
    /// DisconnectUserUseCase（切断処理のユースケース）
    pub disconnect_user_usecase: Arc<DisconnectUserUseCase>,
    /// JoinRoomUseCase（ルーム参加のユースケース）
    pub join_room_usecase: Arc<JoinRoomUseCase>,
    /// LeaveRoomUseCase（ルーム退出のユースケース）
    pub leave_room_usecase: Arc<LeaveRoomUseCase>,
    /// SendMessageUseCase（メッセージ送信のユースケース）
    pub send_message_usecase: Arc<SendMessageUseCase>,
    /// LoadMoreMessagesUseCase（履歴遡りのユースケース）
    pub load_more_messages_usecase: Arc<LoadMoreMessagesUseCase>,
    /// TypingUseCase（タイピング表示のユースケース）
    pub typing_usecase: Arc<TypingUseCase>,
    /// GetRoomsUseCase（ルーム一覧取得のユースケース）
    pub get_rooms_usecase: Arc<GetRoomsUseCase>,
    /// ハンドシェイク時のトークン検証
    pub token_verifier: Arc<dyn TokenVerifier>,
    /// ヘルスチェック用
    pub registry: Arc<dyn ConnectionRegistry>,
}

impl AppState {
    /// Build every use case from the shared stores.
    pub fn new(deps: Dependencies) -> Self {
        let history = Arc::new(HistoryPaginator::new(
            deps.message_log.clone(),
            deps.initial_limit,
            deps.scrollback_limit,
        ));
        // ルームの状態を変更するユースケースはすべて同じゲートを共有する
        let sequencer = Arc::new(RoomEventSequencer::new());

        Self {
            connect_user_usecase: Arc::new(ConnectUserUseCase::new(
                deps.registry.clone(),
                deps.message_pusher.clone(),
            )),
            disconnect_user_usecase: Arc::new(DisconnectUserUseCase::new(
                deps.rooms.clone(),
                deps.registry.clone(),
                deps.message_pusher.clone(),
                deps.clock.clone(),
                sequencer.clone(),
            )),
            join_room_usecase: Arc::new(JoinRoomUseCase::new(
                deps.rooms.clone(),
                history.clone(),
                deps.message_pusher.clone(),
                deps.clock.clone(),
                sequencer.clone(),
            )),
            leave_room_usecase: Arc::new(LeaveRoomUseCase::new(
                deps.rooms.clone(),
                deps.message_pusher.clone(),
                deps.clock.clone(),
                sequencer.clone(),
            )),
            send_message_usecase: Arc::new(SendMessageUseCase::new(
                deps.rooms.clone(),
                deps.message_log.clone(),
                deps.message_pusher.clone(),
                deps.clock,
                sequencer.clone(),
            )),
            load_more_messages_usecase: Arc::new(LoadMoreMessagesUseCase::new(
                history,
                deps.message_pusher.clone(),
            )),
            typing_usecase: Arc::new(TypingUseCase::new(
                deps.rooms.clone(),
                deps.message_pusher.clone(),
                sequencer,
            )),
            get_rooms_usecase: Arc::new(GetRoomsUseCase::new(
                deps.rooms,
                deps.message_log,
                deps.message_pusher,
            )),
            token_verifier: deps.token_verifier,
            registry: deps.registry,
        }
    }
}
