//! JSON-lines Message Log 実装
//!
//! 1 行 1 メッセージの追記専用ファイルに永続化し、起動時に全行を読み込んで
//! インメモリの索引を再構築します。読み取りは索引だけで完結します。

use std::{
    io::ErrorKind,
    path::{Path, PathBuf},
};

use async_trait::async_trait;
use tokio::{
    fs::{File, OpenOptions},
    io::AsyncWriteExt,
    sync::Mutex,
};

use crate::{
    domain::{ChatMessage, MessageLog, MessageLogError, NewMessage, RoomId, Timestamp},
    infrastructure::{
        dto::storage::StoredMessage, repository::inmemory::message_log::MessageIndex,
    },
};

struct LogState {
    file: File,
    /// 最後に書き込みが完了した行末のオフセット
    len: u64,
    index: MessageIndex,
}

/// ファイルに追記する Message Log 実装
pub struct FileMessageLog {
    path: PathBuf,
    state: Mutex<LogState>,
}

impl FileMessageLog {
    /// ログファイルを開く（存在しなければ作成）
    ///
    /// 壊れた行（不正な JSON・不正な UTF-8）は警告を出して読み飛ばす。
    /// 改行で終わらない末尾の断片は、書き込み途中で中断された行として切り詰める。
    pub async fn open(path: impl AsRef<Path>) -> Result<Self, MessageLogError> {
        let path = path.as_ref().to_path_buf();

        let contents = match tokio::fs::read(&path).await {
            Ok(contents) => contents,
            Err(e) if e.kind() == ErrorKind::NotFound => Vec::new(),
            Err(e) => return Err(MessageLogError::Storage(e.to_string())),
        };

        // 完結した行の末尾（最後の改行の直後）
        let complete = contents
            .iter()
            .rposition(|b| *b == b'\n')
            .map_or(0, |pos| pos + 1);

        let mut index = MessageIndex::default();
        for (line_no, line) in contents[..complete].split(|b| *b == b'\n').enumerate() {
            if line.iter().all(u8::is_ascii_whitespace) {
                continue;
            }
            match decode_line(line) {
                Ok(message) => index.insert(message),
                Err(e) => tracing::warn!(
                    "Skipping line {} of '{}': {}",
                    line_no + 1,
                    path.display(),
                    e
                ),
            }
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&path)
            .await
            .map_err(|e| MessageLogError::Storage(e.to_string()))?;

        let len = complete as u64;
        if complete < contents.len() {
            tracing::warn!(
                "Truncating {} bytes of an unfinished line at the end of '{}'",
                contents.len() - complete,
                path.display()
            );
            file.set_len(len)
                .await
                .map_err(|e| MessageLogError::Storage(e.to_string()))?;
        }

        tracing::info!(
            "Message log '{}' opened with {} messages",
            path.display(),
            index.len()
        );

        Ok(Self {
            path,
            state: Mutex::new(LogState { file, len, index }),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

fn decode_line(line: &[u8]) -> Result<ChatMessage, MessageLogError> {
    let record: StoredMessage =
        serde_json::from_slice(line).map_err(|e| MessageLogError::Malformed(e.to_string()))?;
    ChatMessage::try_from(record).map_err(|e| MessageLogError::Malformed(e.to_string()))
}

fn encode_line(message: &ChatMessage) -> Result<String, MessageLogError> {
    let mut line = serde_json::to_string(&StoredMessage::from(message))
        .map_err(|e| MessageLogError::Malformed(e.to_string()))?;
    line.push('\n');
    Ok(line)
}

async fn write_line(file: &mut File, line: &[u8]) -> std::io::Result<()> {
    file.write_all(line).await?;
    file.flush().await
}

#[async_trait]
impl MessageLog for FileMessageLog {
    async fn append(&self, message: NewMessage) -> Result<ChatMessage, MessageLogError> {
        let mut state = self.state.lock().await;
        let stored = state.index.stamp(message);
        let line = encode_line(&stored)?;

        if let Err(e) = write_line(&mut state.file, line.as_bytes()).await {
            // 書きかけの断片を残すと次の行がそれに連結されてしまう
            let len = state.len;
            if let Err(truncate_error) = state.file.set_len(len).await {
                tracing::error!(
                    "Failed to roll back '{}' to {} bytes: {}",
                    self.path.display(),
                    len,
                    truncate_error
                );
            }
            return Err(MessageLogError::Storage(e.to_string()));
        }
        state.len += line.len() as u64;

        // 書き込みに成功したものだけを索引に載せる
        state.index.insert(stored.clone());
        Ok(stored)
    }

    async fn query_range(
        &self,
        room: &RoomId,
        before: Option<Timestamp>,
        limit: usize,
    ) -> Result<Vec<ChatMessage>, MessageLogError> {
        let state = self.state.lock().await;
        Ok(state.index.query(room, before, limit))
    }

    async fn distinct_rooms(&self) -> Result<Vec<RoomId>, MessageLogError> {
        let state = self.state.lock().await;
        Ok(state.index.rooms())
    }
}
