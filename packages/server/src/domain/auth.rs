//! トークン検証の境界
//!
//! 認証情報の保管やトークンの発行はこのサービスの外にあります。
//! ここではハンドシェイク時のトークンが既知のユーザーに対応するかだけを問い合わせます。

use async_trait::async_trait;

use super::Identity;

#[async_trait]
pub trait TokenVerifier: Send + Sync {
    /// `token` に対応する検証済み Identity を返す。未知・不正なトークンは `None`
    /// （`None` でも接続は拒否しない）
    async fn verify(&self, token: &str) -> Option<Identity>;
}
