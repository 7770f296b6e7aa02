//! 固定テーブルによる TokenVerifier 実装
//!
//! トークンは起動時に `TOKEN=USER_ID:USERNAME` の形式で設定します。
//! トークンの発行やローテーションは扱わず、引き当てだけを行います。

use std::collections::HashMap;

use async_trait::async_trait;
use thiserror::Error;

use crate::domain::{Identity, TokenVerifier, UserId, Username, ValueObjectError};

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TokenSpecError {
    #[error("expected TOKEN=USER_ID:USERNAME, got '{0}'")]
    Format(String),

    #[error("token cannot be empty")]
    EmptyToken,

    #[error(transparent)]
    Identity(#[from] ValueObjectError),
}

#[derive(Debug, Clone, Default)]
pub struct StaticTokenVerifier {
    tokens: HashMap<String, (UserId, Username)>,
}

impl StaticTokenVerifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// `TOKEN=USER_ID:USERNAME` 形式の設定から作成
    pub fn from_specs<I, S>(specs: I) -> Result<Self, TokenSpecError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut verifier = Self::new();
        for spec in specs {
            let (token, user_id, username) = parse_spec(spec.as_ref())?;
            verifier.insert(token, user_id, username);
        }
        Ok(verifier)
    }

    pub fn insert(&mut self, token: String, user_id: UserId, username: Username) {
        self.tokens.insert(token, (user_id, username));
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
}

fn parse_spec(spec: &str) -> Result<(String, UserId, Username), TokenSpecError> {
    let (token, principal) = spec
        .split_once('=')
        .ok_or_else(|| TokenSpecError::Format(spec.to_string()))?;
    let (user_id, username) = principal
        .split_once(':')
        .ok_or_else(|| TokenSpecError::Format(spec.to_string()))?;
    if token.is_empty() {
        return Err(TokenSpecError::EmptyToken);
    }
    Ok((
        token.to_string(),
        UserId::new(user_id.to_string())?,
        Username::new(username.to_string())?,
    ))
}

#[async_trait]
impl TokenVerifier for StaticTokenVerifier {
    async fn verify(&self, token: &str) -> Option<Identity> {
        self.tokens
            .get(token)
            .map(|(user_id, username)| Identity::Verified {
                user_id: user_id.clone(),
                username: username.clone(),
            })
    }
}
