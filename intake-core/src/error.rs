//! Rejection taxonomy for the intake pipeline.

use std::path::PathBuf;

use thiserror::Error;

/// Shown for bot detections and anything we do not want to describe.
pub const GENERIC_FAILURE_MESSAGE: &str = "送信に失敗しました。";

/// Every way a submission can be turned away. All are terminal.
#[derive(Debug, Error)]
pub enum IntakeError {
    #[error("request method {method} is not POST")]
    MethodNotAllowed { method: String },

    #[error("spam filter rejected the submission")]
    BotSuspected,

    #[error("required field `{field}` is empty")]
    MissingRequiredField { field: &'static str },

    #[error("email address has invalid syntax")]
    InvalidEmailFormat,

    #[error("failed to create storage directory {path}: {source}")]
    StorageDirectoryUnavailable {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to open ledger {path}: {source}")]
    FileOpenFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to lock ledger {path}: {source}")]
    LockAcquisitionFailure {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("failed to write ledger {path}: {source}")]
    LedgerWriteFailure {
        path: PathBuf,
        source: std::io::Error,
    },
}

impl IntakeError {
    /// Message rendered on the error page.
    ///
    /// `BotSuspected` shares the generic message so the honeypot is not
    /// revealed.
    pub fn user_message(&self) -> &'static str {
        match self {
            IntakeError::MethodNotAllowed { .. } => "不正なアクセスです。",
            IntakeError::BotSuspected | IntakeError::LedgerWriteFailure { .. } => {
                GENERIC_FAILURE_MESSAGE
            }
            IntakeError::MissingRequiredField { .. } => "必須項目が未入力です。",
            IntakeError::InvalidEmailFormat => "メールアドレスの形式が正しくありません。",
            IntakeError::StorageDirectoryUnavailable { .. } => {
                "サーバ側で保存フォルダを作成できませんでした。"
            }
            IntakeError::FileOpenFailure { .. } => "CSVファイルを開けませんでした。",
            IntakeError::LockAcquisitionFailure { .. } => "保存処理に失敗しました（ロック）。",
        }
    }

    /// HTTP status for the rejection page. Every rejection is a 400.
    pub fn status(&self) -> u16 {
        400
    }

    /// Storage failures are server-side; everything else is the caller's input.
    pub fn is_storage(&self) -> bool {
        matches!(
            self,
            IntakeError::StorageDirectoryUnavailable { .. }
                | IntakeError::FileOpenFailure { .. }
                | IntakeError::LockAcquisitionFailure { .. }
                | IntakeError::LedgerWriteFailure { .. }
        )
    }
}
