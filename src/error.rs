use thiserror::Error;

pub type Result<T> = std::result::Result<T, LedgerError>;

#[derive(Debug, Error)]
pub enum LedgerError {
    #[error("You must set the amount!")]
    InvalidAmount,

    #[error("Amount exceeds your balance!")]
    InsufficientBalance,

    #[error("You can not send to yourself!")]
    SelfSend,

    #[error("invalid transaction: {0}")]
    InvalidTransaction(String),

    #[error("invalid chain: {0}")]
    InvalidChain(String),

    #[error("mining aborted: the chain was replaced during the search")]
    MiningAborted,

    #[error("mining worker failed: {0}")]
    Worker(String),

    #[error(transparent)]
    Crypto(#[from] secp256k1::Error),

    #[error(transparent)]
    Hex(#[from] hex::FromHexError),

    #[error(transparent)]
    Serialization(#[from] serde_json::Error),
}

impl LedgerError {
    /// Failures caused by the caller's request rather than node state.
    pub fn is_user_error(&self) -> bool {
        matches!(
            self,
            LedgerError::InvalidAmount | LedgerError::InsufficientBalance | LedgerError::SelfSend
        )
    }
}

#[cfg(test)]
mod tests {
    use super::LedgerError;

    #[test]
    fn user_facing_messages_are_exact() {
        assert_eq!(LedgerError::InvalidAmount.to_string(), "You must set the amount!");
        assert_eq!(
            LedgerError::InsufficientBalance.to_string(),
            "Amount exceeds your balance!"
        );
        assert_eq!(LedgerError::SelfSend.to_string(), "You can not send to yourself!");
    }

    #[test]
    fn classifies_user_errors() {
        assert!(LedgerError::SelfSend.is_user_error());
        assert!(!LedgerError::MiningAborted.is_user_error());
        assert!(!LedgerError::InvalidChain("x".into()).is_user_error());
    }
}
