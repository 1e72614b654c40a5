/// Only the configured operator may use the bot.
///
/// `sender` is the Telegram user id of the message author, `None` for
/// anonymous or channel-authored messages.
pub fn check_operator(operator_id: u64, sender: Option<u64>) -> Result<(), AccessDenied> {
    match sender {
        None => Err(AccessDenied::NoSender),
        Some(id) if id == operator_id && operator_id != 0 => Ok(()),
        Some(_) => Err(AccessDenied::NotOperator),
    }
}

/// Reason an inbound message was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessDenied {
    NoSender,
    NotOperator,
}

impl std::fmt::Display for AccessDenied {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::NoSender => write!(f, "message has no sender"),
            Self::NotOperator => write!(f, "sender is not the operator"),
        }
    }
}
