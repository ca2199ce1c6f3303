use crate::tree::NodeId;

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum Error {
    #[error("invalid selector `{selector}`: {reason}")]
    InvalidSelector { selector: String, reason: String },
    #[error("node {0:?} is not in the tree")]
    UnknownNode(NodeId),
}

pub type Result<T, E = Error> = std::result::Result<T, E>;
