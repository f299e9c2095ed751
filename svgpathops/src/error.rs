use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum Error {
    #[error("Unknown fill rule '{0}'")]
    UnknownFillRule(String),
    #[error("Unknown stroke-linecap '{0}'")]
    UnknownLineCap(String),
    #[error("Unknown stroke-linejoin '{0}'")]
    UnknownLineJoin(String),
}
