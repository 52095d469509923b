use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error(transparent)]
    AviationHelper(#[from] aviation_helper_rs::Error),
    #[error("external renderer transport error: {0}")]
    RendererTransport(String),
}
