use thiserror::Error;
use wasm_bindgen::JsValue;

/// Failures while setting up or driving the browser renderer.
#[derive(Error, Debug)]
pub enum WebError {
    #[error(transparent)]
    Render(#[from] prim3d_core::Error),

    #[error("no browser window or document")]
    NoDocument,

    #[error("no canvas element with id `{0}`")]
    CanvasNotFound(String),

    #[error("WebGL2 is not available on this canvas")]
    NoWebGl2,

    #[error("expected {expected} floats, got {actual}")]
    MatrixLength { expected: usize, actual: usize },

    #[error("vertex data length {0} is not a multiple of 3")]
    VertexLength(usize),
}

impl From<WebError> for JsValue {
    fn from(err: WebError) -> Self {
        JsValue::from_str(&err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, WebError>;
