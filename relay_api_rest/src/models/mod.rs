use serde::Serialize;

/// Body of every non-2xx response. Messages stay generic on purpose; the
/// specific rejection reason only goes to the server logs.
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub ok: bool,
    pub error: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ApiMessage {
    pub ok: bool,
    pub message: &'static str,
}
