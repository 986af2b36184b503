use thiserror::Error;

/// Failure modes surfaced to the kiosk UI.
///
/// `CameraUnavailable` is recoverable by falling back to manual document
/// entry; mutations are never auto-retried on top of these.
#[derive(Debug, Error)]
pub enum ClientError {
    /// Another component already holds the camera.
    #[error("the camera is already in use")]
    CameraUnavailable,

    #[error("websocket failure: {0}")]
    Socket(#[from] tokio_tungstenite::tungstenite::Error),

    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    /// The server answered with something the client cannot use.
    #[error("unexpected payload: {0}")]
    Payload(String),
}
