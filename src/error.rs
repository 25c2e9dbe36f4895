pub type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The user or the identity provider refused to hand out a token.
    #[error("authentication denied: {0}")]
    AuthenticationDenied(String),
    /// Any non-2xx response. `message` is the provider's `error.message` when
    /// the body carried one.
    #[error("{message}")]
    Http { status: u16, message: String },
    #[error("malformed response: {0}")]
    MalformedResponse(String),
    /// A request body could not be turned into JSON text.
    #[error("request body serialization failed: {0}")]
    Serialize(String),
    #[error("transport failed: {0}")]
    Transport(String),
    #[error("token store failed: {0}")]
    TokenStore(String),
    #[error("config error: {0}")]
    Config(String),
}

impl Error {
    pub fn status(&self) -> Option<u16> {
        match self {
            Error::Http { status, .. } => Some(*status),
            _ => None,
        }
    }

    /// The server no longer accepts the cached token. The client does not
    /// re-authenticate on its own; call `revoke` or `reset_token` and retry.
    pub fn is_unauthorized(&self) -> bool {
        self.status() == Some(401)
    }
}

impl From<reqwest::Error> for Error {
    fn from(err: reqwest::Error) -> Self {
        Error::Transport(err.to_string())
    }
}

impl From<warp::Error> for Error {
    fn from(err: warp::Error) -> Self {
        Error::AuthenticationDenied(format!("consent server failed: {}", err))
    }
}
