use thiserror::Error;

#[derive(Debug, Error)]
pub enum RetrievalError {
    #[error("network failure connecting to {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: Box<ureq::Transport>,
    },

    #[error("inventory service returned HTTP {status} for {url}: {body}")]
    Http {
        url: String,
        status: u16,
        body: String,
    },

    #[error("reading inventory response from {url}: {source}")]
    Body {
        url: String,
        #[source]
        source: std::io::Error,
    },

    #[error("malformed inventory response from {url}: {source}")]
    Malformed {
        url: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("host `{host_id}` has malformed inventory: {message}")]
    MalformedHost { host_id: String, message: String },
}
