use http::{Method, StatusCode};

/// What a request is for, as reported by `Request.destination`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Destination {
    Document,
    Script,
    Style,
    Image,
    Other,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchRequest {
    pub method: Method,
    pub url: String,
    pub destination: Destination,
}

impl FetchRequest {
    pub fn get(url: &str, destination: Destination) -> Self {
        Self {
            method: Method::GET,
            url: url.to_string(),
            destination,
        }
    }

    /// A top level page load
    pub fn navigation(url: &str) -> Self {
        Self::get(url, Destination::Document)
    }
}

/// `Response.type`. Only `Basic` responses are same-origin.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ResponseType {
    Basic,
    Cors,
    Opaque,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchResponse {
    pub status: StatusCode,
    pub kind: ResponseType,
    pub body: Vec<u8>,
}

impl FetchResponse {
    pub fn ok(body: &[u8]) -> Self {
        Self {
            status: StatusCode::OK,
            kind: ResponseType::Basic,
            body: body.to_vec(),
        }
    }

    /// Whether a copy of this response may be stored in the cache.
    pub fn is_cacheable(&self) -> bool {
        self.status == StatusCode::OK && self.kind == ResponseType::Basic
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn it_caches_only_same_origin_ok_responses() {
        assert!(FetchResponse::ok(b"hi").is_cacheable());

        let opaque = FetchResponse {
            kind: ResponseType::Opaque,
            ..FetchResponse::ok(b"hi")
        };
        assert!(!opaque.is_cacheable());

        let missing = FetchResponse {
            status: StatusCode::NOT_FOUND,
            ..FetchResponse::ok(b"")
        };
        assert!(!missing.is_cacheable());
    }
}
