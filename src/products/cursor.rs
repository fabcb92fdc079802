use base64ct::{Base64, Encoding};

use crate::error::ApiError;

/// Opaque forward-only continuation token for the product list. Browsing
/// pages by keyset on the insertion sequence; ranked search pages by row
/// offset since rank order has no stable key.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PageCursor {
    Browse { last_seq: i64 },
    Search { offset: i64 },
}

impl PageCursor {
    pub fn encode(&self) -> String {
        let raw = match self {
            PageCursor::Browse { last_seq } => format!("b:{last_seq}"),
            PageCursor::Search { offset } => format!("s:{offset}"),
        };
        Base64::encode_string(raw.as_bytes())
    }

    pub fn decode(token: &str) -> Result<Self, ApiError> {
        let bytes = Base64::decode_vec(token).map_err(|_| invalid())?;
        let raw = String::from_utf8(bytes).map_err(|_| invalid())?;
        match raw.split_once(':') {
            Some(("b", n)) => Ok(PageCursor::Browse {
                last_seq: n.parse().map_err(|_| invalid())?,
            }),
            Some(("s", n)) => Ok(PageCursor::Search {
                offset: n.parse().map_err(|_| invalid())?,
            }),
            _ => Err(invalid()),
        }
    }
}

fn invalid() -> ApiError {
    ApiError::Validation("Invalid pagination cursor".into())
}
