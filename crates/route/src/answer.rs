use bytes::Bytes;
use http_body::{Body as HttpBody, Frame, SizeHint};
use std::convert::Infallible;
use std::pin::Pin;
use std::task::{Context, Poll};

/// The body value a handler produces: empty, text, or binary.
///
/// Implements [`http_body::Body`] so the platform connection driver can write
/// it out directly.
#[derive(Debug)]
pub struct Answer {
    inner: Kind,
    text: bool,
}

#[derive(Debug)]
enum Kind {
    Empty,
    Once(Option<Bytes>),
}

impl Answer {
    pub fn empty() -> Self {
        Self { inner: Kind::Empty, text: false }
    }

    pub fn text(value: impl Into<String>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self { inner: Kind::Empty, text: true }
        } else {
            Self { inner: Kind::Once(Some(Bytes::from(value))), text: true }
        }
    }

    pub fn binary(value: impl Into<Bytes>) -> Self {
        let value = value.into();
        if value.is_empty() {
            Self::empty()
        } else {
            Self { inner: Kind::Once(Some(value)), text: false }
        }
    }

    pub fn is_empty(&self) -> bool {
        match &self.inner {
            Kind::Empty => true,
            Kind::Once(bytes) => bytes.as_ref().is_none_or(|b| b.is_empty()),
        }
    }

    pub fn len(&self) -> usize {
        match &self.inner {
            Kind::Empty => 0,
            Kind::Once(bytes) => bytes.as_ref().map_or(0, Bytes::len),
        }
    }

    /// Whether this body came from a text value (drives the default
    /// `Content-Type` at finalization).
    pub fn is_text(&self) -> bool {
        self.text
    }

    /// Consumes the body, yielding its bytes.
    pub fn into_bytes(self) -> Bytes {
        match self.inner {
            Kind::Empty => Bytes::new(),
            Kind::Once(bytes) => bytes.unwrap_or_default(),
        }
    }
}

impl Default for Answer {
    fn default() -> Self {
        Self::empty()
    }
}

impl From<()> for Answer {
    fn from(_: ()) -> Self {
        Self::empty()
    }
}

impl From<String> for Answer {
    fn from(value: String) -> Self {
        Self::text(value)
    }
}

impl From<&'static str> for Answer {
    fn from(value: &'static str) -> Self {
        Self::text(value)
    }
}

impl From<Vec<u8>> for Answer {
    fn from(value: Vec<u8>) -> Self {
        Self::binary(value)
    }
}

impl From<Bytes> for Answer {
    fn from(value: Bytes) -> Self {
        Self::binary(value)
    }
}

impl HttpBody for Answer {
    type Data = Bytes;
    type Error = Infallible;

    fn poll_frame(self: Pin<&mut Self>, _cx: &mut Context<'_>) -> Poll<Option<Result<Frame<Self::Data>, Self::Error>>> {
        let kind = &mut self.get_mut().inner;
        match kind {
            Kind::Empty => Poll::Ready(None),
            Kind::Once(bytes) => Poll::Ready(bytes.take().map(|b| Ok(Frame::data(b)))),
        }
    }

    fn is_end_stream(&self) -> bool {
        match &self.inner {
            Kind::Empty => true,
            Kind::Once(bytes) => bytes.is_none(),
        }
    }

    fn size_hint(&self) -> SizeHint {
        match &self.inner {
            Kind::Empty => SizeHint::with_exact(0),
            Kind::Once(None) => SizeHint::with_exact(0),
            Kind::Once(Some(bytes)) => SizeHint::with_exact(bytes.len() as u64),
        }
    }
}
