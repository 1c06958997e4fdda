//! Conversion of handler return values into response bodies.
//!
//! Handlers may return a body value, a value convertible to one, or nothing;
//! [`Responder`] is the seam where that flexibility lives. `Result` return
//! values surface their error to the dispatch layer, which maps it to a 500.

use crate::answer::Answer;
use crate::handler::BoxError;
use bytes::Bytes;
use std::convert::Infallible;

/// A value a handler may return.
pub trait Responder {
    fn respond(self) -> Result<Answer, BoxError>;
}

impl Responder for Answer {
    fn respond(self) -> Result<Answer, BoxError> {
        Ok(self)
    }
}

/// The unit type yields an empty body (middlewares return this).
impl Responder for () {
    fn respond(self) -> Result<Answer, BoxError> {
        Ok(Answer::empty())
    }
}

impl Responder for String {
    fn respond(self) -> Result<Answer, BoxError> {
        Ok(Answer::from(self))
    }
}

impl Responder for &'static str {
    fn respond(self) -> Result<Answer, BoxError> {
        Ok(Answer::from(self))
    }
}

impl Responder for Vec<u8> {
    fn respond(self) -> Result<Answer, BoxError> {
        Ok(Answer::from(self))
    }
}

impl Responder for Bytes {
    fn respond(self) -> Result<Answer, BoxError> {
        Ok(Answer::from(self))
    }
}

/// `None` yields an empty body.
impl<T: Responder> Responder for Option<T> {
    fn respond(self) -> Result<Answer, BoxError> {
        match self {
            Some(value) => value.respond(),
            None => Ok(Answer::empty()),
        }
    }
}

/// `Err` aborts the handler; the dispatch layer converts it to a 500.
impl<T, E> Responder for Result<T, E>
where
    T: Responder,
    E: Into<BoxError>,
{
    fn respond(self) -> Result<Answer, BoxError> {
        match self {
            Ok(value) => value.respond(),
            Err(e) => Err(e.into()),
        }
    }
}

impl Responder for Infallible {
    fn respond(self) -> Result<Answer, BoxError> {
        match self {}
    }
}

#[cfg(test)]
mod tests {
    use crate::responder::Responder;

    #[test]
    fn unit_is_empty() {
        let answer = ().respond().unwrap();
        assert!(answer.is_empty());
    }

    #[test]
    fn string_is_text() {
        let answer = "hello".respond().unwrap();
        assert!(answer.is_text());
        assert_eq!(answer.into_bytes().as_ref(), b"hello");
    }

    #[test]
    fn none_is_empty() {
        let answer = Option::<String>::None.respond().unwrap();
        assert!(answer.is_empty());
    }

    #[test]
    fn err_surfaces() {
        let result: Result<String, std::io::Error> = Err(std::io::Error::other("boom"));
        assert!(result.respond().is_err());
    }
}
