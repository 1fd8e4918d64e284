//! Generative model port.

mod chat;

use std::future::Future;

use crate::Result;

pub use chat::ChatClient;

/// A text-in, text-out language model.
///
/// The response is opaque to the caller; any structure is requested through
/// the prompt itself.
pub trait GenerativeModel {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>>;
}

impl<T: GenerativeModel + ?Sized> GenerativeModel for &T {
    fn complete(&self, prompt: &str) -> impl Future<Output = Result<String>> {
        (**self).complete(prompt)
    }
}
