//! The narrow contract between the overlay and whatever stores its text.

/// Receives committed overlay text.
///
/// Implementations trim, parse and persist on their own schedule; the
/// overlay never waits for completion.
pub trait CaptureSink {
    fn commit(&self, raw_text: String);
}

impl<T: CaptureSink + ?Sized> CaptureSink for Box<T> {
    fn commit(&self, raw_text: String) {
        (**self).commit(raw_text)
    }
}
