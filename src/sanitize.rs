//! Restricts free text to 7-bit ASCII for strict downstream loaders

/// Text sanitizer driven by the `ascii_only` mode flag.
#[derive(Debug, Clone, Copy)]
pub struct Sanitizer {
    pub ascii_only: bool,
}

impl Sanitizer {
    pub fn new(ascii_only: bool) -> Self {
        Self { ascii_only }
    }

    /// Absent input becomes the empty string in both modes. With `ascii_only`
    /// every non-ASCII char is dropped and the rest keep their order.
    pub fn sanitize(&self, value: Option<&str>) -> String {
        match value {
            None => String::new(),
            Some(s) if !self.ascii_only => s.to_string(),
            Some(s) => s.chars().filter(char::is_ascii).collect(),
        }
    }
}
