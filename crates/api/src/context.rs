/// Header carrying a project's API key on event submissions.
pub const API_KEY_HEADER: &str = "x-api-key";

/// API key presented by the caller for a request.
///
/// Always present on event routes; empty when the header was missing or not
/// valid UTF-8, which can never match an issued key.
#[derive(Clone, PartialEq, Eq)]
pub struct PresentedApiKey {
    key: String,
}

impl PresentedApiKey {
    pub fn new(key: impl Into<String>) -> Self {
        Self { key: key.into() }
    }

    pub fn as_str(&self) -> &str {
        &self.key
    }

    pub fn is_empty(&self) -> bool {
        self.key.is_empty()
    }
}

impl core::fmt::Debug for PresentedApiKey {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("PresentedApiKey")
            .field("present", &!self.key.is_empty())
            .finish()
    }
}
