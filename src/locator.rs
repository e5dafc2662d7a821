use std::io::Read;

use tracing::debug;

use crate::error::MoonError;
use crate::fetcher::Transport;
use crate::models::{ImageQuality, UtcTimestamp};
use crate::parser::{self, MoonFrame};

// Frame descriptions are a few hundred bytes; anything near this is not one.
const MAX_BODY_BYTES: u64 = 1024 * 1024;

/// `{api_base}/{YYYY-MM-DD}T{HH}:00`
pub fn endpoint(api_base: &str, timestamp: &UtcTimestamp) -> String {
    format!("{}/{timestamp}:00", api_base.trim_end_matches('/'))
}

/// Asks the API which image shows the Moon at a given UTC hour.
pub struct ImageLocator<'a, T: Transport> {
    transport: &'a T,
    api_base: String,
    quality: ImageQuality,
}

impl<'a, T: Transport> ImageLocator<'a, T> {
    pub fn new(transport: &'a T, api_base: impl Into<String>, quality: ImageQuality) -> Self {
        Self {
            transport,
            api_base: api_base.into(),
            quality,
        }
    }

    pub fn locate(&self, timestamp: &UtcTimestamp) -> Result<MoonFrame, MoonError> {
        let endpoint = endpoint(&self.api_base, timestamp);
        debug!(%endpoint, "locating image");

        let response = self.transport.get(&endpoint)?;
        if !response.is_success() {
            return Err(MoonError::MalformedResponse(format!(
                "HTTP {} from {endpoint}",
                response.status
            )));
        }

        let mut body = Vec::new();
        response
            .body
            .take(MAX_BODY_BYTES)
            .read_to_end(&mut body)
            .map_err(|e| MoonError::EndpointUnavailable(format!("reading {endpoint}: {e}")))?;

        let frame = parser::parse_frame(&body, self.quality)?;
        debug!(url = %frame.image_url, phase = ?frame.phase, age = ?frame.age, "image located");
        Ok(frame)
    }
}
