use serde::Deserialize;

use crate::error::MoonError;
use crate::models::ImageQuality;

#[derive(Deserialize)]
struct ImageRef {
    url: String,
}

/// The subset of a Dial-A-Moon frame this tool reads.
#[derive(Deserialize)]
struct FrameBody {
    image: Option<ImageRef>,
    image_highres: Option<ImageRef>,
    // Informational only; read loosely so an odd value never costs the image.
    #[serde(default)]
    phase: Option<serde_json::Value>,
    #[serde(default)]
    age: Option<serde_json::Value>,
}

/// What one API call tells us about the Moon at a given hour.
#[derive(Debug, Clone, PartialEq)]
pub struct MoonFrame {
    pub image_url: String,
    /// Percent of the disk illuminated.
    pub phase: Option<f64>,
    /// Days since new moon.
    pub age: Option<f64>,
}

pub fn parse_frame(body: &[u8], quality: ImageQuality) -> Result<MoonFrame, MoonError> {
    let frame: FrameBody = serde_json::from_slice(body)
        .map_err(|e| MoonError::MalformedResponse(format!("invalid JSON: {e}")))?;

    let image = match quality {
        ImageQuality::Standard => frame.image,
        ImageQuality::High => frame.image_highres,
    };
    let image_url = image
        .map(|image| image.url)
        .ok_or_else(|| {
            MoonError::MalformedResponse(format!("missing {}.url", quality.response_field()))
        })?;

    reqwest::Url::parse(&image_url)
        .map_err(|e| MoonError::MalformedResponse(format!("bad image URL {image_url:?}: {e}")))?;

    Ok(MoonFrame {
        image_url,
        phase: frame.phase.as_ref().and_then(serde_json::Value::as_f64),
        age: frame.age.as_ref().and_then(serde_json::Value::as_f64),
    })
}
