//! Data types for screenshot capture.

use thiserror::Error;

const PNG_SIGNATURE: [u8; 8] = [137, 80, 78, 71, 13, 10, 26, 10];

/// A captured bitmap, PNG-encoded.
///
/// `Clone` is a deep copy of the encoded bytes; consumers that outlive the
/// job (such as an editor) receive their own copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CapturedImage {
    pub width: u32,
    pub height: u32,
    /// Raw image data (PNG format).
    pub data: Vec<u8>,
}

impl CapturedImage {
    /// Wrap PNG bytes, reading the dimensions from the IHDR chunk.
    pub fn from_png(data: Vec<u8>) -> Result<Self, CaptureError> {
        let (width, height) = png_dimensions(&data)?;
        Ok(Self {
            width,
            height,
            data,
        })
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }
}

/// Read width and height from a PNG header.
///
/// The IHDR chunk is always first: 8 signature bytes, 4 length bytes,
/// 4 type bytes, then big-endian width and height.
pub fn png_dimensions(data: &[u8]) -> Result<(u32, u32), CaptureError> {
    if data.len() < 24 || data[..8] != PNG_SIGNATURE {
        return Err(CaptureError::ImageError(
            "Capture data is not a PNG image".to_string(),
        ));
    }
    if &data[12..16] != b"IHDR" {
        return Err(CaptureError::ImageError(
            "PNG is missing its IHDR chunk".to_string(),
        ));
    }

    let width = u32::from_be_bytes([data[16], data[17], data[18], data[19]]);
    let height = u32::from_be_bytes([data[20], data[21], data[22], data[23]]);
    Ok((width, height))
}

/// Errors that can occur during screenshot capture.
///
/// None of these fail a job on their own; the capture step logs them and
/// continues with an empty context.
#[derive(Debug, Error)]
pub enum CaptureError {
    #[error("Screenshot permission denied by user")]
    PermissionDenied,

    #[error("D-Bus communication error: {0}")]
    DBusError(#[from] zbus::Error),

    #[error("Image processing error: {0}")]
    ImageError(String),

    #[error("Portal returned invalid response: {0}")]
    InvalidResponse(String),
}

#[cfg(test)]
pub(crate) fn png_header(width: u32, height: u32) -> Vec<u8> {
    let mut data = PNG_SIGNATURE.to_vec();
    data.extend_from_slice(&13u32.to_be_bytes());
    data.extend_from_slice(b"IHDR");
    data.extend_from_slice(&width.to_be_bytes());
    data.extend_from_slice(&height.to_be_bytes());
    // bit depth, colour type, compression, filter, interlace, CRC
    data.extend_from_slice(&[8, 6, 0, 0, 0, 0, 0, 0, 0]);
    data
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reads_dimensions_from_ihdr() {
        let image = CapturedImage::from_png(png_header(100, 42)).unwrap();
        assert_eq!((image.width, image.height), (100, 42));
        assert!(!image.is_empty());
    }

    #[test]
    fn rejects_non_png_data() {
        let err = CapturedImage::from_png(vec![1, 2, 3]).unwrap_err();
        assert!(matches!(err, CaptureError::ImageError(_)));
    }
}
