use crate::error::MockError;
use crate::models::BatchEnvelope;

/// Name of the form field holding the JSON encoded sub-requests
pub const BATCH_FIELD: &str = "batch";

/// Decode a batch call body.
///
/// The body is `application/x-www-form-urlencoded` with a `batch` field whose
/// value is a JSON array of objects. Malformed form encoding, a missing field,
/// or anything but an array of objects is rejected as an invalid body.
pub fn decode_envelope(raw: &[u8]) -> Result<BatchEnvelope, MockError> {
    let form = std::str::from_utf8(raw)
        .map_err(|e| MockError::InvalidBody(format!("body is not valid UTF-8: {}", e)))?;
    validate_form(form)?;

    let pairs: Vec<(String, String)> =
        serde_urlencoded::from_str(form).map_err(|e| MockError::InvalidBody(e.to_string()))?;

    let batch = pairs
        .into_iter()
        .find(|(key, _)| key == BATCH_FIELD)
        .map(|(_, value)| value)
        .ok_or_else(|| MockError::InvalidBody(format!("missing '{}' field", BATCH_FIELD)))?;

    serde_json::from_str(&batch).map_err(|e| MockError::InvalidBody(e.to_string()))
}

// serde_urlencoded passes broken escapes through untouched, so reject them up front
fn validate_form(form: &str) -> Result<(), MockError> {
    if form.contains(';') {
        return Err(MockError::InvalidBody(
            "invalid semicolon separator in form body".to_string(),
        ));
    }

    let bytes = form.as_bytes();
    let mut i = 0;
    while i < bytes.len() {
        if bytes[i] == b'%' {
            let escape = bytes.get(i + 1..i + 3);
            match escape {
                Some([hi, lo]) if hi.is_ascii_hexdigit() && lo.is_ascii_hexdigit() => i += 3,
                _ => {
                    let end = (i + 3).min(bytes.len());
                    return Err(MockError::InvalidBody(format!(
                        "invalid URL escape {:?}",
                        String::from_utf8_lossy(&bytes[i..end])
                    )));
                }
            }
        } else {
            i += 1;
        }
    }

    Ok(())
}
