use hmac::{Hmac, Mac};
use sha2::Sha512;

type HmacSha512 = Hmac<Sha512>;

/// Sign a TAPI form body with HMAC-SHA512 keyed by the API secret.
/// Returns lowercase hex, as expected in the `Sign` header.
pub fn sign_tapi(body: &str, secret: &str) -> Result<String, String> {
    let mut mac = HmacSha512::new_from_slice(secret.as_bytes())
        .map_err(|e| format!("HMAC error: {}", e))?;
    mac.update(body.as_bytes());
    Ok(hex::encode(mac.finalize().into_bytes()))
}
