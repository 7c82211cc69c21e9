//! Terminal rendering of pairing codes.

use qrcode::QrCode;
use qrcode::render::unicode;

/// Renders `payload` as a compact QR code made of half-block characters.
///
/// Returns `None` if the payload is too long to fit in a QR code.
#[must_use]
pub fn render(payload: &str) -> Option<String> {
    let code = QrCode::new(payload.as_bytes()).ok()?;

    Some(
        code.render::<unicode::Dense1x2>()
            .dark_color(unicode::Dense1x2::Light)
            .light_color(unicode::Dense1x2::Dark)
            .quiet_zone(true)
            .build(),
    )
}
