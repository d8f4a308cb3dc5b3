//! QR rendering collaborator boundary.
//!
//! This service owns only the ticket code string; turning it into a scannable
//! image is delegated to an external renderer addressed by URL.

/// Builds the renderer URL for a ticket code. The code alphabet (uuid plus
/// the namespace prefix and `:`) is query-safe as-is.
pub fn render_url(base_url: &str, code: &str) -> String {
    let separator = if base_url.contains('?') { "&" } else { "?" };
    format!("{base_url}{separator}size=240x240&data={code}")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn appends_query_to_bare_base() {
        let url = render_url("https://qr.example/render", "BLZ:abc");
        assert_eq!(url, "https://qr.example/render?size=240x240&data=BLZ:abc");
    }

    #[test]
    fn respects_existing_query() {
        let url = render_url("https://qr.example/render?format=png", "BLZ:abc");
        assert_eq!(
            url,
            "https://qr.example/render?format=png&size=240x240&data=BLZ:abc"
        );
    }
}
