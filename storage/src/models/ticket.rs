use uuid::Uuid;

/// Namespace prefix on scannable ticket codes. The prefix distinguishes a
/// scanned code from free-text manual entry at the door.
pub const TICKET_PREFIX: &str = "BLZ";

/// Formats the scan code for a participation: `BLZ:<participation_id>`.
pub fn ticket_code(participation_id: Uuid) -> String {
    format!("{TICKET_PREFIX}:{participation_id}")
}

/// Inverts [`ticket_code`]. Accepts either a prefixed scan code or a bare
/// participation id typed in manually; anything else is rejected.
pub fn parse_ticket_code(code: &str) -> Option<Uuid> {
    let raw = code
        .trim()
        .strip_prefix(TICKET_PREFIX)
        .and_then(|rest| rest.strip_prefix(':'))
        .unwrap_or_else(|| code.trim());

    Uuid::parse_str(raw).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_round_trips() {
        let id = Uuid::new_v4();
        assert_eq!(parse_ticket_code(&ticket_code(id)), Some(id));
    }

    #[test]
    fn bare_id_is_accepted() {
        let id = Uuid::new_v4();
        assert_eq!(parse_ticket_code(&id.to_string()), Some(id));
    }

    #[test]
    fn surrounding_whitespace_is_tolerated() {
        let id = Uuid::new_v4();
        assert_eq!(parse_ticket_code(&format!("  {} \n", ticket_code(id))), Some(id));
    }

    #[test]
    fn garbage_is_rejected() {
        assert_eq!(parse_ticket_code("front row, black jacket"), None);
        assert_eq!(parse_ticket_code("BLZ:not-a-uuid"), None);
        assert_eq!(parse_ticket_code(""), None);
    }
}
