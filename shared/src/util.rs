/// Current UTC timestamp in milliseconds
pub fn now_millis() -> i64 {
    chrono::Utc::now().timestamp_millis()
}

/// Human-facing document number, e.g. `JC-2026-00042`
pub fn document_number(prefix: &str, year: i32, seq: i64) -> String {
    format!("{prefix}-{year}-{seq:05}")
}

/// Year of the current UTC date (document numbering)
pub fn current_year() -> i32 {
    use chrono::Datelike;
    chrono::Utc::now().year()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_document_number_padding() {
        assert_eq!(document_number("JC", 2026, 42), "JC-2026-00042");
        assert_eq!(document_number("PO", 2025, 123456), "PO-2025-123456");
    }

    #[test]
    fn test_now_millis_is_recent() {
        // 2024-01-01 in millis
        assert!(now_millis() > 1_704_067_200_000);
    }
}
