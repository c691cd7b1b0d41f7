//! Single-quote escaping for values embedded in textual SQL statements.
//!
//! Names and addresses in the source documents may carry apostrophes
//! (`O'Brien`). Any such value rendered into a statement literal must have
//! each `'` doubled. The engine consumes the doubling when it parses the
//! literal, so stored text reads back with the original quotes.

/// Double every single quote in `value`.
pub fn escape_single_quotes(value: &str) -> String {
    value.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn escapes_apostrophe_in_name() {
        assert_eq!(escape_single_quotes("O'Brien"), "O''Brien");
        assert_eq!(escape_single_quotes("D''Arcy"), "D''''Arcy");
        assert_eq!(escape_single_quotes("plain"), "plain");
    }

    proptest! {
        #[test]
        fn collapsing_pairs_gives_back_the_value(value in ".*") {
            prop_assert_eq!(escape_single_quotes(&value).replace("''", "'"), value);
        }

        #[test]
        fn escaped_text_has_no_lone_quote(value in ".*") {
            let escaped = escape_single_quotes(&value);
            let stripped = escaped.replace("''", "");
            prop_assert!(!stripped.contains('\''));
        }
    }
}
