#[derive(Clone, Copy)]
pub(super) enum State {
    Normal,
    SingleQuoted,
    DoubleQuoted,
    Bracketed,
    LineComment,
    BlockComment(u32),
}

pub(super) fn is_line_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'-') && bytes.get(idx + 1) == Some(&b'-')
}

pub(super) fn is_block_comment_start(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'/') && bytes.get(idx + 1) == Some(&b'*')
}

pub(super) fn is_block_comment_end(bytes: &[u8], idx: usize) -> bool {
    bytes.get(idx) == Some(&b'*') && bytes.get(idx + 1) == Some(&b'/')
}

/// Byte offset of the statement's first keyword, past whitespace, comments, and opening
/// parentheses.
pub(crate) fn statement_start(sql: &str) -> usize {
    let bytes = sql.as_bytes();
    let mut idx = 0;
    while idx < bytes.len() {
        if bytes[idx].is_ascii_whitespace() || bytes[idx] == b'(' {
            idx += 1;
        } else if is_line_comment_start(bytes, idx) {
            idx = bytes[idx..]
                .iter()
                .position(|&b| b == b'\n')
                .map_or(bytes.len(), |newline| idx + newline + 1);
        } else if is_block_comment_start(bytes, idx) {
            idx += 2;
            let mut depth = 1u32;
            while idx < bytes.len() && depth > 0 {
                if is_block_comment_start(bytes, idx) {
                    depth += 1;
                    idx += 2;
                } else if is_block_comment_end(bytes, idx) {
                    depth -= 1;
                    idx += 2;
                } else {
                    idx += 1;
                }
            }
        } else {
            break;
        }
    }
    idx.min(bytes.len())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keyword(sql: &str) -> &str {
        &sql[statement_start(sql)..]
    }

    #[test]
    fn skips_comments_and_parentheses() {
        assert_eq!(keyword("  SELECT 1"), "SELECT 1");
        assert_eq!(keyword("-- fetch\nSELECT 1"), "SELECT 1");
        assert_eq!(
            keyword("/* a /* nested */ note */ WITH x AS (SELECT 1) SELECT * FROM x"),
            "WITH x AS (SELECT 1) SELECT * FROM x"
        );
        assert_eq!(keyword("((SELECT 1)) UNION (SELECT 2)"), "SELECT 1)) UNION (SELECT 2)");
    }

    #[test]
    fn unterminated_comments_consume_everything() {
        assert_eq!(keyword("-- only a comment"), "");
        assert_eq!(keyword("/* open"), "");
    }
}
