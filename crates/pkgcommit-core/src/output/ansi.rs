//! Terminal control sequences used for in-place redraws.

/// Clear the whole current line and return the cursor to column 0.
pub const CLEARLN: &str = "\x1B[2K\r";

/// Move the cursor up `lines`, return to column 0 and clear to end of screen.
pub fn cursor_up(lines: usize) -> String {
    format!("\x1B[{}A\r\x1B[J", lines)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn cursor_up_sequence() {
        assert_eq!(cursor_up(3), "\u{1b}[3A\r\u{1b}[J");
    }
}
