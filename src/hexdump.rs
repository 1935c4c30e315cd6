use std::fmt::{self, Write};

const BYTES_PER_LINE: usize = 16;

/// `{}`-formats a packet as offset, hex bytes and printable ASCII, 16 bytes
/// per line.
pub struct HexDump<'a>(pub &'a [u8]);

impl fmt::Display for HexDump<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (line, chunk) in self.0.chunks(BYTES_PER_LINE).enumerate() {
            if line > 0 {
                f.write_char('\n')?;
            }
            write!(f, "{:03x}: ", line * BYTES_PER_LINE)?;
            for byte in chunk {
                write!(f, "{byte:02x} ")?;
            }
            for _ in chunk.len()..BYTES_PER_LINE {
                f.write_str("   ")?;
            }
            f.write_char(' ')?;
            for &byte in chunk {
                let c = if byte.is_ascii_graphic() || byte == b' ' {
                    char::from(byte)
                } else {
                    '.'
                };
                f.write_char(c)?;
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn full_and_partial_lines() {
        let data: Vec<u8> = (0x3c..0x50).collect();
        let dump = HexDump(&data).to_string();
        let lines: Vec<&str> = dump.lines().collect();

        assert_eq!(lines.len(), 2);
        assert_eq!(
            lines[0],
            "000: 3c 3d 3e 3f 40 41 42 43 44 45 46 47 48 49 4a 4b  <=>?@ABCDEFGHIJK"
        );
        assert_eq!(lines[1], format!("010: 4c 4d 4e 4f {} LMNO", "   ".repeat(12)));
    }

    #[test]
    fn non_printable_as_dots() {
        assert_eq!(
            HexDump(&[0x00, b'a', 0xff]).to_string(),
            format!("000: 00 61 ff {} .a.", "   ".repeat(13))
        );
    }

    #[test]
    fn empty_input() {
        assert_eq!(HexDump(&[]).to_string(), "");
    }
}
