use super::result::DnsName;
use crate::error::NameError;

const POINTER_MASK: u8 = 0xC0;

/// Decode the name starting at `start` into `name`, returning the number of
/// bytes the name occupies at `start` on the wire.
///
/// Domain Name Format (RFC 1035 Section 3.1, 4.1.4):
/// ```text
/// Example: "www.example.com" is encoded as:
///
///  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///  | 3 | w | w | w | 7 | e | x | a | m | p | l | e |
///  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///  | 3 | c | o | m | 0 |
///  +--+--+--+--+--+--+--+
///
/// A length byte with the top two bits set is a pointer instead:
///  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
///  | 1  1|                OFFSET                   |
///  +--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+--+
/// ```
///
/// Pointers may only refer backwards: the first must target an offset below
/// `start`, and every further one an offset below the previous target.
/// Offsets therefore strictly decrease along a chain, which rules out loops
/// without a jump counter.
///
/// Once a pointer is taken the wire length is fixed at the label bytes seen
/// so far plus the two pointer bytes; what is read behind the pointer lives
/// elsewhere in the message. Without a pointer it is the label bytes plus
/// the root byte.
pub fn decode_name(buf: &[u8], start: usize, name: &mut DnsName) -> Result<usize, NameError> {
    name.clear();

    let mut offset = start;
    let mut limit = start;
    let mut wire_len = None;

    loop {
        let len = *buf.get(offset).ok_or(NameError::Truncated { offset })?;

        if len == 0 {
            break;
        }

        if len & POINTER_MASK == POINTER_MASK {
            let low = *buf
                .get(offset + 1)
                .ok_or(NameError::PointerTruncated { offset })?;
            let target = (usize::from(len & !POINTER_MASK) << 8) | usize::from(low);
            if target >= limit {
                return Err(NameError::ForwardPointer { target, limit });
            }

            wire_len.get_or_insert(name.raw_len() + 2);
            limit = target;
            offset = target;
            continue;
        }

        let label_start = offset + 1;
        let label = buf
            .get(label_start..label_start + usize::from(len))
            .ok_or(NameError::LabelOverrun { offset })?;
        name.push_label(label)?;
        offset = label_start + label.len();
    }

    let wire_len = match wire_len {
        Some(len) => len,
        None if name.is_empty() => return Err(NameError::Empty),
        None => name.raw_len() + 1,
    };

    name.finish()?;
    Ok(wire_len)
}
