use crate::reader::Reader;
use crate::trivia::is_white_space_character;

pub(crate) fn decode(data: &[u8]) -> Option<Vec<u8>> {
    let mut end = 0;
    let mut needs_cleaning = false;

    let mut reader = Reader::new(data);

    // We are lenient and don't require a > in the stream.
    while let Some(byte) = reader.read_byte() {
        match byte {
            b'>' => break,
            b if b.is_ascii_hexdigit() => {}
            b if is_white_space_character(b) => {
                needs_cleaning = true;
            }
            _ => {
                return None;
            }
        }

        end += 1;
    }

    let trimmed = data.get(..end)?;

    if needs_cleaning {
        let cleaned = trimmed
            .iter()
            .copied()
            .filter(u8::is_ascii_hexdigit)
            .collect::<Vec<_>>();

        decode_hex_string(&cleaned).ok()
    } else {
        decode_hex_string(trimmed).ok()
    }
}

/// Decode pairs of hex digits. A trailing odd digit is padded with a zero.
pub(crate) fn decode_hex_string(str: &[u8]) -> Result<Vec<u8>, ()> {
    str.chunks(2)
        .map(|pair| {
            let high = val(pair[0])?;
            let low = val(pair.get(1).copied().unwrap_or(b'0'))?;

            Ok(high << 4 | low)
        })
        .collect()
}

fn val(c: u8) -> Result<u8, ()> {
    match c {
        b'A'..=b'F' => Ok(c - b'A' + 10),
        b'a'..=b'f' => Ok(c - b'a' + 10),
        b'0'..=b'9' => Ok(c - b'0'),
        _ => Err(()),
    }
}

#[cfg(test)]
mod tests {
    use crate::filter::ascii_hex::decode;

    #[test]
    fn decode_simple() {
        let input = b"AF3E2901>";
        assert_eq!(decode(input).unwrap(), vec![0xaf, 0x3e, 0x29, 0x01]);
    }

    #[test]
    fn decode_whitespaces() {
        let input = b"AF3   E2 \n  901>";
        assert_eq!(decode(input).unwrap(), vec![0xaf, 0x3e, 0x29, 0x01]);
    }

    #[test]
    fn decode_without_gt() {
        let input = b"AF3E2901";
        assert_eq!(decode(input).unwrap(), vec![0xaf, 0x3e, 0x29, 0x01]);
    }

    #[test]
    fn decode_with_padding() {
        let input = b"AF3E291>";
        assert_eq!(decode(input).unwrap(), vec![0xaf, 0x3e, 0x29, 0x10]);
    }

    #[test]
    fn decode_invalid() {
        assert!(decode(b"AFXX>").is_none());
    }
}
