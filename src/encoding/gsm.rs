// ABOUTME: GSM 03.38 default alphabet and extension table lookups
// ABOUTME: Septet packing and unpacking for the 7-bit packed representation

/// Escape septet introducing a character from the extension table
pub const ESCAPE: u8 = 0x1B;

/// The default alphabet indexed by septet value. Position 0x1B is the
/// escape code and never matches a character.
const BASIC: [char; 128] = [
    '@', '£', '$', '¥', 'è', 'é', 'ù', 'ì', 'ò', 'Ç', '\n', 'Ø', 'ø', '\r', 'Å', 'å', //
    'Δ', '_', 'Φ', 'Γ', 'Λ', 'Ω', 'Π', 'Ψ', 'Σ', 'Θ', 'Ξ', '\u{1b}', 'Æ', 'æ', 'ß', 'É', //
    ' ', '!', '"', '#', '¤', '%', '&', '\'', '(', ')', '*', '+', ',', '-', '.', '/', //
    '0', '1', '2', '3', '4', '5', '6', '7', '8', '9', ':', ';', '<', '=', '>', '?', //
    '¡', 'A', 'B', 'C', 'D', 'E', 'F', 'G', 'H', 'I', 'J', 'K', 'L', 'M', 'N', 'O', //
    'P', 'Q', 'R', 'S', 'T', 'U', 'V', 'W', 'X', 'Y', 'Z', 'Ä', 'Ö', 'Ñ', 'Ü', '§', //
    '¿', 'a', 'b', 'c', 'd', 'e', 'f', 'g', 'h', 'i', 'j', 'k', 'l', 'm', 'n', 'o', //
    'p', 'q', 'r', 's', 't', 'u', 'v', 'w', 'x', 'y', 'z', 'ä', 'ö', 'ñ', 'ü', 'à', //
];

const EXTENSION: [(u8, char); 10] = [
    (0x0A, '\u{0c}'),
    (0x14, '^'),
    (0x28, '{'),
    (0x29, '}'),
    (0x2F, '\\'),
    (0x3C, '['),
    (0x3D, '~'),
    (0x3E, ']'),
    (0x40, '|'),
    (0x65, '€'),
];

/// Where a character lives in the GSM alphabet
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GsmChar {
    Basic(u8),
    Extended(u8),
}

impl GsmChar {
    /// Septets consumed on the wire
    pub fn septets(self) -> usize {
        match self {
            GsmChar::Basic(_) => 1,
            GsmChar::Extended(_) => 2,
        }
    }
}

pub fn lookup(c: char) -> Option<GsmChar> {
    if c == '\u{1b}' {
        return None;
    }
    if let Some(position) = BASIC.iter().position(|&b| b == c) {
        return Some(GsmChar::Basic(position as u8));
    }
    EXTENSION
        .iter()
        .find(|(_, e)| *e == c)
        .map(|(code, _)| GsmChar::Extended(*code))
}

/// Converts text to one septet per octet, reporting the first character
/// without a GSM representation as `Err((index, char))`
pub fn to_septets(text: &str) -> Result<Vec<u8>, (usize, char)> {
    let mut septets = Vec::with_capacity(text.len());
    for (index, c) in text.chars().enumerate() {
        match lookup(c) {
            Some(GsmChar::Basic(code)) => septets.push(code),
            Some(GsmChar::Extended(code)) => {
                septets.push(ESCAPE);
                septets.push(code);
            }
            None => return Err((index, c)),
        }
    }
    Ok(septets)
}

/// Decodes unpacked septets back to text. Returns `None` on a dangling
/// escape or an unknown extension code.
pub fn from_septets(septets: &[u8]) -> Option<String> {
    let mut text = String::with_capacity(septets.len());
    let mut iter = septets.iter();
    while let Some(&septet) = iter.next() {
        if septet == ESCAPE {
            let code = *iter.next()?;
            let (_, c) = EXTENSION.iter().find(|(e, _)| *e == code)?;
            text.push(*c);
        } else {
            text.push(*BASIC.get(septet as usize)?);
        }
    }
    Some(text)
}

/// Packs septets LSB first. No fill bits are inserted.
pub fn pack(septets: &[u8]) -> Vec<u8> {
    let mut packed = Vec::with_capacity(packed_len(septets.len()));
    let mut acc: u32 = 0;
    let mut bits = 0;

    for &septet in septets {
        acc |= u32::from(septet & 0x7F) << bits;
        bits += 7;
        while bits >= 8 {
            packed.push(acc as u8);
            acc >>= 8;
            bits -= 8;
        }
    }
    if bits > 0 {
        packed.push(acc as u8);
    }
    packed
}

/// Unpacks `count` septets. The septet count must be supplied because a
/// trailing partial octet is ambiguous.
pub fn unpack(packed: &[u8], count: usize) -> Option<Vec<u8>> {
    if packed_len(count) > packed.len() {
        return None;
    }
    let mut septets = Vec::with_capacity(count);
    for i in 0..count {
        let bit = i * 7;
        let byte = bit / 8;
        let shift = bit % 8;
        let mut value = u16::from(packed[byte]) >> shift;
        if shift > 1 {
            value |= u16::from(packed[byte + 1]) << (8 - shift);
        }
        septets.push((value & 0x7F) as u8);
    }
    Some(septets)
}

pub fn packed_len(septets: usize) -> usize {
    (septets * 7).div_ceil(8)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hellohello_packs_to_known_octets() {
        let septets = to_septets("hellohello").unwrap();
        assert_eq!(
            pack(&septets),
            vec![0xE8, 0x32, 0x9B, 0xFD, 0x46, 0x97, 0xD9, 0xEC, 0x37]
        );
    }

    #[test]
    fn test_unpack_reverses_pack() {
        let septets = to_septets("The quick brown fox €").unwrap();
        let packed = pack(&septets);
        assert_eq!(unpack(&packed, septets.len()).unwrap(), septets);
        assert_eq!(from_septets(&septets).unwrap(), "The quick brown fox €");
    }

    #[test]
    fn test_unpack_rejects_short_input() {
        assert!(unpack(&[0xE8, 0x32], 4).is_none());
    }

    #[test]
    fn test_extension_characters_are_escaped() {
        assert_eq!(to_septets("€").unwrap(), vec![ESCAPE, 0x65]);
        assert_eq!(lookup('{'), Some(GsmChar::Extended(0x28)));
        assert_eq!(lookup('@'), Some(GsmChar::Basic(0x00)));
    }

    #[test]
    fn test_escape_code_and_unknown_characters_are_unmapped() {
        assert_eq!(lookup('\u{1b}'), None);
        assert_eq!(lookup('ç'), None);
        assert_eq!(to_septets("abç"), Err((2, 'ç')));
    }

    #[test]
    fn test_dangling_escape_does_not_decode() {
        assert!(from_septets(&[0x41, ESCAPE]).is_none());
    }
}
