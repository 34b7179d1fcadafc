//! PalmDOC LZ77 codec.
//!
//! Each control byte selects one of four encodings:
//!
//! | byte        | meaning                                             |
//! |-------------|-----------------------------------------------------|
//! | `0x01-0x08` | copy the next `n` bytes verbatim                    |
//! | `0x00`, `0x09-0x7F` | the byte itself                             |
//! | `0x80-0xBF` | with the next byte: 11-bit distance, 3-bit length-3 |
//! | `0xC0-0xFF` | a space followed by `byte ^ 0x80`                   |

/// Decompress one PalmDOC record. Truncated input yields whatever was
/// decoded before the cut; back-references outside the output are ignored.
pub fn decompress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len() * 2);
    let mut bytes = input.iter().copied();

    while let Some(byte) = bytes.next() {
        match byte {
            0x01..=0x08 => out.extend(bytes.by_ref().take(byte as usize)),
            0x00..=0x7F => out.push(byte),
            0xC0..=0xFF => out.extend_from_slice(&[b' ', byte ^ 0x80]),
            0x80..=0xBF => {
                let Some(low) = bytes.next() else { break };
                let pair = u16::from_be_bytes([byte, low]) & 0x3FFF;
                let distance = (pair >> 3) as usize;
                let length = (pair & 0x07) as usize + 3;

                if distance == 0 || distance > out.len() {
                    continue;
                }
                // Overlapping copies repeat the bytes just written.
                let from = out.len() - distance;
                for k in 0..length {
                    out.push(out[from + k]);
                }
            }
        }
    }

    out
}

/// Greedy PalmDOC encoder for building test records.
#[cfg(test)]
pub(crate) fn compress(input: &[u8]) -> Vec<u8> {
    let mut out = Vec::with_capacity(input.len());
    let mut pos = 0;

    while pos < input.len() {
        if let Some((distance, length)) = longest_match(input, pos) {
            let pair = ((distance << 3) | (length - 3)) as u16;
            out.extend_from_slice(&(0x8000 | pair).to_be_bytes());
            pos += length;
            continue;
        }

        let byte = input[pos];
        match input.get(pos + 1) {
            Some(&next) if byte == b' ' && (0x40..=0x7F).contains(&next) => {
                out.push(next ^ 0x80);
                pos += 2;
            }
            _ if byte == 0 || (0x09..=0x7F).contains(&byte) => {
                out.push(byte);
                pos += 1;
            }
            _ => {
                let run = input[pos..]
                    .iter()
                    .take(8)
                    .take_while(|&&b| (0x01..=0x08).contains(&b) || b >= 0x80)
                    .count()
                    .max(1);
                out.push(run as u8);
                out.extend_from_slice(&input[pos..pos + run]);
                pos += run;
            }
        }
    }

    out
}

#[cfg(test)]
fn longest_match(input: &[u8], pos: usize) -> Option<(usize, usize)> {
    const MAX_MATCH: usize = 10;
    const MAX_DISTANCE: usize = 0x7FF;

    let window = pos.saturating_sub(MAX_DISTANCE)..pos;
    let limit = MAX_MATCH.min(input.len() - pos);
    if limit < 3 {
        return None;
    }

    window
        .map(|start| {
            let length = (0..limit)
                .take_while(|&k| input[start + k] == input[pos + k])
                .count();
            (pos - start, length)
        })
        .filter(|&(_, length)| length >= 3)
        .max_by_key(|&(distance, length)| (length, std::cmp::Reverse(distance)))
}
