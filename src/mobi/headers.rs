use crate::error::{Error, Result};

/// PDB (Palm Database) header info.
#[derive(Debug)]
pub struct PdbInfo {
    pub name: String,
    /// Record offsets within the file.
    pub record_offsets: Vec<u32>,
}

impl PdbInfo {
    /// Parse the PDB header and record list from the start of the file.
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 78 {
            return Err(Error::invalid("PDB header too short"));
        }

        // Bytes 0-31: Database name (null-terminated)
        let name_end = data[..32].iter().position(|&b| b == 0).unwrap_or(32);
        let name = String::from_utf8_lossy(&data[..name_end]).to_string();

        // Bytes 60-67: Type/Creator should be "BOOKMOBI" or "TEXtREAd"
        let ident = &data[60..68];
        if ident != b"BOOKMOBI" && !ident.eq_ignore_ascii_case(b"TEXTREAD") {
            return Err(Error::invalid(format!(
                "Unknown book type: {:?}",
                String::from_utf8_lossy(ident)
            )));
        }

        // Bytes 76-77: Number of records
        let num_records = u16::from_be_bytes([data[76], data[77]]) as usize;

        // Record info list (8 bytes per record, starting at byte 78)
        let records_start = 78;
        if data.len() < records_start + num_records * 8 {
            return Err(Error::invalid("PDB header truncated"));
        }

        let record_offsets = (0..num_records)
            .map(|i| {
                let pos = records_start + i * 8;
                u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
            })
            .collect();

        Ok(Self {
            name,
            record_offsets,
        })
    }

    /// Borrow record `index` out of the whole file.
    pub fn record<'a>(&self, data: &'a [u8], index: usize) -> Result<&'a [u8]> {
        let start = *self
            .record_offsets
            .get(index)
            .ok_or_else(|| Error::invalid(format!("Record index {index} out of bounds")))?
            as usize;
        let end = self
            .record_offsets
            .get(index + 1)
            .map_or(data.len(), |&end| end as usize);

        if start > end || end > data.len() {
            return Err(Error::invalid(format!("Record {index} has a bad offset")));
        }
        Ok(&data[start..end])
    }
}

/// MOBI Header (Record 0)
#[derive(Debug, Clone)]
pub struct MobiHeader {
    pub compression: Compression,
    pub text_record_count: u16,
    pub encryption: u16,
    pub encoding: Encoding,
    pub mobi_version: u32,
    pub title: String,
    pub exth_flags: u32,
    pub extra_data_flags: u16,
    pub header_length: u32,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Compression {
    None,
    PalmDoc,
    Huffman,
    Unknown(u16),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Encoding {
    Cp1252,
    Utf8,
    Unknown(u32),
}

impl Encoding {
    pub fn decode(self, bytes: &[u8]) -> String {
        match self {
            Encoding::Utf8 => String::from_utf8_lossy(bytes).into_owned(),
            _ => {
                let (text, _, _) = encoding_rs::WINDOWS_1252.decode(bytes);
                text.into_owned()
            }
        }
    }
}

impl MobiHeader {
    pub fn parse(data: &[u8]) -> Result<Self> {
        if data.len() < 16 {
            return Err(Error::invalid("MOBI header too short"));
        }

        let compression = match u16::from_be_bytes([data[0], data[1]]) {
            1 => Compression::None,
            2 => Compression::PalmDoc,
            0x4448 => Compression::Huffman, // "DH"
            n => Compression::Unknown(n),
        };

        let text_record_count = u16::from_be_bytes([data[8], data[9]]);
        let encryption = u16::from_be_bytes([data[12], data[13]]);

        // Plain PalmDOC files stop after the 16-byte header
        if data.len() < 32 || &data[16..20] != b"MOBI" {
            return Ok(Self {
                compression,
                text_record_count,
                encryption,
                encoding: Encoding::Cp1252,
                mobi_version: 1,
                title: String::new(),
                exth_flags: 0,
                extra_data_flags: 0,
                header_length: 0,
            });
        }

        let header_length = read_u32(data, 20);
        let codepage = read_u32(data, 28);

        let encoding = match codepage {
            1252 => Encoding::Cp1252,
            65001 => Encoding::Utf8,
            n => Encoding::Unknown(n),
        };

        // Full name offset and length at 0x54-0x5C
        let title = if data.len() >= 0x5C {
            let title_offset = read_u32(data, 0x54) as usize;
            let title_length = read_u32(data, 0x58) as usize;
            match data.get(title_offset..title_offset.saturating_add(title_length)) {
                Some(bytes) => encoding.decode(bytes).trim().to_string(),
                None => String::new(),
            }
        } else {
            String::new()
        };

        let mobi_version = if data.len() >= 0x6C {
            read_u32(data, 0x68)
        } else {
            1
        };

        let exth_flags = if data.len() >= 0x84 {
            read_u32(data, 0x80)
        } else {
            0
        };

        let extra_data_flags = if data.len() >= 0xF4 && header_length >= 0xE4 {
            u16::from_be_bytes([data[0xF2], data[0xF3]])
        } else {
            0
        };

        Ok(Self {
            compression,
            text_record_count,
            encryption,
            encoding,
            mobi_version,
            title,
            exth_flags,
            extra_data_flags,
            header_length,
        })
    }

    pub fn has_exth(&self) -> bool {
        self.exth_flags & 0x40 != 0
    }

    /// Parse the EXTH block that follows this header in record 0, if any.
    pub fn exth(&self, record0: &[u8]) -> Option<ExthHeader> {
        if !self.has_exth() || self.header_length == 0 {
            return None;
        }
        let exth_start = 16 + self.header_length as usize;
        let block = record0.get(exth_start..)?;
        match ExthHeader::parse(block, self.encoding) {
            Ok(exth) => Some(exth),
            Err(e) => {
                log::warn!("mobi: ignoring EXTH block: {e}");
                None
            }
        }
    }
}

/// EXTH Header (extended metadata)
#[derive(Debug, Default)]
pub struct ExthHeader {
    pub title: Option<String>,
    pub authors: Vec<String>,
    pub publisher: Option<String>,
    pub description: Option<String>,
    pub isbn: Option<String>,
    pub subjects: Vec<String>,
    pub pub_date: Option<String>,
    pub language: Option<String>,
}

impl ExthHeader {
    pub fn parse(data: &[u8], encoding: Encoding) -> Result<Self> {
        if data.len() < 12 {
            return Err(Error::invalid("EXTH header too short"));
        }

        if &data[0..4] != b"EXTH" {
            return Err(Error::invalid("Invalid EXTH signature"));
        }

        let record_count = read_u32(data, 8);

        let mut exth = ExthHeader::default();
        let mut pos = 12;

        let decode = |bytes: &[u8]| -> Option<String> {
            let text = encoding.decode(bytes).trim().to_string();
            (!text.is_empty()).then_some(text)
        };

        for _ in 0..record_count {
            if pos + 8 > data.len() {
                break;
            }

            let record_type = read_u32(data, pos);
            let record_len = read_u32(data, pos + 4) as usize;

            if record_len < 8 || pos + record_len > data.len() {
                break;
            }

            let content = &data[pos + 8..pos + record_len];

            match record_type {
                100 => exth.authors.extend(decode(content)),
                101 => exth.publisher = decode(content),
                103 => exth.description = decode(content),
                104 => exth.isbn = decode(content),
                105 => {
                    if let Some(subjects) = decode(content) {
                        exth.subjects.extend(
                            subjects
                                .split(';')
                                .map(str::trim)
                                .filter(|s| !s.is_empty())
                                .map(String::from),
                        );
                    }
                }
                106 => exth.pub_date = decode(content),
                503 => exth.title = decode(content),
                524 => exth.language = decode(content),
                _ => {}
            }

            pos += record_len;
        }

        Ok(exth)
    }
}

fn read_u32(data: &[u8], pos: usize) -> u32 {
    u32::from_be_bytes([data[pos], data[pos + 1], data[pos + 2], data[pos + 3]])
}

/// Strip trailing multibyte extra data from text records.
///
/// MOBI text records can have trailing data appended. The extra_flags field
/// indicates which types are present. It must be removed before
/// decompression.
pub fn strip_trailing_data(record: &[u8], flags: u16) -> &[u8] {
    if flags == 0 || record.is_empty() {
        return record;
    }

    let mut end = record.len();

    // Bits 1-15: variable-width sized entries, read backward from the end
    let mut shifted_flags = flags >> 1;
    while shifted_flags != 0 {
        if shifted_flags & 1 != 0 {
            if end == 0 {
                break;
            }
            // High bit SET marks the last byte of the size
            let mut size = 0usize;
            let mut shift = 0;
            let mut pos = end;
            while pos > 0 {
                pos -= 1;
                let byte = record[pos];
                size |= ((byte & 0x7F) as usize) << shift;
                shift += 7;
                if byte & 0x80 != 0 || shift >= 28 {
                    break;
                }
            }
            if size > 0 && size <= end {
                end -= size;
            }
        }
        shifted_flags >>= 1;
    }

    // Multibyte overlap (bit 0) is processed last
    if flags & 1 != 0 && end > 0 {
        let overlap = (record[end - 1] & 3) as usize + 1;
        if overlap <= end {
            end -= overlap;
        }
    }

    &record[..end]
}
