//! The `record` module defines the [`Record`] and [`RecordType`] which are used for decoding
//! a single line of an Intel HEX file.
//!
//! Fields are taken from fixed character offsets of the line. The number of data bytes is
//! derived from the length of the line itself, never from the declared byte count, and the
//! checksum is decoded but not enforced.

use crate::error::HexMemoryErrorKind;

mod ranges {
    use std::ops::Range;
    pub const RECORD_LEN_RANGE: Range<usize> = 1..3;
    pub const RECORD_ADDR_RANGE: Range<usize> = 3..7;
    pub const RECORD_TYPE_RANGE: Range<usize> = 7..9;
}
mod sizes {
    pub const BYTE_CHAR_LEN: usize = 2;
    pub const START_CODE_LEN: usize = 1;
    // start code + len + addr + rtype + checksum
    pub const SMALLEST_RECORD: usize = START_CODE_LEN + (1 + 2 + 1 + 1) * BYTE_CHAR_LEN;
}

/// Largest number of data bytes a single record may carry by default.
pub const DEFAULT_MAX_RECORD_BYTES: usize = 32;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum RecordType {
    Data = 0x0,
    EndOfFile = 0x1,
    ExtendedSegmentAddress = 0x2,
    StartSegmentAddress = 0x3,
    ExtendedLinearAddress = 0x4,
    StartLinearAddress = 0x5,
}

impl RecordType {
    const fn parse(code: u8) -> Result<Self, HexMemoryErrorKind> {
        match code {
            0x00 => Ok(Self::Data),
            0x01 => Ok(Self::EndOfFile),
            0x02 => Ok(Self::ExtendedSegmentAddress),
            0x03 => Ok(Self::StartSegmentAddress),
            0x04 => Ok(Self::ExtendedLinearAddress),
            0x05 => Ok(Self::StartLinearAddress),
            _ => Err(HexMemoryErrorKind::InvalidRecordType(code)),
        }
    }

    /// Short name used in tabular output.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Data => "DATA",
            Self::EndOfFile => "EOF",
            Self::ExtendedSegmentAddress => "EXT_SEG",
            Self::StartSegmentAddress => "START_SEG",
            Self::ExtendedLinearAddress => "EXT_LIN",
            Self::StartLinearAddress => "START_LIN",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Record {
    /// Declared payload length (not cross-checked against `data`)
    pub byte_count: u8,
    /// Address field of the record header
    pub address: u16,
    /// Record type
    pub rtype: RecordType,
    /// Decoded payload
    pub data: Vec<u8>,
    /// Checksum as found in the line
    pub checksum: u8,
}

impl Record {
    /// Number of data bytes actually present in the record.
    #[must_use]
    pub const fn data_len(&self) -> usize {
        self.data.len()
    }

    /// Calculate checksum (two's complement of the byte sum) from u8 array.
    #[must_use]
    pub fn calculate_checksum(data: &[u8]) -> u8 {
        let sum = data.iter().fold(0u8, |acc, b| acc.wrapping_add(*b));
        (!sum).wrapping_add(1)
    }

    /// Checksum the record would carry given its header fields and payload.
    #[must_use]
    pub fn expected_checksum(&self) -> u8 {
        let [addr_high, addr_low] = self.address.to_be_bytes();
        let header = [self.byte_count, addr_high, addr_low, self.rtype as u8];
        let sum = header
            .iter()
            .chain(&self.data)
            .fold(0u8, |acc, b| acc.wrapping_add(*b));
        (!sum).wrapping_add(1)
    }

    /// Whether the decoded checksum matches the record contents. Informational only.
    #[must_use]
    pub fn has_valid_checksum(&self) -> bool {
        self.expected_checksum() == self.checksum
    }

    /// Decode one line of an Intel HEX file into a `Record`.
    ///
    /// A trailing line terminator (`\n`, `\r\n`) is ignored. The record holds
    /// `(L - 11) / 2` data bytes, `L` being the line length without terminator.
    ///
    /// # Errors
    /// - The line does not begin with ':'
    /// - The line is shorter than the fixed header and checksum fields
    /// - The line carries more than `max_data_len` data bytes
    /// - A field contains non-hexadecimal characters
    /// - The record type is not one of 0..=5
    ///
    /// # Example
    /// ```
    /// use hexmemlib::{Record, RecordType};
    ///
    /// let record = Record::parse(":0400000001020304F2\n", 32).unwrap();
    /// assert_eq!(record.rtype, RecordType::Data);
    /// assert_eq!(record.data, vec![1, 2, 3, 4]);
    /// ```
    pub fn parse(line: &str, max_data_len: usize) -> Result<Self, HexMemoryErrorKind> {
        let line = line.trim_end_matches(['\n', '\r']).as_bytes();

        // Check for start code
        if line.first() != Some(&b':') {
            return Err(HexMemoryErrorKind::MissingStartCode);
        }

        // Fixed fields must be present
        if line.len() < sizes::SMALLEST_RECORD {
            return Err(HexMemoryErrorKind::RecordTooShort);
        }

        let data_len = (line.len() - sizes::SMALLEST_RECORD) / sizes::BYTE_CHAR_LEN;
        if data_len > max_data_len {
            return Err(HexMemoryErrorKind::RecordTooLong {
                max: max_data_len,
                found: data_len,
            });
        }

        let byte_count = parse_hex(&line[ranges::RECORD_LEN_RANGE])? as u8;
        let address = parse_hex(&line[ranges::RECORD_ADDR_RANGE])? as u16;
        let rtype = RecordType::parse(parse_hex(&line[ranges::RECORD_TYPE_RANGE])? as u8)?;

        let data_start = ranges::RECORD_TYPE_RANGE.end;
        let data_end = data_start + data_len * sizes::BYTE_CHAR_LEN;
        let data = line[data_start..data_end]
            .chunks_exact(sizes::BYTE_CHAR_LEN)
            .map(|digits| parse_hex(digits).map(|b| b as u8))
            .collect::<Result<Vec<u8>, _>>()?;

        let checksum = parse_hex(&line[line.len() - sizes::BYTE_CHAR_LEN..])? as u8;

        Ok(Self {
            byte_count,
            address,
            rtype,
            data,
            checksum,
        })
    }
}

/// Interpret a fixed-width run of ASCII characters as a base-16 number.
fn parse_hex(digits: &[u8]) -> Result<u32, HexMemoryErrorKind> {
    digits.iter().try_fold(0u32, |acc, &c| {
        char::from(c)
            .to_digit(16)
            .map(|d| (acc << 4) | d)
            .ok_or(HexMemoryErrorKind::ContainsInvalidCharacters)
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Returns valid instances of Record
    ///
    fn get_valid_struct_records() -> [Record; 5] {
        [
            Record {
                byte_count: 0x10,
                address: 0x0100,
                rtype: RecordType::Data,
                data: vec![
                    0x21, 0x46, 0x01, 0x36, 0x01, 0x21, 0x47, 0x01, 0x36, 0x00, 0x7E, 0xFE, 0x09,
                    0xD2, 0x19, 0x01,
                ],
                checksum: 0x40,
            },
            Record {
                byte_count: 0x00,
                address: 0x0000,
                rtype: RecordType::EndOfFile,
                data: vec![],
                checksum: 0xFF,
            },
            Record {
                byte_count: 0x02,
                address: 0x0000,
                rtype: RecordType::ExtendedSegmentAddress,
                data: vec![0x12, 0x00],
                checksum: 0xEA,
            },
            Record {
                byte_count: 0x02,
                address: 0x0000,
                rtype: RecordType::ExtendedLinearAddress,
                data: vec![0x00, 0x03],
                checksum: 0xF7,
            },
            Record {
                byte_count: 0x04,
                address: 0x0000,
                rtype: RecordType::StartLinearAddress,
                data: vec![0x00, 0x00, 0x01, 0xCD],
                checksum: 0x29,
            },
        ]
    }

    /// Returns valid record strings
    ///
    fn get_valid_str_records() -> [&'static str; 5] {
        [
            ":10010000214601360121470136007EFE09D2190140\n",
            ":00000001FF",
            ":020000021200EA\r\n",
            ":020000040003F7",
            ":04000005000001CD29\n",
        ]
    }

    /// Returns invalid record strings and corresponding errors
    ///
    fn get_invalid_str_records() -> [(&'static str, HexMemoryErrorKind); 7] {
        [
            // Removed ':' from record str
            ("00000001FF", HexMemoryErrorKind::MissingStartCode),
            // Empty line
            ("", HexMemoryErrorKind::MissingStartCode),
            // EOF record with fewer chars
            (":0000FF", HexMemoryErrorKind::RecordTooShort),
            // Only a start code and a terminator
            (":\n", HexMemoryErrorKind::RecordTooShort),
            // Char 'Z' is not a hex digit
            (":0000000ZFF", HexMemoryErrorKind::ContainsInvalidCharacters),
            // Non-hex char inside the payload
            (":0200000012G0EA", HexMemoryErrorKind::ContainsInvalidCharacters),
            // Record type 6 does not exist
            (":00000006FA", HexMemoryErrorKind::InvalidRecordType(0x06)),
        ]
    }

    #[test]
    fn test_parse_valid_record_types() {
        assert_eq!(RecordType::parse(0x00), Ok(RecordType::Data));
        assert_eq!(RecordType::parse(0x01), Ok(RecordType::EndOfFile));
        assert_eq!(
            RecordType::parse(0x02),
            Ok(RecordType::ExtendedSegmentAddress)
        );
        assert_eq!(RecordType::parse(0x03), Ok(RecordType::StartSegmentAddress));
        assert_eq!(
            RecordType::parse(0x04),
            Ok(RecordType::ExtendedLinearAddress)
        );
        assert_eq!(RecordType::parse(0x05), Ok(RecordType::StartLinearAddress));
    }

    #[test]
    fn test_parse_invalid_record_type() {
        for code in [0x06, 0x10, 0xAB, 0xFF] {
            assert_eq!(
                RecordType::parse(code),
                Err(HexMemoryErrorKind::InvalidRecordType(code))
            );
        }
    }

    #[test]
    fn test_calculate_checksum() {
        // Each tuple = (record line, expected checksum)
        let cases = [
            (":10010000214601360121470136007EFE09D2190140", 0x40),
            (":00000001FF", 0xFF),
            (":020000021200EA", 0xEA),
            (":020000040003F7", 0xF7),
        ];

        for (record, expected_checksum) in cases {
            // Strip information not used for checksum calculation
            let trimmed_record = &record[1..record.len() - 2];

            // Convert to byte Vec
            let bytes: Vec<u8> = (0..trimmed_record.len())
                .step_by(2)
                .map(|i| u8::from_str_radix(&trimmed_record[i..i + 2], 16).unwrap())
                .collect();

            assert_eq!(expected_checksum, Record::calculate_checksum(&bytes));
        }
    }

    #[test]
    fn test_expected_checksum() {
        let records = get_valid_struct_records();
        for record in records {
            assert_eq!(record.checksum, record.expected_checksum());
            assert!(record.has_valid_checksum());
        }
    }

    #[test]
    fn test_parse_valid_records() {
        let records = get_valid_str_records();
        let expected_records = get_valid_struct_records();
        for (rec_str, rec) in records.iter().zip(expected_records.iter()) {
            assert_eq!(Record::parse(rec_str, DEFAULT_MAX_RECORD_BYTES).unwrap(), *rec);
        }
    }

    #[test]
    fn test_parse_invalid_records() {
        let records_and_errors = get_invalid_str_records();
        for (record, expected_error) in records_and_errors {
            assert_eq!(
                Record::parse(record, DEFAULT_MAX_RECORD_BYTES).unwrap_err(),
                expected_error
            );
        }
    }

    #[test]
    fn test_parse_fields_are_positional() {
        // Arrange: declared byte count (0x10) disagrees with the payload (2 bytes)
        let line = ":10ABCD00AABB00";

        // Act
        let record = Record::parse(line, DEFAULT_MAX_RECORD_BYTES).unwrap();

        // Assert
        assert_eq!(record.byte_count, 0x10);
        assert_eq!(record.address, 0xABCD);
        assert_eq!(record.rtype, RecordType::Data);
        assert_eq!(record.data, vec![0xAA, 0xBB]);
        assert_eq!(record.checksum, 0x00);
    }

    #[test]
    fn test_parse_data_len_follows_line_length() {
        for data_len in 0..=DEFAULT_MAX_RECORD_BYTES {
            // Arrange
            let payload = "5A".repeat(data_len);
            let line = format!(":00000000{payload}00\n");

            // Act
            let record = Record::parse(&line, DEFAULT_MAX_RECORD_BYTES).unwrap();

            // Assert
            assert_eq!(record.data_len(), (line.trim_end().len() - 11) / 2);
            assert_eq!(record.data_len(), data_len);
        }
    }

    #[test]
    fn test_parse_checksum_not_enforced() {
        // Checksum should be 0xF0
        let line = ":1000000000000000000000000000000000000000AA";

        let record = Record::parse(line, DEFAULT_MAX_RECORD_BYTES).unwrap();

        assert_eq!(record.checksum, 0xAA);
        assert_eq!(record.expected_checksum(), 0xF0);
        assert!(!record.has_valid_checksum());
    }

    #[test]
    fn test_parse_record_too_long() {
        // Arrange
        let line = format!(":21000000{}00", "00".repeat(33));

        // Act
        let res = Record::parse(&line, DEFAULT_MAX_RECORD_BYTES);

        // Assert
        assert_eq!(
            res,
            Err(HexMemoryErrorKind::RecordTooLong {
                max: DEFAULT_MAX_RECORD_BYTES,
                found: 33
            })
        );
        assert!(Record::parse(&line, 33).is_ok());
    }
}
