//! VPK directory file header.

use pakrat_common::BinaryReader;
use zerocopy::{FromBytes, Immutable, IntoBytes, KnownLayout};

use crate::{Error, Result};

/// Section sizes that only version 2 directory files carry.
#[derive(Debug, Clone, Copy, FromBytes, IntoBytes, Immutable, KnownLayout)]
#[repr(C, packed)]
struct SectionSizesV2 {
    file_data_section_size: u32,
    archive_md5_section_size: u32,
    other_md5_section_size: u32,
    signature_section_size: u32,
}

/// Decoded VPK header.
///
/// Fields the version does not carry are left at zero.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct VpkHeader {
    /// Format version.
    pub version: u32,
    /// Size of the directory tree in bytes (version 1 and later).
    pub tree_size: u32,
    /// Bytes of file content stored in the directory file itself (version 2).
    pub file_data_section_size: u32,
    /// Size of the archive MD5 section (version 2).
    pub archive_md5_section_size: u32,
    /// Size of the MD5 section covering this file (version 2).
    pub other_md5_section_size: u32,
    /// Size of the public key and signature section (version 2).
    pub signature_section_size: u32,
}

impl VpkHeader {
    /// Directory file signature.
    pub const SIGNATURE: u32 = 0x55AA_1234;

    /// Decode the header from a reader positioned at the start of the file.
    ///
    /// The reader is left on the first byte of the directory tree.
    pub fn read(reader: &mut BinaryReader<'_>) -> Result<Self> {
        let signature = reader.read_u32().map_err(Error::TruncatedHeader)?;
        if signature != Self::SIGNATURE {
            return Err(Error::InvalidSignature {
                expected: Self::SIGNATURE,
                actual: signature,
            });
        }

        let mut header = Self {
            version: reader.read_u32().map_err(Error::TruncatedHeader)?,
            ..Self::default()
        };

        if header.version >= 1 {
            header.tree_size = reader.read_u32().map_err(Error::TruncatedHeader)?;
        }

        if header.version >= 2 {
            let sections: SectionSizesV2 = reader.read_struct().map_err(Error::TruncatedHeader)?;
            header.file_data_section_size = sections.file_data_section_size;
            header.archive_md5_section_size = sections.archive_md5_section_size;
            header.other_md5_section_size = sections.other_md5_section_size;
            header.signature_section_size = sections.signature_section_size;
        }

        Ok(header)
    }

    /// Number of bytes the header occupies for this version.
    pub fn size(&self) -> usize {
        match self.version {
            0 => 8,
            1 => 12,
            _ => 12 + std::mem::size_of::<SectionSizesV2>(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn header_bytes(version: u32, extra: &[u32]) -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&VpkHeader::SIGNATURE.to_le_bytes());
        data.extend_from_slice(&version.to_le_bytes());
        for value in extra {
            data.extend_from_slice(&value.to_le_bytes());
        }
        data
    }

    #[test]
    fn test_version_0_reads_no_optional_fields() {
        // Trailing bytes belong to the tree and must not be consumed.
        let data = header_bytes(0, &[0xDEAD_BEEF]);
        let mut reader = BinaryReader::new(&data);

        let header = VpkHeader::read(&mut reader).unwrap();
        assert_eq!(header.version, 0);
        assert_eq!(header.tree_size, 0);
        assert_eq!(header.file_data_section_size, 0);
        assert_eq!(header.signature_section_size, 0);
        assert_eq!(reader.position(), 8);
        assert_eq!(header.size(), 8);
    }

    #[test]
    fn test_version_1() {
        let data = header_bytes(1, &[0x40, 7]);
        let mut reader = BinaryReader::new(&data);

        let header = VpkHeader::read(&mut reader).unwrap();
        assert_eq!(header.tree_size, 0x40);
        assert_eq!(header.archive_md5_section_size, 0);
        assert_eq!(reader.position(), 12);
    }

    #[test]
    fn test_version_2() {
        let data = header_bytes(2, &[100, 1, 2, 48, 296]);
        let mut reader = BinaryReader::new(&data);

        let header = VpkHeader::read(&mut reader).unwrap();
        assert_eq!(
            header,
            VpkHeader {
                version: 2,
                tree_size: 100,
                file_data_section_size: 1,
                archive_md5_section_size: 2,
                other_md5_section_size: 48,
                signature_section_size: 296,
            }
        );
        assert_eq!(reader.position(), header.size());
    }

    #[test]
    fn test_invalid_signature() {
        let data = [0u8; 12];
        let mut reader = BinaryReader::new(&data);

        let err = VpkHeader::read(&mut reader).unwrap_err();
        assert!(matches!(
            err,
            Error::InvalidSignature {
                expected: 0x55AA_1234,
                actual: 0
            }
        ));
    }

    #[test]
    fn test_truncated_header() {
        // Version 2 announced but only two of the four section sizes present.
        let data = header_bytes(2, &[100, 1, 2]);
        let mut reader = BinaryReader::new(&data);

        assert!(matches!(
            VpkHeader::read(&mut reader),
            Err(Error::TruncatedHeader(_))
        ));

        let mut reader = BinaryReader::new(&[0x34, 0x12]);
        assert!(matches!(
            VpkHeader::read(&mut reader),
            Err(Error::TruncatedHeader(_))
        ));
    }
}
