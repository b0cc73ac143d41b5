use std::fs::File;
use std::io::{BufReader, Read, Seek, SeekFrom};
use std::path::Path;
use byteorder::{ByteOrder, LittleEndian, ReadBytesExt};
use log::debug;
use super::error::{Error, Result};
use super::geometry::Point3D;

pub const GROUND: u8 = 2;

const SIGNATURE: &[u8; 4] = b"LASF";
const COMPRESSED_BIT: u8 = 0x80;
const MAX_POINT_FORMAT: u8 = 10;

#[derive(Clone,Debug,PartialEq)]
pub struct LasFileHeader {
    pub version_major: u8,
    pub version_minor: u8,
    pub offset_to_point_data: u32,
    pub point_data_format_id: u8,
    pub point_data_record_length: u16,
    pub number_of_point_records: u64,

    pub scale_factor: [f64;3],
    pub offset: [f64;3],

    pub max: Point3D, // m
    pub min: Point3D, // m
}

impl LasFileHeader {
    pub fn read_from<R: Read>(reader: &mut R) -> Result<LasFileHeader> {
        let mut signature = [0u8; 4];
        reader.read_exact(&mut signature)?;
        if &signature != SIGNATURE {
            return Err(Error::Las(format!("bad file signature {:?}", signature)));
        }

        // File source id, global encoding, project GUID.
        skip(reader, 2 + 2 + 16)?;
        let version_major = reader.read_u8()?;
        let version_minor = reader.read_u8()?;
        // System identifier, generating software, creation day and year.
        skip(reader, 32 + 32 + 2 + 2)?;
        let _header_size = reader.read_u16::<LittleEndian>()?;
        let offset_to_point_data = reader.read_u32::<LittleEndian>()?;
        let _number_of_variable_length_records = reader.read_u32::<LittleEndian>()?;
        let format = reader.read_u8()?;
        let point_data_record_length = reader.read_u16::<LittleEndian>()?;
        let legacy_number_of_point_records = reader.read_u32::<LittleEndian>()?;
        skip(reader, 5 * 4)?;

        let mut scale_factor = [0f64;3];
        let mut offset = [0f64;3];
        let mut extremes = [0f64;6];
        reader.read_f64_into::<LittleEndian>(&mut scale_factor)?;
        reader.read_f64_into::<LittleEndian>(&mut offset)?;
        reader.read_f64_into::<LittleEndian>(&mut extremes)?;

        let mut number_of_point_records = legacy_number_of_point_records as u64;
        if version_major == 1 && version_minor >= 4 {
            // Waveform data start, extended VLR start and count.
            skip(reader, 8 + 8 + 4)?;
            let extended = reader.read_u64::<LittleEndian>()?;
            if extended != 0 {
                number_of_point_records = extended;
            }
        }

        if format & COMPRESSED_BIT != 0 {
            return Err(Error::CompressedLas);
        }
        if format > MAX_POINT_FORMAT {
            return Err(Error::Las(format!("unknown point data format {}", format)));
        }
        let header = LasFileHeader {
            version_major,
            version_minor,
            offset_to_point_data,
            point_data_format_id: format,
            point_data_record_length,
            number_of_point_records,
            scale_factor,
            offset,
            max: Point3D { x: extremes[0], y: extremes[2], z: extremes[4] },
            min: Point3D { x: extremes[1], y: extremes[3], z: extremes[5] },
        };
        if (header.point_data_record_length as usize) <= header.classification_offset() {
            return Err(Error::Las(format!("point record length {} too short for format {}",
                header.point_data_record_length, format)));
        }
        Ok(header)
    }

    fn classification_offset(&self) -> usize {
        if self.point_data_format_id < 6 { 15 } else { 16 }
    }

    pub fn to_point_3d(&self, record: &PointDataRecord) -> Point3D {
        Point3D {
            x: (record.x as f64) * self.scale_factor[0] + self.offset[0],
            y: (record.y as f64) * self.scale_factor[1] + self.offset[1],
            z: (record.z as f64) * self.scale_factor[2] + self.offset[2],
        }
    }
}

#[derive(Copy,Clone,Debug,PartialEq)]
pub struct PointDataRecord {
    pub x: i32,
    pub y: i32,
    pub z: i32,
    pub classification: u8,
}

impl PointDataRecord {
    fn parse(buffer: &[u8], header: &LasFileHeader) -> PointDataRecord {
        let classification = buffer[header.classification_offset()];
        PointDataRecord {
            x: LittleEndian::read_i32(&buffer[0..4]),
            y: LittleEndian::read_i32(&buffer[4..8]),
            z: LittleEndian::read_i32(&buffer[8..12]),
            // Formats 0-5 keep synthetic/key-point/withheld flags in the top bits.
            classification: if header.point_data_format_id < 6 { classification & 0x1f } else { classification },
        }
    }

    pub fn read_all<R: Read + Seek>(reader: &mut R, header: &LasFileHeader) -> Result<Vec<PointDataRecord>> {
        let end = reader.seek(SeekFrom::End(0))?;
        let start = u64::from(header.offset_to_point_data);
        let available = end.saturating_sub(start) / u64::from(header.point_data_record_length);
        if header.number_of_point_records > available {
            return Err(Error::Las(format!("header announces {} point records, file holds {}",
                header.number_of_point_records, available)));
        }

        reader.seek(SeekFrom::Start(start))?;
        let mut buffer = vec![0u8; header.point_data_record_length as usize];
        let mut records = Vec::with_capacity(header.number_of_point_records as usize);
        for _ in 0..header.number_of_point_records {
            reader.read_exact(&mut buffer)?;
            records.push(PointDataRecord::parse(&buffer, header));
        }
        Ok(records)
    }

    pub fn load_from(path: &Path) -> Result<(LasFileHeader, Vec<PointDataRecord>)> {
        let mut file = BufReader::new(File::open(path)?);
        let header = LasFileHeader::read_from(&mut file)?;
        let records = PointDataRecord::read_all(&mut file, &header)?;
        Ok((header, records))
    }
}

/// Points of a LAS file, optionally restricted to one classification.
pub fn read_points(path: &Path, classification: Option<u8>) -> Result<(LasFileHeader, Vec<Point3D>)> {
    let (header, records) = PointDataRecord::load_from(path)?;
    let points = convert(&header, &records, classification);
    Ok((header, points))
}

pub fn read_points_from<R: Read + Seek>(reader: &mut R, classification: Option<u8>) -> Result<(LasFileHeader, Vec<Point3D>)> {
    let header = LasFileHeader::read_from(reader)?;
    let records = PointDataRecord::read_all(reader, &header)?;
    let points = convert(&header, &records, classification);
    Ok((header, points))
}

fn convert(header: &LasFileHeader, records: &[PointDataRecord], classification: Option<u8>) -> Vec<Point3D> {
    let points: Vec<Point3D> = records.iter()
        .filter(|record| classification.map_or(true, |c| record.classification == c))
        .map(|record| header.to_point_3d(record))
        .collect();
    debug!("LAS {}.{} format {}: kept {} of {} points",
        header.version_major, header.version_minor, header.point_data_format_id, points.len(), records.len());
    points
}

fn skip<R: Read>(reader: &mut R, count: u64) -> Result<()> {
    let skipped = std::io::copy(&mut reader.take(count), &mut std::io::sink())?;
    if skipped != count {
        return Err(Error::Las("truncated header".to_string()));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use byteorder::WriteBytesExt;
    use std::io::{Cursor, Write};

    const HEADER_SIZE: u16 = 227;
    const HEADER_SIZE_1_4: u16 = 375;

    // (x, y, z, classification) in raw integer units.
    fn las_bytes(format: u8, records: &[(i32, i32, i32, u8)]) -> Vec<u8> {
        las_file(2, format, records.len() as u32, 0, records)
    }

    // Version 1.`minor`; the extended count is only written for 1.4.
    fn las_file(minor: u8, format: u8, legacy_count: u32, extended_count: u64,
                records: &[(i32, i32, i32, u8)]) -> Vec<u8> {
        let header_size = if minor >= 4 { HEADER_SIZE_1_4 } else { HEADER_SIZE };
        let record_length: u16 = if (format & 0x7f) < 6 { 20 } else { 30 };
        let mut out = Vec::new();
        out.write_all(SIGNATURE).unwrap();
        out.write_all(&[0u8; 2 + 2 + 16]).unwrap();
        out.write_u8(1).unwrap();
        out.write_u8(minor).unwrap();
        out.write_all(&[0u8; 32 + 32 + 2 + 2]).unwrap();
        out.write_u16::<LittleEndian>(header_size).unwrap();
        out.write_u32::<LittleEndian>(header_size as u32).unwrap();
        out.write_u32::<LittleEndian>(0).unwrap();
        out.write_u8(format).unwrap();
        out.write_u16::<LittleEndian>(record_length).unwrap();
        out.write_u32::<LittleEndian>(legacy_count).unwrap();
        out.write_all(&[0u8; 20]).unwrap();
        for v in [0.01, 0.01, 0.001, 100.0, 200.0, 0.0].iter() {
            out.write_f64::<LittleEndian>(*v).unwrap();
        }
        for v in [101.0, 100.0, 202.0, 200.0, 5.0, 0.0].iter() {
            out.write_f64::<LittleEndian>(*v).unwrap();
        }
        if minor >= 4 {
            out.write_u64::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(0).unwrap();
            out.write_u32::<LittleEndian>(0).unwrap();
            out.write_u64::<LittleEndian>(extended_count).unwrap();
            out.write_all(&[0u8; 15 * 8]).unwrap();
        }
        assert_eq!(out.len(), header_size as usize);

        for &(x, y, z, classification) in records {
            let mut record = vec![0u8; record_length as usize];
            LittleEndian::write_i32(&mut record[0..4], x);
            LittleEndian::write_i32(&mut record[4..8], y);
            LittleEndian::write_i32(&mut record[8..12], z);
            if (format & 0x7f) < 6 {
                // Withheld flag set, must be masked away.
                record[15] = classification | 0x80;
            } else {
                record[16] = classification;
            }
            out.write_all(&record).unwrap();
        }
        out
    }

    #[test]
    fn reads_header() {
        let bytes = las_bytes(1, &[(0, 0, 0, 2)]);
        let header = LasFileHeader::read_from(&mut Cursor::new(bytes)).unwrap();
        assert_eq!((header.version_major, header.version_minor), (1, 2));
        assert_eq!(header.point_data_format_id, 1);
        assert_eq!(header.number_of_point_records, 1);
        assert_eq!(header.offset_to_point_data, 227);
        assert_eq!(header.min, Point3D::new(100.0, 200.0, 0.0));
        assert_eq!(header.max, Point3D::new(101.0, 202.0, 5.0));
    }

    #[test]
    fn scales_and_filters_points() {
        let bytes = las_bytes(0, &[(10, 20, 3000, 2), (50, 60, 4000, 5), (100, 0, 0, 2)]);
        let (_, points) = read_points_from(&mut Cursor::new(bytes.clone()), Some(GROUND)).unwrap();
        assert_eq!(points.len(), 2);
        assert!((points[0].x - 100.1).abs() < 1e-9);
        assert!((points[0].y - 200.2).abs() < 1e-9);
        assert!((points[0].z - 3.0).abs() < 1e-9);
        assert!((points[1].x - 101.0).abs() < 1e-9);

        let (_, all) = read_points_from(&mut Cursor::new(bytes), None).unwrap();
        assert_eq!(all.len(), 3);
    }

    #[test]
    fn extended_formats_use_their_own_classification_byte() {
        let bytes = las_bytes(6, &[(0, 0, 0, 2), (0, 0, 0, 9)]);
        let mut cursor = Cursor::new(bytes);
        let header = LasFileHeader::read_from(&mut cursor).unwrap();
        let records = PointDataRecord::read_all(&mut cursor, &header).unwrap();
        assert_eq!(records.iter().map(|r| r.classification).collect::<Vec<u8>>(), vec![2, 9]);
    }

    #[test]
    fn compressed_files_are_rejected() {
        let bytes = las_bytes(0x80 | 3, &[]);
        match LasFileHeader::read_from(&mut Cursor::new(bytes)) {
            Err(Error::CompressedLas) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn bad_signature_is_rejected() {
        let mut bytes = las_bytes(0, &[]);
        bytes[0] = b'X';
        match LasFileHeader::read_from(&mut Cursor::new(bytes)) {
            Err(Error::Las(_)) => {},
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn truncated_point_data_is_an_error() {
        let mut bytes = las_bytes(0, &[(1, 2, 3, 2), (4, 5, 6, 2)]);
        bytes.truncate(bytes.len() - 5);
        assert!(read_points_from(&mut Cursor::new(bytes), None).is_err());
    }

    #[test]
    fn version_1_4_uses_extended_point_count() {
        let bytes = las_file(4, 6, 0, 2, &[(10, 20, 3000, 2), (0, 0, 0, 7)]);
        let (header, points) = read_points_from(&mut Cursor::new(bytes), None).unwrap();
        assert_eq!((header.version_major, header.version_minor), (1, 4));
        assert_eq!(header.offset_to_point_data, HEADER_SIZE_1_4 as u32);
        assert_eq!(header.number_of_point_records, 2);
        assert_eq!(points.len(), 2);
        assert!((points[0].z - 3.0).abs() < 1e-9);
    }

    #[test]
    fn version_1_4_falls_back_to_legacy_point_count() {
        let bytes = las_file(4, 6, 2, 0, &[(0, 0, 0, 2), (0, 0, 0, 9)]);
        let (header, points) = read_points_from(&mut Cursor::new(bytes), Some(GROUND)).unwrap();
        assert_eq!(header.number_of_point_records, 2);
        assert_eq!(points.len(), 1);
    }

    #[test]
    fn point_count_beyond_file_size_is_an_error() {
        let mut bytes = las_file(4, 0, 0, u64::MAX / 2, &[(1, 2, 3, 2)]);
        bytes.extend_from_slice(&[0u8; 5]);
        match read_points_from(&mut Cursor::new(bytes), None) {
            Err(Error::Las(message)) => assert!(message.contains("file holds 1")),
            other => panic!("unexpected {:?}", other),
        }
    }
}
