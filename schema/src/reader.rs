/// A little-endian cursor over a packed record buffer.
///
/// Example usage:
///
/// ```
/// let mut reader = wit_dbi_schema::LayoutReader::new(&[0x2a, 0x00, 0x01, 0x00, 0x00, 0x00]);
/// assert_eq!(reader.read_u16(), Ok(42));
/// assert_eq!(reader.read_u32(), Ok(1));
/// ```
pub struct LayoutReader<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> LayoutReader<'a> {
    /// Create a new LayoutReader over the provided byte slice. The reader
    /// must not outlive the slice it wraps.
    pub fn new(data: &[u8]) -> LayoutReader {
        LayoutReader { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the underlying byte slice.
    pub fn index(&self) -> usize {
        self.index
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], ()> {
        if self.index + len > self.data.len() {
            Err(())
        } else {
            let value = &self.data[self.index..self.index + len];
            self.index += len;
            Ok(value)
        }
    }

    /// Try to read a single byte starting at the current index.
    pub fn read_u8(&mut self) -> Result<u8, ()> {
        let b = self.read_bytes(1)?;
        Ok(b[0])
    }

    /// Try to read a little-endian 16-bit cell starting at the current index.
    pub fn read_u16(&mut self) -> Result<u16, ()> {
        let b = self.read_bytes(2)?;
        Ok(u16::from_le_bytes([b[0], b[1]]))
    }

    /// Try to read a little-endian 32-bit cell starting at the current index.
    pub fn read_u32(&mut self) -> Result<u32, ()> {
        let b = self.read_bytes(4)?;
        Ok(u32::from_le_bytes([b[0], b[1], b[2], b[3]]))
    }

    /// Try to read a little-endian 64-bit cell starting at the current index.
    pub fn read_u64(&mut self) -> Result<u64, ()> {
        let b = self.read_bytes(8)?;
        Ok(u64::from_le_bytes([
            b[0], b[1], b[2], b[3], b[4], b[5], b[6], b[7],
        ]))
    }

    /// Try to read a little-endian 32-bit float cell starting at the current
    /// index.
    pub fn read_f32(&mut self) -> Result<f32, ()> {
        let bits = self.read_u32()?;
        Ok(f32::from_bits(bits))
    }

    /// Try to read a little-endian 64-bit float cell starting at the current
    /// index.
    pub fn read_f64(&mut self) -> Result<f64, ()> {
        let bits = self.read_u64()?;
        Ok(f64::from_bits(bits))
    }
}
