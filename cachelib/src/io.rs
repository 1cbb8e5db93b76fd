use std::fs::File;
use std::io::{Read, Seek};
use crate::error::SimulationError;

/// Wraps a trace file for sequential reading
///
/// The file must not be empty, some platforms refuse to map a zero length file
pub fn get_reader(file: File) -> Result<impl Read + Seek, SimulationError> {
    // Compatibility on other systems
    #[cfg(not(unix))]
    {
        use std::io::BufReader;
        const BUFFER_SIZE: usize = 64 * 1024;
        Ok(BufReader::with_capacity(BUFFER_SIZE, file))
    }
    // Memory map the file on unix systems, traces are only ever read front to back
    #[cfg(unix)]
    {
        use std::io::Cursor;
        use memmap2::{Advice, Mmap};
        // The map is only read, the trace file must not be truncated while it is being parsed
        unsafe {
            let m = Mmap::map(&file)?;
            m.advise(Advice::Sequential)?;
            Ok(Cursor::new(m))
        }
    }
}
