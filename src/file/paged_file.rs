use parking_lot::Mutex;
use std::fs::{File, OpenOptions};
use std::io::{ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::{Path, PathBuf};

use super::PageNo;
use super::error::{FileError, FileResult};

/// A file addressed as a flat sequence of fixed-size pages
///
/// Every read or write moves exactly one page. The handle is shared between
/// threads; the seek and the transfer happen under one lock so concurrent
/// callers at different offsets cannot interleave.
pub struct PagedFile {
    file: Mutex<File>,
    path: PathBuf,
    page_size: usize,
}

impl PagedFile {
    /// Open a paged file, creating it empty if it does not exist
    ///
    /// Fails with `Corrupted` when the existing length is not a whole number of pages.
    pub fn open<P: AsRef<Path>>(path: P, page_size: usize) -> FileResult<Self> {
        let path = path.as_ref();
        if page_size == 0 {
            return Err(FileError::InvalidConfig(
                "page_size must be positive".to_string(),
            ));
        }

        // Create parent directories if they don't exist
        if let Some(parent) = path.parent()
            && !parent.as_os_str().is_empty()
        {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(path)?;

        let len = file.metadata()?.len();
        if len % page_size as u64 != 0 {
            return Err(FileError::Corrupted {
                path: path.display().to_string(),
                len,
                page_size,
            });
        }

        Ok(Self {
            file: Mutex::new(file),
            path: path.to_path_buf(),
            page_size,
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// Current length of the file in bytes
    pub fn len(&self) -> FileResult<u64> {
        Ok(self.file.lock().metadata()?.len())
    }

    pub fn is_empty(&self) -> FileResult<bool> {
        Ok(self.len()? == 0)
    }

    /// Number of whole pages in the file
    pub fn page_count(&self) -> FileResult<usize> {
        Ok((self.len()? / self.page_size as u64) as usize)
    }

    /// Read one page into `buffer`, which must be exactly one page long
    ///
    /// A page past the end of the file or a truncated page is an error; nothing is zero-filled.
    pub fn read_page(&self, page_no: PageNo, buffer: &mut [u8]) -> FileResult<()> {
        self.check_buffer(buffer.len())?;

        let mut file = self.file.lock();
        let len = file.metadata()?.len();
        let offset = page_no as u64 * self.page_size as u64;
        if offset >= len {
            return Err(FileError::PageOutOfRange {
                page_no,
                page_count: (len / self.page_size as u64) as usize,
            });
        }

        file.seek(SeekFrom::Start(offset))?;
        let mut filled = 0;
        while filled < buffer.len() {
            match file.read(&mut buffer[filled..]) {
                Ok(0) => break,
                Ok(n) => filled += n,
                Err(e) if e.kind() == ErrorKind::Interrupted => continue,
                Err(e) => return Err(e.into()),
            }
        }

        if filled < self.page_size {
            return Err(FileError::ShortRead {
                page_no,
                expected: self.page_size,
                actual: filled,
            });
        }

        Ok(())
    }

    /// Write one page; writing past the end extends the file
    pub fn write_page(&self, page_no: PageNo, buffer: &[u8]) -> FileResult<()> {
        self.check_buffer(buffer.len())?;

        let mut file = self.file.lock();
        file.seek(SeekFrom::Start(page_no as u64 * self.page_size as u64))?;
        file.write_all(buffer)?;

        Ok(())
    }

    /// Flush OS buffers for this file
    pub fn sync(&self) -> FileResult<()> {
        self.file.lock().sync_data()?;
        Ok(())
    }

    fn check_buffer(&self, len: usize) -> FileResult<()> {
        if len != self.page_size {
            return Err(FileError::InvalidPageSize {
                expected: self.page_size,
                actual: len,
            });
        }
        Ok(())
    }
}
