use super::ThreadId;
use crate::error;
use crate::lang::Error;
use parking_lot::Mutex;
use std::collections::BTreeMap;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};

type Result<T> = std::result::Result<T, Error>;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FileMode {
    Input = 1,
    Output = 2,
    Append = 3,
}

impl FileMode {
    pub fn code(self) -> i64 {
        self as i64
    }

    pub fn from_code(code: i64) -> Option<FileMode> {
        match code {
            1 => Some(FileMode::Input),
            2 => Some(FileMode::Output),
            3 => Some(FileMode::Append),
            _ => None,
        }
    }
}

enum Device {
    Reader(BufReader<File>),
    Writer(BufWriter<File>),
}

struct OpenFile {
    owner: ThreadId,
    device: Device,
}

/// ## Open file table
///
/// Process wide, keyed by the integer handle from `OPEN … AS #n`. Each
/// file remembers the thread that opened it so a thread's files can be
/// closed when it ends.

#[derive(Default)]
pub struct FileTable {
    files: Mutex<BTreeMap<i64, OpenFile>>,
}

impl std::fmt::Debug for FileTable {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "FileTable {:?}", self.handles())
    }
}

fn io_error(e: std::io::Error) -> Error {
    error!(FileError; e.to_string())
}

impl FileTable {
    pub fn new() -> FileTable {
        FileTable::default()
    }

    pub fn open(&self, handle: i64, path: &str, mode: FileMode, owner: &str) -> Result<()> {
        let mut files = self.files.lock();
        if files.contains_key(&handle) {
            return Err(error!(FileAlreadyOpen; format!("#{}", handle)));
        }
        let device = match mode {
            FileMode::Input => Device::Reader(BufReader::new(File::open(path).map_err(io_error)?)),
            FileMode::Output => Device::Writer(BufWriter::new(
                File::create(path).map_err(io_error)?,
            )),
            FileMode::Append => Device::Writer(BufWriter::new(
                OpenOptions::new()
                    .append(true)
                    .create(true)
                    .open(path)
                    .map_err(io_error)?,
            )),
        };
        files.insert(
            handle,
            OpenFile {
                owner: owner.to_string(),
                device,
            },
        );
        Ok(())
    }

    pub fn close(&self, handle: i64) -> Result<()> {
        match self.files.lock().remove(&handle) {
            Some(file) => FileTable::flush(file),
            None => Err(error!(BadFileNumber; format!("#{}", handle))),
        }
    }

    pub fn write(&self, handle: i64, text: &str) -> Result<()> {
        let mut files = self.files.lock();
        match files.get_mut(&handle).map(|f| &mut f.device) {
            Some(Device::Writer(w)) => w.write_all(text.as_bytes()).map_err(io_error),
            Some(Device::Reader(_)) => Err(error!(FileError; "FILE NOT OPEN FOR OUTPUT")),
            None => Err(error!(BadFileNumber; format!("#{}", handle))),
        }
    }

    /// Reads one line without its terminator; `EndOfFile` past the end.
    pub fn read_line(&self, handle: i64) -> Result<String> {
        let mut files = self.files.lock();
        match files.get_mut(&handle).map(|f| &mut f.device) {
            Some(Device::Reader(r)) => {
                let mut s = String::new();
                if r.read_line(&mut s).map_err(io_error)? == 0 {
                    return Err(error!(EndOfFile; format!("#{}", handle)));
                }
                while s.ends_with('\n') || s.ends_with('\r') {
                    s.pop();
                }
                Ok(s)
            }
            Some(Device::Writer(_)) => Err(error!(FileError; "FILE NOT OPEN FOR INPUT")),
            None => Err(error!(BadFileNumber; format!("#{}", handle))),
        }
    }

    pub fn handles(&self) -> Vec<i64> {
        self.files.lock().keys().copied().collect()
    }

    /// Close every file the thread opened.
    pub fn close_owned(&self, owner: &str) {
        let mut files = self.files.lock();
        let owned: Vec<i64> = files
            .iter()
            .filter(|(_, f)| f.owner == owner)
            .map(|(h, _)| *h)
            .collect();
        for handle in owned {
            if let Some(file) = files.remove(&handle) {
                let _ = FileTable::flush(file);
            }
        }
    }

    pub fn close_all(&self) {
        let mut files = self.files.lock();
        for (_, file) in std::mem::take(&mut *files) {
            let _ = FileTable::flush(file);
        }
    }

    fn flush(file: OpenFile) -> Result<()> {
        match file.device {
            Device::Writer(mut w) => w.flush().map_err(io_error),
            Device::Reader(_) => Ok(()),
        }
    }
}
