//! Memory read/write

use flashbridge_core::args;
use flashbridge_core::{CommandResult, Error, OptionMap, Result, Scalar, SessionHandle};

/// Memory is accessed in bytes
const BYTE_BITS: u32 = 8;

/// Which half of `memory` to run
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MemoryAccess {
    /// Read `count` bytes
    Read { count: usize },
    /// Write the given bytes
    Write { data: Vec<u64> },
}

/// Parameters of the `memory` command
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MemoryArgs {
    pub page: u32,
    pub address: u64,
    pub access: MemoryAccess,
}

impl MemoryArgs {
    /// `-read` wins when both `-read` and `-write` are given
    pub fn from_options(options: &OptionMap) -> Result<Self> {
        let page = args::number_or(options, "page", 0)?;
        let page = u32::try_from(page)
            .map_err(|_| Error::Argument(format!("page {} out of range", page)))?;
        let address = args::parse_number(&args::required(options, "address")?)?;

        let access = if options.contains_key("read") {
            let count = args::parse_number(&args::required(options, "numBytes")?)?;
            let count = usize::try_from(count)
                .map_err(|_| Error::Argument(format!("byte count {} out of range", count)))?;
            MemoryAccess::Read { count }
        } else if options.contains_key("write") {
            MemoryAccess::Write {
                data: parse_bytes(options.get("data").map(Vec::as_slice).unwrap_or_default())?,
            }
        } else {
            return Err(Error::Argument("memory needs -read or -write".into()));
        };

        Ok(Self {
            page,
            address,
            access,
        })
    }
}

fn parse_bytes(values: &[String]) -> Result<Vec<u64>> {
    if values.is_empty() {
        return Err(Error::Argument("missing -data".into()));
    }
    values
        .iter()
        .map(|v| {
            let byte = args::parse_number(v)?;
            if byte > 0xFF {
                return Err(Error::Argument(format!("data value {} is not a byte", v)));
            }
            Ok(byte)
        })
        .collect()
}

/// Run the memory command
///
/// A read returns the bytes as a sequence; a write returns `true`.
pub fn run(handle: &mut SessionHandle, options: &OptionMap) -> Result<CommandResult> {
    let args = MemoryArgs::from_options(options)?;
    let session = handle.connect_if_needed()?;

    match args.access {
        MemoryAccess::Read { count } => {
            log::debug!(
                "Reading {} bytes at {}:0x{:08X}",
                count,
                args.page,
                args.address
            );
            let bytes = session
                .read_data(args.page, args.address, BYTE_BITS, count)
                .map_err(Error::device)?;
            Ok(CommandResult::Sequence(
                bytes.into_iter().map(Scalar::UInt).collect(),
            ))
        }
        MemoryAccess::Write { data } => {
            log::debug!(
                "Writing {} bytes at {}:0x{:08X}",
                data.len(),
                args.page,
                args.address
            );
            session
                .write_data(args.page, args.address, &data, BYTE_BITS)
                .map_err(Error::device)?;
            Ok(CommandResult::success())
        }
    }
}
