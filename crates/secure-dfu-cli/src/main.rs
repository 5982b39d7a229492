//! Offline tool for Secure DFU control point frames.
//!
//! Encodes requests to hex, decodes captured notifications and requests,
//! and prints the result code tables.

use clap::{Parser, Subcommand, ValueEnum};
use secure_dfu_protocol::{
    ExtendedErrorCode, ImageType, PacketReceiptNotification, ProtocolError, Request, Response,
    ResultCode, WritePayload, CONTROL_POINT_UUID, DFU_SERVICE_UUID, PACKET_UUID,
};
use thiserror::Error;
use tracing::{debug, error};
use tracing_subscriber::EnvFilter;

#[derive(Parser)]
#[command(name = "secure-dfu")]
#[command(about = "Encode and decode Secure DFU control point frames")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Print the hex encoding of a request
    Encode {
        #[command(subcommand)]
        request: EncodeRequest,
    },
    /// Decode a frame given in hex
    Decode {
        /// Frame bytes, e.g. "60 03 01 00 20 00 00 78 56 34 12"
        frame: String,
        /// Decode the frame as a request written to the control point
        #[arg(short, long)]
        request: bool,
    },
    /// Print the GATT UUIDs, result codes and extended error codes
    Codes,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
enum EncodeRequest {
    /// Get protocol version
    ProtocolVersion,
    /// Create a command object
    CreateCommand {
        /// Object size in bytes
        size: u32,
    },
    /// Create a data object
    CreateData {
        /// Object size in bytes
        size: u32,
    },
    /// Select the command object
    SelectCommand,
    /// Select the data object
    SelectData,
    /// Set the Packet Receipt Notification interval
    SetPrn {
        /// Packets between notifications (0 disables)
        value: u16,
    },
    /// Calculate checksum
    Checksum,
    /// Execute the current object
    Execute,
    /// Get MTU
    Mtu,
    /// Write bytes through the control point
    Write {
        /// Payload in hex
        bytes: String,
    },
    /// Ping
    Ping {
        id: u8,
    },
    /// Get hardware version
    HwVersion,
    /// Get firmware version of an image
    FwVersion {
        #[arg(value_enum)]
        image: ImageArg,
    },
    /// Abort
    Abort,
}

#[derive(ValueEnum, Debug, Clone, Copy, PartialEq, Eq)]
enum ImageArg {
    Softdevice,
    Application,
    Bootloader,
}

impl From<ImageArg> for ImageType {
    fn from(image: ImageArg) -> Self {
        match image {
            ImageArg::Softdevice => ImageType::SoftDevice,
            ImageArg::Application => ImageType::Application,
            ImageArg::Bootloader => ImageType::Bootloader,
        }
    }
}

#[derive(Error, Debug)]
enum CliError {
    #[error("invalid hex: {0}")]
    Hex(#[from] hex::FromHexError),

    #[error("invalid request: {0}")]
    Request(#[from] ProtocolError),

    #[error("cannot decode 0x{frame}: {source}")]
    Decode {
        frame: String,
        source: ProtocolError,
    },
}

impl EncodeRequest {
    fn to_request(&self) -> Result<Request, CliError> {
        let request = match self {
            EncodeRequest::ProtocolVersion => Request::GetProtocolVersion,
            EncodeRequest::CreateCommand { size } => Request::CreateCommandObject { size: *size },
            EncodeRequest::CreateData { size } => Request::CreateDataObject { size: *size },
            EncodeRequest::SelectCommand => Request::SelectCommandObject,
            EncodeRequest::SelectData => Request::SelectDataObject,
            EncodeRequest::SetPrn { value } => {
                Request::SetPacketReceiptNotification { value: *value }
            }
            EncodeRequest::Checksum => Request::CalculateChecksum,
            EncodeRequest::Execute => Request::Execute,
            EncodeRequest::Mtu => Request::GetMtu,
            EncodeRequest::Write { bytes } => Request::Write {
                bytes: WritePayload::new(parse_hex(bytes)?)?,
            },
            EncodeRequest::Ping { id } => Request::Ping { id: *id },
            EncodeRequest::HwVersion => Request::GetHwVersion,
            EncodeRequest::FwVersion { image } => Request::GetFwVersion {
                image: (*image).into(),
            },
            EncodeRequest::Abort => Request::Abort,
        };
        Ok(request)
    }
}

/// Parse hex with optional `0x` prefix and space, `:` or `-` separators.
fn parse_hex(input: &str) -> Result<Vec<u8>, CliError> {
    let trimmed = input.trim();
    let trimmed = trimmed
        .strip_prefix("0x")
        .or_else(|| trimmed.strip_prefix("0X"))
        .unwrap_or(trimmed);
    let digits: String = trimmed
        .chars()
        .filter(|c| !c.is_whitespace() && *c != ':' && *c != '-')
        .collect();
    Ok(hex::decode(digits)?)
}

/// Describe a notification. PRN-shaped frames are also checksum responses.
fn describe_notification(frame: &[u8]) -> Result<String, CliError> {
    if let Ok(prn) = PacketReceiptNotification::decode(frame) {
        return Ok(format!(
            "Packet Receipt Notification or Checksum (Offset = {}, CRC = {:08X})",
            prn.offset, prn.crc
        ));
    }
    Response::decode(frame)
        .map(|response| response.to_string())
        .map_err(|source| CliError::Decode {
            frame: hex::encode_upper(frame),
            source,
        })
}

fn describe_request(frame: &[u8]) -> Result<String, CliError> {
    Request::decode(frame)
        .map(|request| request.to_string())
        .map_err(|source| CliError::Decode {
            frame: hex::encode_upper(frame),
            source,
        })
}

fn codes_table() -> String {
    let mut out = String::new();
    out.push_str("GATT UUIDs:\n");
    out.push_str(&format!("  Secure DFU service   {}\n", DFU_SERVICE_UUID));
    out.push_str(&format!("  DFU Control Point    {}\n", CONTROL_POINT_UUID));
    out.push_str(&format!("  DFU Packet           {}\n", PACKET_UUID));
    out.push_str("\nResult codes:\n");
    for code in ResultCode::ALL {
        out.push_str(&format!("  0x{:02X}  {}\n", code.code(), code.description()));
    }
    out.push_str("\nExtended error codes:\n");
    for code in ExtendedErrorCode::ALL {
        out.push_str(&format!("  0x{:02X}  {}\n", code.code(), code.description()));
    }
    out
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Encode { request } => {
            let request = request.to_request()?;
            debug!("Encoding {:?}", request);
            println!("{}", hex::encode_upper(request.encode()));
        }
        Commands::Decode { frame, request } => {
            let bytes = parse_hex(&frame)?;
            let described = if request {
                describe_request(&bytes)
            } else {
                describe_notification(&bytes)
            };
            match described {
                Ok(text) => println!("{}", text),
                Err(e) => {
                    error!("{}", e);
                    return Err(e.into());
                }
            }
        }
        Commands::Codes => print!("{}", codes_table()),
    }

    Ok(())
}
