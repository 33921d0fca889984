pub mod codec_error;
pub mod document;
pub mod program_codec;

pub use codec_error::{CodecError, EncodeError, MalformedProgram};
pub use document::{InstructionRecord, ProgramDocument, RunDocument};
pub use program_codec::{decode, encode, from_bytes, from_json, to_bytes, to_json};
