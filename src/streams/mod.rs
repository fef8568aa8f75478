//! Concrete stream implementations

pub mod buffered;
pub mod null;
pub mod record;
pub mod system;
pub mod text;

pub use buffered::{Buffer, BufferedStream, EomCallback};
pub use null::NullStream;
pub use record::{read_record, RecordStream};
pub use system::{SystemFlags, SystemStream};
pub use text::TextStream;
